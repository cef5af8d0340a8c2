// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! An in-process room that connects several [SessionMembershipManager]s the
//! way a hosted transport would. Messages travel encoded, each sender's
//! messages arrive in order, and buffered messages are replayed to anyone who
//! connects later.

use super::{DeliveryMode, Message};
use crate::{
    error::{JamError, Result},
    session::SessionMembershipManager,
    uid::{ParticipantId, ParticipantIdFactory},
};
use std::collections::{HashMap, VecDeque};

/// Something the room hands to one member.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Delivery {
    #[allow(missing_docs)]
    Frame(Vec<u8>),
    #[allow(missing_docs)]
    Connected(ParticipantId, String),
    #[allow(missing_docs)]
    Left(ParticipantId),
}

/// What a new member learns on connecting.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Arrival {
    /// The transport-assigned identity.
    pub id: ParticipantId,
    /// How many members were already in the room.
    pub remote_count: usize,
}

/// See the module docs.
#[derive(Debug)]
pub struct LoopbackRoom {
    capacity: usize,
    ids: ParticipantIdFactory,
    members: Vec<ParticipantId>,
    inboxes: HashMap<ParticipantId, VecDeque<Delivery>>,
    buffered: Vec<(ParticipantId, Vec<u8>)>,
}
impl LoopbackRoom {
    #[allow(missing_docs)]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ids: ParticipantIdFactory::default(),
            members: Vec::default(),
            inboxes: HashMap::default(),
            buffered: Vec::default(),
        }
    }

    /// Admits a new member and queues the buffered history for it.
    pub fn connect(&mut self, display_name: &str) -> Result<Arrival> {
        if self.members.len() >= self.capacity {
            return Err(JamError::SessionFull);
        }
        let id = self.ids.mint_next();
        let remote_count = self.members.len();
        for member in self.members.clone() {
            self.deliver(member, Delivery::Connected(id, display_name.to_string()));
        }
        let history = self
            .buffered
            .iter()
            .map(|(_, frame)| Delivery::Frame(frame.clone()))
            .collect();
        self.inboxes.insert(id, history);
        self.members.push(id);
        Ok(Arrival { id, remote_count })
    }

    /// Removes a member, forgets its buffered messages, and tells everyone
    /// else. Disconnecting twice is harmless.
    pub fn disconnect(&mut self, id: ParticipantId) {
        if !self.members.contains(&id) {
            return;
        }
        self.members.retain(|m| *m != id);
        self.inboxes.remove(&id);
        self.buffered.retain(|(sender, _)| *sender != id);
        for member in self.members.clone() {
            self.deliver(member, Delivery::Left(id));
        }
    }

    /// Sends `message` to every other member.
    pub fn publish(&mut self, message: &Message) -> Result<()> {
        let frame = message.encode()?;
        if message.delivery_mode() == DeliveryMode::ReliableBuffered {
            self.buffered.push((message.sender, frame.clone()));
        }
        for member in self.members.clone() {
            if member != message.sender {
                self.deliver(member, Delivery::Frame(frame.clone()));
            }
        }
        Ok(())
    }

    /// Hands a raw frame to one member, as a misbehaving peer might.
    pub fn inject(&mut self, to: ParticipantId, frame: Vec<u8>) {
        self.deliver(to, Delivery::Frame(frame));
    }

    #[allow(missing_docs)]
    pub fn members(&self) -> &[ParticipantId] {
        &self.members
    }

    /// Sends whatever `manager` has queued, then delivers its inbox. Returns
    /// how many items moved.
    pub fn pump(&mut self, manager: &mut SessionMembershipManager) -> usize {
        let mut moved = 0;
        for message in manager.take_outbound() {
            if let Err(e) = self.publish(&message) {
                log::warn!("Loopback couldn't publish {message:?}: {e}");
            }
            moved += 1;
        }
        let inbox = self
            .inboxes
            .get_mut(&manager.local_id())
            .map(std::mem::take)
            .unwrap_or_default();
        for delivery in inbox {
            match delivery {
                Delivery::Frame(frame) => manager.on_frame(&frame),
                Delivery::Connected(id, name) => manager.on_connected(id, &name),
                Delivery::Left(id) => manager.on_leave(id),
            }
            moved += 1;
        }
        moved
    }

    /// Pumps every manager until nothing moves.
    pub fn settle(&mut self, managers: &mut [&mut SessionMembershipManager]) {
        loop {
            let moved: usize = managers.iter_mut().map(|m| self.pump(m)).sum();
            if moved == 0 {
                break;
            }
        }
    }

    fn deliver(&mut self, to: ParticipantId, delivery: Delivery) {
        if let Some(inbox) = self.inboxes.get_mut(&to) {
            inbox.push_back(delivery);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        network::{Announcement, MessageBody},
        types::{InstrumentKind, KeyId, SlotIndex},
    };

    #[test]
    fn buffered_messages_replay_to_late_members() {
        let mut room = LoopbackRoom::new(3);
        let first = room.connect("a").unwrap();
        assert_eq!(first.remote_count, 0);
        room.publish(&Message::new(
            first.id,
            MessageBody::Announce(Announcement {
                instrument: InstrumentKind::QwertyPiano,
                slot: SlotIndex(0),
            }),
        ))
        .unwrap();
        room.publish(&Message::new(first.id, MessageBody::Press(KeyId('z'))))
            .unwrap();

        let second = room.connect("b").unwrap();
        assert_eq!(second.remote_count, 1);
        assert_eq!(room.inboxes[&second.id].len(), 1, "only the announcement");
    }

    #[test]
    fn departures_purge_history_and_notify() {
        let mut room = LoopbackRoom::new(2);
        let a = room.connect("a").unwrap();
        let b = room.connect("b").unwrap();
        room.publish(&Message::new(
            b.id,
            MessageBody::Announce(Announcement {
                instrument: InstrumentKind::QwertyGuitar,
                slot: SlotIndex(1),
            }),
        ))
        .unwrap();
        assert!(matches!(room.connect("c"), Err(JamError::SessionFull)));

        room.disconnect(b.id);
        room.disconnect(b.id);
        assert_eq!(room.members(), &[a.id]);
        assert_eq!(
            room.inboxes[&a.id].back(),
            Some(&Delivery::Left(b.id))
        );
        let c = room.connect("c").unwrap();
        assert!(room.inboxes[&c.id].is_empty());
    }
}
