// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Room membership: who is here, where they sit, and which instruments exist.
//!
//! There is no central arbiter. The first participant into a room sets up its
//! instrument right away. Everyone after that waits until it has heard a
//! buffered announcement from every participant already in the room, and
//! only then takes the lowest free slot and announces itself.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{
        JoinStatus, Participant, ParticipantBuilder, SessionEvent, SessionMembershipManager,
        SlotTable,
    };
}

pub use slots::SlotTable;

use crate::{
    error::{JamError, Result},
    instruments::qwerty::{OCTAVE_DOWN_KEY, OCTAVE_UP_KEY},
    network::{Announcement, Message, MessageBody},
    redirector::OwnershipRedirector,
    router::{NoteEventRouter, RouterEvent},
    types::{InstrumentKind, InstrumentParams, KeyId, SlotIndex},
    uid::ParticipantId,
    util::{ChannelPair, SessionSettings},
};
use crossbeam_channel::Receiver;
use derive_builder::Builder;
use std::collections::{HashMap, HashSet};

mod slots;

/// Someone in the session.
#[derive(Builder, Clone, Debug, Eq, PartialEq)]
#[builder(setter(into))]
pub struct Participant {
    #[allow(missing_docs)]
    pub id: ParticipantId,
    #[allow(missing_docs)]
    #[builder(default = "\"Player1\".to_string()")]
    pub display_name: String,
    /// Unassigned until the participant's instrument exists.
    #[builder(default)]
    pub slot: Option<SlotIndex>,
    #[allow(missing_docs)]
    #[builder(default)]
    pub instrument: InstrumentKind,
}

/// What happened to the session, for the layers that draw it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionEvent {
    /// An instrument instance now exists for `owner`.
    InstrumentCreated {
        #[allow(missing_docs)]
        owner: ParticipantId,
        #[allow(missing_docs)]
        instrument: InstrumentKind,
        #[allow(missing_docs)]
        slot: SlotIndex,
        #[allow(missing_docs)]
        is_local: bool,
    },
    /// `owner` left and its instrument is gone.
    InstrumentDestroyed {
        #[allow(missing_docs)]
        owner: ParticipantId,
        #[allow(missing_docs)]
        slot: Option<SlotIndex>,
    },
    /// The local participant finished joining.
    LocalJoined(SlotIndex),
    /// The local participant couldn't get a slot.
    SessionFull,
    /// The local instrument started or stopped mirroring someone.
    SpectateChanged(Option<ParticipantId>),
}

/// Where the local participant is in the join protocol.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinStatus {
    /// Not in a session.
    Outside,
    /// Waiting for announcements from participants already in the room.
    AwaitingAnnouncements {
        /// Participants the room reported when we joined, minus departures.
        expected: usize,
        /// Remote instruments created so far.
        received: usize,
    },
    /// The local instrument exists.
    Joined(SlotIndex),
}

#[derive(Clone, Copy, Debug)]
enum JoinPhase {
    Outside,
    Awaiting {
        expected: usize,
        instrument: InstrumentKind,
    },
    Joined(SlotIndex),
}

/// Drives the join/leave protocol for one process and owns every instrument
/// instance that process knows about.
#[derive(Debug)]
pub struct SessionMembershipManager {
    local: ParticipantId,
    settings: SessionSettings,
    slots: SlotTable,
    participants: HashMap<ParticipantId, Participant>,
    redirectors: HashMap<ParticipantId, OwnershipRedirector>,
    display_names: HashMap<ParticipantId, String>,
    phase: JoinPhase,
    // Connected after request_join, so not part of the expected count.
    late_arrivals: HashSet<ParticipantId>,
    // Counted participants whose departure already lowered the count.
    departed: HashSet<ParticipantId>,
    outbox: ChannelPair<Message>,
    events: ChannelPair<SessionEvent>,
}
impl SessionMembershipManager {
    /// Creates a manager for the process whose participant id is `local`.
    pub fn new_with(local: ParticipantId, settings: SessionSettings) -> Self {
        Self {
            local,
            slots: SlotTable::new(settings.capacity()),
            settings,
            participants: HashMap::default(),
            redirectors: HashMap::default(),
            display_names: HashMap::default(),
            phase: JoinPhase::Outside,
            late_arrivals: HashSet::default(),
            departed: HashSet::default(),
            outbox: ChannelPair::default(),
            events: ChannelPair::default(),
        }
    }

    #[allow(missing_docs)]
    pub fn local_id(&self) -> ParticipantId {
        self.local
    }

    #[allow(missing_docs)]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Seats `participant` in the lowest free slot and creates its instrument.
    /// Seating someone who already has an instrument returns their existing
    /// slot.
    pub fn join(&mut self, participant: Participant) -> Result<SlotIndex> {
        if let Some(slot) = self
            .participants
            .get(&participant.id)
            .and_then(|p| p.slot)
        {
            return Ok(slot);
        }
        let slot = self.slots.assign_lowest(participant.id)?;
        self.admit(participant, slot);
        Ok(slot)
    }

    /// Removes `id`'s instrument and frees its slot. Does nothing if `id` is
    /// already gone.
    pub fn leave(&mut self, id: ParticipantId) {
        if let JoinPhase::Awaiting { expected, .. } = &mut self.phase {
            if id != self.local && !self.late_arrivals.contains(&id) && self.departed.insert(id)
            {
                *expected = expected.saturating_sub(1);
            }
        }
        if self.redirectors.remove(&id).is_none() {
            log::debug!("{id} left without an instrument");
            return;
        }
        self.participants.remove(&id);
        let slot = self.slots.release(id);
        log::info!("{id} left; freed slot {slot:?}");
        self.emit(SessionEvent::InstrumentDestroyed { owner: id, slot });

        if id == self.local {
            self.phase = JoinPhase::Outside;
            return;
        }
        let local = self.local;
        if let Some(redirector) = self.redirectors.get_mut(&local) {
            if redirector.forget(id) {
                self.emit(SessionEvent::SpectateChanged(None));
            }
        }
    }

    /// Starts the join protocol for the local participant, who brings
    /// `instrument`. `remote_count` is how many other participants the room
    /// reported on arrival. Zero means we created the room.
    pub fn request_join(
        &mut self,
        instrument: InstrumentKind,
        remote_count: usize,
    ) -> Result<JoinStatus> {
        match self.phase {
            JoinPhase::Joined(slot) => return Err(JamError::AlreadyJoined(slot)),
            JoinPhase::Awaiting { .. } => return Ok(self.join_status()),
            JoinPhase::Outside => {}
        }
        if remote_count >= self.slots.capacity() {
            log::warn!(
                "Room reports {remote_count} participants; capacity is {}",
                self.slots.capacity()
            );
            self.emit(SessionEvent::SessionFull);
            return Err(JamError::SessionFull);
        }
        self.phase = JoinPhase::Awaiting {
            expected: remote_count,
            instrument,
        };
        self.late_arrivals.clear();
        self.departed.clear();
        if remote_count == 0 {
            log::info!("{} created the session", self.local);
        } else {
            log::info!("{} joined; waiting for {remote_count} announcements", self.local);
        }
        self.complete_join_if_ready()?;
        Ok(self.join_status())
    }

    /// Handles another participant's announcement. Returns true if it created
    /// an instrument.
    pub fn on_announce(&mut self, sender: ParticipantId, announcement: Announcement) -> bool {
        if sender == self.local || self.redirectors.contains_key(&sender) {
            log::debug!("Ignoring repeated announcement from {sender}");
            return false;
        }
        if let Err(e) = self.slots.claim(announcement.slot, sender) {
            log::warn!("Dropping announcement from {sender}: {e}");
            return false;
        }
        let participant = Participant {
            id: sender,
            display_name: self
                .display_names
                .get(&sender)
                .cloned()
                .unwrap_or_else(|| format!("Player {sender}")),
            slot: None,
            instrument: announcement.instrument,
        };
        self.admit(participant, announcement.slot);

        if let Err(e) = self.complete_join_if_ready() {
            log::warn!("Couldn't finish joining: {e}");
        }
        true
    }

    /// Handles a departure reported by the transport.
    pub fn on_leave(&mut self, id: ParticipantId) {
        self.leave(id);
    }

    /// Records a name the transport reported for a newly connected
    /// participant. Names are cosmetic; the protocol only uses ids.
    pub fn on_connected(&mut self, id: ParticipantId, display_name: &str) {
        log::info!("Participant connected: {display_name} {id}");
        if matches!(self.phase, JoinPhase::Awaiting { .. }) {
            self.late_arrivals.insert(id);
        }
        self.display_names.insert(id, display_name.to_string());
    }

    /// Routes one inbound message.
    pub fn on_message(&mut self, message: Message) {
        if let MessageBody::Announce(announcement) = message.body {
            self.on_announce(message.sender, announcement);
            return;
        }
        if !self.redirectors.contains_key(&message.sender) {
            log::debug!(
                "Dropping {} from unknown sender {}",
                message.body.event_code(),
                message.sender
            );
            return;
        }
        for redirector in self.redirectors.values_mut() {
            redirector.network_event_receive(&message);
        }
    }

    /// Decodes and routes one inbound frame. Malformed frames are dropped.
    pub fn on_frame(&mut self, bytes: &[u8]) {
        match Message::decode(bytes) {
            Ok(message) => self.on_message(message),
            Err(e) => log::warn!("Dropping frame: {e}"),
        }
    }

    /// Plays a key on the local instrument.
    pub fn play(&mut self, is_down: bool, key: KeyId) -> Result<()> {
        self.local_redirector()?.play(is_down, key);
        Ok(())
    }

    /// Changes the local instrument's parameters.
    pub fn set_parameters(&mut self, params: InstrumentParams) -> Result<()> {
        self.local_redirector()?.set_parameters(params);
        Ok(())
    }

    /// Handles a key from the local keyboard. The bracket keys shift the
    /// octave on key-down; every other key is played.
    pub fn handle_key(&mut self, key: KeyId, is_down: bool) -> Result<()> {
        let redirector = self.local_redirector()?;
        match key {
            OCTAVE_DOWN_KEY => {
                if is_down {
                    redirector.shift_octave(-1);
                }
            }
            OCTAVE_UP_KEY => {
                if is_down {
                    redirector.shift_octave(1);
                }
            }
            _ => {
                redirector.play(is_down, key);
            }
        }
        Ok(())
    }

    /// Mirrors `target`'s notes on the local instrument, or stops mirroring.
    pub fn spectate(&mut self, target: Option<ParticipantId>) -> Result<()> {
        if let Some(target) = target {
            if target == self.local || !self.redirectors.contains_key(&target) {
                return Err(JamError::UnknownParticipant(target));
            }
        }
        self.local_redirector()?.set_spectate_target(target)?;
        self.emit(SessionEvent::SpectateChanged(target));
        Ok(())
    }

    /// Where the local participant is in the join protocol.
    pub fn join_status(&self) -> JoinStatus {
        match self.phase {
            JoinPhase::Outside => JoinStatus::Outside,
            JoinPhase::Awaiting { expected, .. } => JoinStatus::AwaitingAnnouncements {
                expected,
                received: self.remote_instrument_count(),
            },
            JoinPhase::Joined(slot) => JoinStatus::Joined(slot),
        }
    }

    #[allow(missing_docs)]
    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    /// Everyone with an instrument, in slot order.
    pub fn participants(&self) -> Vec<&Participant> {
        let mut participants: Vec<&Participant> = self.participants.values().collect();
        participants.sort_by_key(|p| p.slot);
        participants
    }

    #[allow(missing_docs)]
    pub fn slot_of(&self, id: ParticipantId) -> Option<SlotIndex> {
        self.slots.slot_of(id)
    }

    #[allow(missing_docs)]
    pub fn instrument_count(&self) -> usize {
        self.redirectors.len()
    }

    #[allow(missing_docs)]
    pub fn redirector(&self, owner: ParticipantId) -> Option<&OwnershipRedirector> {
        self.redirectors.get(&owner)
    }

    /// Observes the notifications of `owner`'s instrument.
    pub fn subscribe(&mut self, owner: ParticipantId) -> Option<Receiver<RouterEvent>> {
        self.redirectors.get_mut(&owner).map(|r| r.subscribe())
    }

    /// Messages waiting for the transport to send.
    pub fn outbound(&self) -> &Receiver<Message> {
        &self.outbox.receiver
    }

    /// Removes and returns every message waiting for the transport.
    pub fn take_outbound(&self) -> Vec<Message> {
        self.outbox.drain()
    }

    /// Lifecycle notifications.
    pub fn events(&self) -> &Receiver<SessionEvent> {
        &self.events.receiver
    }

    fn remote_instrument_count(&self) -> usize {
        self.redirectors.len() - usize::from(self.redirectors.contains_key(&self.local))
    }

    fn local_redirector(&mut self) -> Result<&mut OwnershipRedirector> {
        self.redirectors
            .get_mut(&self.local)
            .ok_or(JamError::NotJoined)
    }

    fn admit(&mut self, mut participant: Participant, slot: SlotIndex) {
        let id = participant.id;
        participant.slot = Some(slot);
        let redirector = OwnershipRedirector::new(
            id,
            self.local,
            NoteEventRouter::new_with(participant.instrument, &self.settings),
            self.outbox.sender.clone(),
        );
        let is_local = redirector.is_local();
        log::info!(
            "Created {} for {} {id} at slot {slot}",
            participant.instrument,
            participant.display_name
        );
        self.emit(SessionEvent::InstrumentCreated {
            owner: id,
            instrument: participant.instrument,
            slot,
            is_local,
        });
        self.redirectors.insert(id, redirector);
        self.participants.insert(id, participant);
    }

    fn complete_join_if_ready(&mut self) -> Result<()> {
        let JoinPhase::Awaiting {
            expected,
            instrument,
        } = self.phase
        else {
            return Ok(());
        };
        if self.remote_instrument_count() != expected {
            return Ok(());
        }
        let participant = Participant {
            id: self.local,
            display_name: self.settings.display_name().to_string(),
            slot: None,
            instrument,
        };
        match self.join(participant) {
            Ok(slot) => {
                self.phase = JoinPhase::Joined(slot);
                self.emit(SessionEvent::LocalJoined(slot));
                if let Err(e) = self.outbox.sender.try_send(Message::new(
                    self.local,
                    MessageBody::Announce(Announcement { instrument, slot }),
                )) {
                    log::warn!("While announcing: {e:?}");
                }
                Ok(())
            }
            Err(e) => {
                self.phase = JoinPhase::Outside;
                self.emit(SessionEvent::SessionFull);
                Err(e)
            }
        }
    }

    fn emit(&self, event: SessionEvent) {
        if let Err(e) = self.events.sender.try_send(event) {
            log::warn!("While sending session event: {e:?}");
        }
    }
}
