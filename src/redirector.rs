// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Decides, for every note event, whether an instrument instance applies it,
//! broadcasts it, or ignores it.

use crate::{
    error::{JamError, Result},
    network::{Message, MessageBody, Outbox},
    router::{NoteEventRouter, RouterEvent},
    spectate::SpectateAddressResolver,
    traits::PlaysKeys,
    types::{InstrumentParams, KeyId},
    uid::ParticipantId,
};
use crossbeam_channel::Receiver;

/// What [OwnershipRedirector::network_event_receive()] did with a message.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Reception {
    /// Applied as the owner's own performance.
    Applied,
    /// Applied as a visual-only mirror of a spectated participant.
    Spectated,
    /// Not for this instrument.
    Ignored,
}

/// Wraps one instrument instance with the identity of the participant who
/// owns it. Only the owner's events are authoritative. The local participant
/// can additionally mirror one other participant's notes.
#[derive(Debug)]
pub struct OwnershipRedirector<P: PlaysKeys = NoteEventRouter> {
    owner: ParticipantId,
    local: ParticipantId,
    is_local: bool,
    instrument: P,
    spectate: SpectateAddressResolver,
    outbox: Outbox,
}
impl<P: PlaysKeys> OwnershipRedirector<P> {
    /// Wraps `instrument`. It's the local instrument if `owner` is `local`.
    pub fn new(owner: ParticipantId, local: ParticipantId, instrument: P, outbox: Outbox) -> Self {
        Self {
            owner,
            local,
            is_local: owner == local,
            instrument,
            spectate: SpectateAddressResolver::default(),
            outbox,
        }
    }

    #[allow(missing_docs)]
    pub fn owner(&self) -> ParticipantId {
        self.owner
    }

    #[allow(missing_docs)]
    pub fn is_local(&self) -> bool {
        self.is_local
    }

    #[allow(missing_docs)]
    pub fn instrument(&self) -> &P {
        &self.instrument
    }

    /// Plays a key on the local instrument and tells everyone else. Returns
    /// false, doing nothing, if this isn't the local instrument.
    pub fn play(&mut self, is_down: bool, key: KeyId) -> bool {
        if !self.is_local {
            log::debug!("Refusing to play {key} on {}'s instrument", self.owner);
            return false;
        }
        self.instrument.note_event(is_down, key, false);
        self.broadcast(MessageBody::note(is_down, key));
        true
    }

    /// Changes the local instrument's parameters and tells everyone else.
    /// Returns false, doing nothing, if this isn't the local instrument.
    pub fn set_parameters(&mut self, params: InstrumentParams) -> bool {
        if !self.is_local {
            log::debug!("Refusing to change parameters of {}'s instrument", self.owner);
            return false;
        }
        self.instrument.set_parameters(params);
        let applied = self.instrument.parameters();
        self.broadcast(MessageBody::ParamChange(applied));
        true
    }

    /// Moves the local instrument up or down by `delta` octaves.
    pub fn shift_octave(&mut self, delta: i8) -> bool {
        let current = self.instrument.parameters();
        self.set_parameters(InstrumentParams::with_octave(
            current.octave.saturating_add(delta),
        ))
    }

    /// Evaluates an inbound message against this instrument's ownership.
    pub fn network_event_receive(&mut self, message: &Message) -> Reception {
        if message.sender == self.owner {
            if self.is_local {
                return Reception::Ignored;
            }
            match message.body {
                MessageBody::Press(key) => {
                    self.instrument.note_event(true, key, false);
                    Reception::Applied
                }
                MessageBody::Release(key) => {
                    self.instrument.note_event(false, key, false);
                    Reception::Applied
                }
                MessageBody::ParamChange(params) => {
                    self.instrument.set_parameters(params);
                    Reception::Applied
                }
                MessageBody::Announce(_) => Reception::Ignored,
            }
        } else if self.is_local && self.spectate.resolves(message.sender) {
            match message.body.as_note() {
                Some((is_down, key)) => {
                    self.instrument.note_event(is_down, key, true);
                    Reception::Spectated
                }
                None => Reception::Ignored,
            }
        } else {
            Reception::Ignored
        }
    }

    /// Starts or stops mirroring another participant. Only the local
    /// instrument can spectate.
    pub fn set_spectate_target(&mut self, target: Option<ParticipantId>) -> Result<()> {
        if !self.is_local {
            return Err(JamError::NotLocal(self.owner));
        }
        self.spectate.set_target(target);
        Ok(())
    }

    #[allow(missing_docs)]
    pub fn spectate_target(&self) -> Option<ParticipantId> {
        self.spectate.target()
    }

    /// Drops spectate state that names a departed participant. Returns true
    /// if the target changed.
    pub fn forget(&mut self, departed: ParticipantId) -> bool {
        self.spectate.forget(departed)
    }

    fn broadcast(&self, body: MessageBody) {
        if let Err(e) = self.outbox.try_send(Message::new(self.local, body)) {
            log::warn!("While broadcasting {:?}: {e:?}", body.event_code());
        }
    }
}
impl OwnershipRedirector<NoteEventRouter> {
    /// Registers an observer of the wrapped instrument's notifications.
    pub fn subscribe(&mut self) -> Receiver<RouterEvent> {
        self.instrument.subscribe()
    }
}
