// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Session errors.

use crate::{types::SlotIndex, uid::ParticipantId};
use thiserror::Error;

/// Everything that can go wrong in a session. None of these are fatal.
#[derive(Debug, Error)]
pub enum JamError {
    /// Every slot in the session is taken.
    #[error("the session is full")]
    SessionFull,

    /// The local participant already has an instrument in this session.
    #[error("already joined at slot {0}")]
    AlreadyJoined(SlotIndex),

    /// The local participant hasn't finished joining yet.
    #[error("not joined yet")]
    NotJoined,

    /// The id doesn't name a connected participant.
    #[error("unknown participant {0}")]
    UnknownParticipant(ParticipantId),

    /// The operation may only be performed on the local participant's own
    /// instrument.
    #[error("instrument owned by {0} is not local")]
    NotLocal(ParticipantId),

    /// The slot is out of range or held by someone else.
    #[error("slot {0} is not available")]
    InvalidSlot(SlotIndex),

    /// A frame decoded, but its payload doesn't fit its event code.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A frame couldn't be encoded or decoded at all.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, JamError>;
