// Copyright (c) 2024 Mike Tsao. All rights reserved.

#![warn(missing_docs)]

//! The `ensnare-jam` crate lets several people play instruments together in
//! one real-time session.
//!
//! Each participant owns exactly one instrument. Key presses on it are heard
//! and seen by everyone exactly once. A participant can also spectate someone
//! else, which mirrors that person's keys on the local instrument without
//! playing any sound.
//!
//! The pieces, from the bottom up:
//!
//! - [NoteEventRouter](router::NoteEventRouter) applies presses and releases
//!   to one instrument instance and keeps its recent-note history.
//! - [OwnershipRedirector](redirector::OwnershipRedirector) decides whether an
//!   event is authoritative, must be broadcast, or should be ignored.
//! - [SpectateAddressResolver](spectate::SpectateAddressResolver) remembers
//!   whom the local instrument mirrors.
//! - [SessionMembershipManager](session::SessionMembershipManager) runs the
//!   join/leave protocol and owns every instrument instance.
//!
//! Rendering, audio playback, and the network transport are left to the
//! application. They talk to this crate through [network::Message]s and the
//! notification channels.

pub mod error;
pub mod instruments;
pub mod network;
pub mod redirector;
pub mod router;
pub mod session;
pub mod spectate;
pub mod traits;
pub mod types;
pub mod uid;
pub mod util;

/// A collection of imports that are useful to users of this crate. `use
/// ensnare_jam::prelude::*;` for easier onboarding.
pub mod prelude {
    pub use super::{
        error::JamError,
        instruments::prelude::*,
        network::loopback::{Arrival, LoopbackRoom},
        network::prelude::*,
        redirector::{OwnershipRedirector, Reception},
        router::{KeyState, NoteEventRouter, RouterEvent, VisualCue, RECENT_NOTE_CAPACITY},
        session::prelude::*,
        spectate::SpectateAddressResolver,
        traits::prelude::*,
        types::prelude::*,
        uid::{IsUid, ParticipantId, ParticipantIdFactory},
        util::prelude::*,
    };
}
