// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! The traits that define many characteristics and relationships among parts of
//! the system.

/// Quick import of all important traits.
pub mod prelude {
    pub use super::{HasSettings, PlaysKeys};
}

use crate::{
    instruments::NoteDefinition,
    types::{InstrumentParams, KeyId},
};

/// The capability every instrument kind offers to the network layer. An
/// [OwnershipRedirector](crate::redirector::OwnershipRedirector) decides
/// *whether* an event reaches the instrument; the instrument decides what the
/// event means.
pub trait PlaysKeys: core::fmt::Debug {
    /// The note bound to `key`, or None if the key is inactive.
    fn note(&self, key: KeyId) -> Option<&NoteDefinition>;

    /// The current runtime parameters.
    fn parameters(&self) -> InstrumentParams;

    /// Replaces the runtime parameters. Implementations clamp out-of-range
    /// values rather than rejecting them.
    fn set_parameters(&mut self, params: InstrumentParams);

    /// Presses or releases `key`. `is_spectate` means the event mirrors
    /// someone else's performance and must stay visual-only.
    fn note_event(&mut self, is_down: bool, key: KeyId, is_spectate: bool);
}

/// Something that [HasSettings] knows whether it needs to be persisted.
pub trait HasSettings {
    /// Whether the current state of this struct has been saved to disk.
    fn has_been_saved(&self) -> bool;
    /// Call this whenever the struct changes.
    fn needs_save(&mut self);
    /// Call this after a load() or a save().
    fn mark_clean(&mut self);
}
