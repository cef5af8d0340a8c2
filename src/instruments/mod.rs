// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Instrument kinds and the immutable key-to-note tables they are built from.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{KeyMap, NoteDefinition};
}

use crate::types::{InstrumentKind, KeyColor, KeyId, TimbreRef};
use std::collections::HashMap;

pub mod qwerty;

/// What a single key plays. Built once when the instrument is set up and never
/// changed afterward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteDefinition {
    /// Distance in semitones from the timbre's recorded pitch.
    pub semitone_offset: i32,
    #[allow(missing_docs)]
    pub timbre: TimbreRef,
    /// Resting color of the key.
    pub color: KeyColor,
    #[allow(missing_docs)]
    pub playable: bool,
}

/// An instrument's fixed layout: every key on it, the notes bound to the
/// active ones, and groups of keys that share a semitone.
#[derive(Debug, Default)]
pub struct KeyMap {
    grid: Vec<KeyId>,
    notes: HashMap<KeyId, NoteDefinition>,
    duplicates: HashMap<i32, Vec<KeyId>>,
}
impl KeyMap {
    /// Builds a map from the full list of keys and the notes bound to some of
    /// them. Bindings for keys that aren't in `grid` are kept; a layout may
    /// have playable keys that aren't drawn.
    pub fn new(
        grid: impl IntoIterator<Item = KeyId>,
        notes: impl IntoIterator<Item = (KeyId, NoteDefinition)>,
    ) -> Self {
        let grid: Vec<KeyId> = grid.into_iter().collect();
        let notes: HashMap<KeyId, NoteDefinition> = notes.into_iter().collect();
        let mut duplicates: HashMap<i32, Vec<KeyId>> = HashMap::default();
        for (key, note) in notes.iter().filter(|(_, n)| n.playable) {
            duplicates
                .entry(note.semitone_offset)
                .or_default()
                .push(*key);
        }
        duplicates.values_mut().for_each(|keys| keys.sort());
        Self {
            grid,
            notes,
            duplicates,
        }
    }

    /// The note bound to `key`, if the key is active.
    pub fn note(&self, key: KeyId) -> Option<&NoteDefinition> {
        self.notes.get(&key).filter(|n| n.playable)
    }

    /// Every key of the layout in row-major order, active or not.
    pub fn grid(&self) -> &[KeyId] {
        &self.grid
    }

    /// How many keys have a playable note.
    pub fn active_count(&self) -> usize {
        self.notes.values().filter(|n| n.playable).count()
    }

    /// The color `key` shows when nothing is happening to it.
    pub fn resting_color(&self, key: KeyId) -> KeyColor {
        self.note(key).map_or(KeyColor::INACTIVE, |n| n.color)
    }

    /// All keys that play the same semitone as `key`, including `key` itself.
    /// Empty for inactive keys.
    pub fn duplicates(&self, key: KeyId) -> &[KeyId] {
        self.note(key)
            .and_then(|n| self.duplicates.get(&n.semitone_offset))
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }
}

impl InstrumentKind {
    /// The sound every key of this kind plays.
    pub fn timbre(&self) -> TimbreRef {
        match self {
            InstrumentKind::QwertyGuitar => TimbreRef("guitar"),
            InstrumentKind::QwertyPiano => TimbreRef("piano"),
        }
    }

    /// Builds a fresh key map for an instance of this kind.
    pub fn key_map(&self) -> KeyMap {
        match self {
            InstrumentKind::QwertyGuitar | InstrumentKind::QwertyPiano => {
                qwerty::key_map(self.timbre())
            }
        }
    }
}
