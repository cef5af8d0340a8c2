// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! The QWERTY keyboard layout shared by the keyboard-played instruments.

use super::{KeyMap, NoteDefinition};
use crate::types::{KeyColor, KeyId, TimbreRef};

/// Every key of the virtual keyboard, row by row, four rows of ten.
pub const GRID: &str = "1234567890qwertyuiopasdfghjkl;zxcvbnm,./";
#[allow(missing_docs)]
pub const GRID_ROWS: usize = 4;
#[allow(missing_docs)]
pub const GRID_COLUMNS: usize = 10;

/// Octave-shift keys. They never produce notes.
pub const OCTAVE_DOWN_KEY: KeyId = KeyId('[');
#[allow(missing_docs)]
pub const OCTAVE_UP_KEY: KeyId = KeyId(']');

// The two bottom rows are white keys, the sparse row above each is black
// keys, piano-style.
const PLAYABLE: &str = "zxcvbnm,./asdfghjkl;wetyuop2356790";
const SEMITONES: [i32; 34] = [
    0, 2, 4, 5, 7, 9, 11, 12, 14, 16, //
    0, 2, 4, 5, 7, 9, 11, 12, 14, 16, //
    1, 3, 6, 8, 10, 13, 15, //
    1, 3, 6, 8, 10, 13, 15,
];
const WHITE_KEY_COUNT: usize = 20;

/// Samples are recorded an octave above where the keyboard should sound.
const BASE_SEMITONE_SHIFT: i32 = -12;

/// Builds the key map for a QWERTY instrument whose every key plays `timbre`.
pub fn key_map(timbre: TimbreRef) -> KeyMap {
    let black = KeyColor::BLACK.lerp(&KeyColor::GRAY, 0.8);
    let notes = PLAYABLE
        .chars()
        .zip(SEMITONES)
        .enumerate()
        .map(|(i, (c, semitone))| {
            (
                KeyId(c),
                NoteDefinition {
                    semitone_offset: semitone + BASE_SEMITONE_SHIFT,
                    timbre,
                    color: if i < WHITE_KEY_COUNT {
                        KeyColor::WHITE
                    } else {
                        black
                    },
                    playable: true,
                },
            )
        });
    KeyMap::new(GRID.chars().map(KeyId), notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_tables_agree() {
        assert_eq!(GRID.chars().count(), GRID_ROWS * GRID_COLUMNS);
        assert_eq!(PLAYABLE.chars().count(), SEMITONES.len());
        assert!(
            PLAYABLE.chars().all(|c| GRID.contains(c)),
            "every playable key should be on the grid"
        );
    }

    #[test]
    fn key_map_marks_unused_keys_inactive() {
        let map = key_map(TimbreRef("piano"));
        assert_eq!(map.grid().len(), 40);
        assert_eq!(map.active_count(), 34);
        assert!(map.note(KeyId('q')).is_none());
        assert!(map.note(KeyId('1')).is_none());
        assert!(map.note(OCTAVE_UP_KEY).is_none());

        let z = map.note(KeyId('z')).unwrap();
        assert_eq!(z.semitone_offset, -12);
        assert_eq!(z.color, KeyColor::WHITE);
        let w = map.note(KeyId('w')).unwrap();
        assert_eq!(w.semitone_offset, 1 - 12);
        assert_ne!(w.color, KeyColor::WHITE);
    }

    #[test]
    fn keys_sharing_a_semitone_are_grouped() {
        let map = key_map(TimbreRef("piano"));
        let mut dupes = map.duplicates(KeyId('z')).to_vec();
        dupes.sort();
        assert_eq!(dupes, vec![KeyId('a'), KeyId('z')]);
        assert!(map.duplicates(KeyId('q')).is_empty());
    }
}
