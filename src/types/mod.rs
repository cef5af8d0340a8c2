// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Common data types used throughout the system.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{InstrumentKind, InstrumentParams, KeyColor, KeyId, SlotIndex, TimbreRef};
}

pub use colors::KeyColor;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum_macros::{EnumCount, EnumIter, FromRepr};

mod colors;

/// A seat in a fixed-capacity session, in 0..capacity.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub struct SlotIndex(pub usize);
impl From<usize> for SlotIndex {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

/// Identifies one key of a QWERTY instrument by the character printed on it.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct KeyId(pub char);
impl From<char> for KeyId {
    fn from(value: char) -> Self {
        Self(value)
    }
}

/// An opaque handle naming the sound a key plays. The audio layer resolves it
/// to an actual clip.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub struct TimbreRef(pub &'static str);

/// The kinds of instrument a participant can bring into a session.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    EnumCount,
    EnumIter,
    Eq,
    FromRepr,
    Hash,
    PartialEq,
    Serialize,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum InstrumentKind {
    QwertyGuitar,
    #[default]
    QwertyPiano,
}

/// Runtime parameters of an instrument instance. These are the only state
/// that crosses the network besides note events.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct InstrumentParams {
    /// Octaves above or below the instrument's home octave.
    pub octave: i8,
}
impl InstrumentParams {
    #[allow(missing_docs)]
    pub const MIN_OCTAVE: i8 = -1;
    #[allow(missing_docs)]
    pub const MAX_OCTAVE: i8 = 1;

    #[allow(missing_docs)]
    pub fn with_octave(octave: i8) -> Self {
        Self { octave }
    }

    /// Returns a copy whose octave is within MIN_OCTAVE..=MAX_OCTAVE.
    pub fn clamped(&self) -> Self {
        Self {
            octave: self.octave.clamp(Self::MIN_OCTAVE, Self::MAX_OCTAVE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn params_clamp_octave() {
        assert_eq!(InstrumentParams::with_octave(5).clamped().octave, 1);
        assert_eq!(InstrumentParams::with_octave(-9).clamped().octave, -1);
        assert_eq!(InstrumentParams::with_octave(0).clamped().octave, 0);
    }

    #[test]
    fn instrument_kinds_serialize_kebab_case() {
        assert_eq!(
            serde_json::to_string(&InstrumentKind::QwertyGuitar).unwrap(),
            "\"qwerty-guitar\""
        );
        assert_eq!(InstrumentKind::iter().count(), 2);
    }
}
