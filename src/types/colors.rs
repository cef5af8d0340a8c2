// Copyright (c) 2024 Mike Tsao. All rights reserved.

use serde::{Deserialize, Serialize};

/// An RGB color with components in 0.0..=1.0. Key colors are presentation
/// data; the protocol core only carries them so that renderers can restore a
/// key's resting color after a highlight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub struct KeyColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}
#[allow(missing_docs)]
impl KeyColor {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const GRAY: Self = Self::new(0.5, 0.5, 0.5);
    pub const RED: Self = Self::new(1.0, 0.0, 0.0);

    /// The color of a key that has no note.
    pub const INACTIVE: Self = Self::new(0.05, 0.01, 0.01);

    /// The color a key takes while it mirrors a spectated performance.
    pub const SPECTATE_HIGHLIGHT: Self = Self::RED;

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Linear interpolation toward `other`. `t` is clamped to 0.0..=1.0.
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }
}
