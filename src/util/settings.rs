// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Structs that hold configuration information about various parts of the
//! system. Intended to be serialized.

use crate::{error::Result, traits::HasSettings, types::InstrumentKind};
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contains persistent session settings.
#[derive(Debug, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(rename_all = "kebab-case")]
pub struct SessionSettings {
    /// The room that every participant joins.
    #[serde(default = "SessionSettings::default_room_name")]
    #[derivative(Default(value = "Self::default_room_name()"))]
    room_name: String,

    /// What other participants see as this participant's name.
    #[serde(default = "SessionSettings::default_display_name")]
    #[derivative(Default(value = "Self::default_display_name()"))]
    display_name: String,

    /// The instrument this participant brings into the session.
    #[serde(default)]
    instrument: InstrumentKind,

    /// How many participants fit in a session.
    #[serde(default = "SessionSettings::default_capacity")]
    #[derivative(Default(value = "Self::default_capacity()"))]
    capacity: usize,

    /// Frequency ratio of one octave. Pitch is base_ratio raised to the
    /// number of octaves a note is away from the sampled timbre.
    #[serde(default = "SessionSettings::default_base_ratio")]
    #[derivative(Default(value = "Self::default_base_ratio()"))]
    base_ratio: f32,

    /// Capacity of each note-notification subscriber's channel.
    #[serde(default = "SessionSettings::default_notification_capacity")]
    #[derivative(Default(value = "Self::default_notification_capacity()"))]
    notification_capacity: usize,

    #[serde(skip)]
    has_been_saved: bool,
}
impl HasSettings for SessionSettings {
    fn has_been_saved(&self) -> bool {
        self.has_been_saved
    }

    fn needs_save(&mut self) {
        self.has_been_saved = false;
    }

    fn mark_clean(&mut self) {
        self.has_been_saved = true;
    }
}
impl SessionSettings {
    fn default_room_name() -> String {
        "myRoom".to_string()
    }
    fn default_display_name() -> String {
        "Player1".to_string()
    }
    fn default_capacity() -> usize {
        3
    }
    fn default_base_ratio() -> f32 {
        2.0
    }
    fn default_notification_capacity() -> usize {
        64
    }

    /// Parses settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.mark_clean();
        Ok(settings)
    }

    /// Serializes settings to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads settings from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }

    /// Writes settings to a JSON file and marks them clean.
    pub fn save(&mut self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, self.to_json()?)?;
        self.mark_clean();
        Ok(())
    }

    #[allow(missing_docs)]
    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    #[allow(missing_docs)]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Updates the field and marks the struct eligible to save.
    pub fn set_display_name(&mut self, display_name: &str) {
        let display_name = if display_name.is_empty() {
            Self::default_display_name()
        } else {
            display_name.to_string()
        };
        if display_name != self.display_name {
            self.display_name = display_name;
            self.needs_save();
        }
    }

    #[allow(missing_docs)]
    pub fn instrument(&self) -> InstrumentKind {
        self.instrument
    }

    /// Updates the field and marks the struct eligible to save.
    pub fn set_instrument(&mut self, instrument: InstrumentKind) {
        if instrument != self.instrument {
            self.instrument = instrument;
            self.needs_save();
        }
    }

    #[allow(missing_docs)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Updates the field and marks the struct eligible to save. A session
    /// always has room for at least one participant.
    pub fn set_capacity(&mut self, capacity: usize) {
        let capacity = capacity.max(1);
        if capacity != self.capacity {
            self.capacity = capacity;
            self.needs_save();
        }
    }

    #[allow(missing_docs)]
    pub fn base_ratio(&self) -> f32 {
        self.base_ratio
    }

    #[allow(missing_docs)]
    pub fn notification_capacity(&self) -> usize {
        self.notification_capacity
    }
}
