// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Turns key presses and releases into sound, visuals, and note history for a
//! single instrument instance. Knows nothing about the network.

use crate::{
    instruments::{KeyMap, NoteDefinition},
    traits::PlaysKeys,
    types::{InstrumentKind, InstrumentParams, KeyColor, KeyId, TimbreRef},
    util::SessionSettings,
};
use bounded_vec_deque::BoundedVecDeque;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::collections::HashMap;

/// How many recently played notes an instrument remembers.
pub const RECENT_NOTE_CAPACITY: usize = 5;

/// Whether a key is currently held down.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum KeyState {
    #[allow(missing_docs)]
    #[default]
    Released,
    #[allow(missing_docs)]
    Pressed,
}

/// A presentational change for a group of keys. Renderers apply the cue to
/// every key in the group.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VisualCue {
    /// Move the keys to their pressed position.
    Depress,
    /// Return the keys to their resting position.
    ResetPosition,
    /// Tint the keys to show a spectated press.
    Highlight,
    /// Restore the keys' resting color.
    ClearHighlight,
}

/// Notifications an instrument instance publishes to its observers.
#[derive(Clone, Debug, PartialEq)]
pub enum RouterEvent {
    /// Play `timbre` once at `pitch` (a playback-rate ratio, 1.0 = as
    /// recorded).
    TriggerAudio {
        #[allow(missing_docs)]
        key: KeyId,
        #[allow(missing_docs)]
        timbre: TimbreRef,
        #[allow(missing_docs)]
        pitch: f32,
    },
    /// The local player struck a note. Harmonic visualizations listen for
    /// this; spectated presses never produce it.
    NoteDown(NoteDefinition),
    /// Change how a group of keys looks.
    Visual {
        /// The pressed key and every key sharing its semitone.
        keys: Vec<KeyId>,
        #[allow(missing_docs)]
        cue: VisualCue,
        /// The color the keys should show after the cue.
        color: KeyColor,
    },
}

/// The per-instance note logic: key lookup, press/release semantics, bounded
/// history, and notifications.
#[derive(Debug)]
pub struct NoteEventRouter {
    key_map: KeyMap,
    key_states: HashMap<KeyId, KeyState>,
    recent_notes: BoundedVecDeque<NoteDefinition>,
    params: InstrumentParams,
    base_ratio: f32,
    observers: Vec<Sender<RouterEvent>>,
    observer_capacity: usize,
}
impl NoteEventRouter {
    /// Creates a router over a fixed key map.
    pub fn new(key_map: KeyMap, base_ratio: f32, observer_capacity: usize) -> Self {
        Self {
            key_map,
            key_states: HashMap::default(),
            recent_notes: BoundedVecDeque::new(RECENT_NOTE_CAPACITY),
            params: InstrumentParams::default(),
            base_ratio,
            observers: Vec::default(),
            observer_capacity: observer_capacity.max(1),
        }
    }

    /// Creates a router for a new instance of `kind`.
    pub fn new_with(kind: InstrumentKind, settings: &SessionSettings) -> Self {
        Self::new(
            kind.key_map(),
            settings.base_ratio(),
            settings.notification_capacity(),
        )
    }

    /// Registers a new observer. Dropping the returned receiver unsubscribes
    /// it.
    pub fn subscribe(&mut self) -> Receiver<RouterEvent> {
        let (sender, receiver) = crossbeam_channel::bounded(self.observer_capacity);
        self.observers.push(sender);
        receiver
    }

    /// How many observers are still listening, as of the last notification.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Applies one press or release.
    pub fn apply(&mut self, is_down: bool, key: KeyId, is_spectate: bool) {
        let Some(note) = self.key_map.note(key).copied() else {
            return;
        };
        let keys = self.key_map.duplicates(key).to_vec();

        if is_down {
            self.key_states.insert(key, KeyState::Pressed);
            if is_spectate {
                self.notify(RouterEvent::Visual {
                    keys,
                    cue: VisualCue::Highlight,
                    color: KeyColor::SPECTATE_HIGHLIGHT,
                });
            } else {
                self.notify(RouterEvent::TriggerAudio {
                    key,
                    timbre: note.timbre,
                    pitch: self.pitch(&note),
                });
                self.notify(RouterEvent::Visual {
                    keys,
                    cue: VisualCue::Depress,
                    color: note.color,
                });
                self.recent_notes.push_back(note);
                self.notify(RouterEvent::NoteDown(note));
            }
        } else {
            self.key_states.insert(key, KeyState::Released);
            self.notify(RouterEvent::Visual {
                keys,
                cue: if is_spectate {
                    VisualCue::ClearHighlight
                } else {
                    VisualCue::ResetPosition
                },
                color: note.color,
            });
        }
    }

    /// Playback rate for `note` at the current octave.
    pub fn pitch(&self, note: &NoteDefinition) -> f32 {
        let semitones = note.semitone_offset + i32::from(self.params.octave) * 12;
        self.base_ratio.powf(semitones as f32 / 12.0)
    }

    /// The most recent locally played notes, oldest first.
    pub fn recent_notes(&self) -> impl Iterator<Item = &NoteDefinition> {
        self.recent_notes.iter()
    }

    #[allow(missing_docs)]
    pub fn key_state(&self, key: KeyId) -> KeyState {
        self.key_states.get(&key).copied().unwrap_or_default()
    }

    #[allow(missing_docs)]
    pub fn key_map(&self) -> &KeyMap {
        &self.key_map
    }

    fn notify(&mut self, event: RouterEvent) {
        self.observers.retain(|o| match o.try_send(event.clone()) {
            Ok(_) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("Note observer is falling behind; dropped {event:?}");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }
}
impl PlaysKeys for NoteEventRouter {
    fn note(&self, key: KeyId) -> Option<&NoteDefinition> {
        self.key_map.note(key)
    }

    fn parameters(&self) -> InstrumentParams {
        self.params
    }

    fn set_parameters(&mut self, params: InstrumentParams) {
        self.params = params.clamped();
    }

    fn note_event(&mut self, is_down: bool, key: KeyId, is_spectate: bool) {
        self.apply(is_down, key, is_spectate);
    }
}
