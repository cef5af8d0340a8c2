// Copyright (c) 2024 Mike Tsao. All rights reserved.

use crate::{
    error::{JamError, Result},
    types::SlotIndex,
    uid::ParticipantId,
};

/// Seats in a fixed-capacity session. Each slot holds at most one
/// participant, and each participant holds at most one slot.
#[derive(Debug)]
pub struct SlotTable {
    occupants: Vec<Option<ParticipantId>>,
}
impl SlotTable {
    /// Creates an empty table with `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            occupants: vec![None; capacity],
        }
    }

    #[allow(missing_docs)]
    pub fn capacity(&self) -> usize {
        self.occupants.len()
    }

    /// How many slots are taken.
    pub fn occupied_count(&self) -> usize {
        self.occupants.iter().filter(|o| o.is_some()).count()
    }

    /// The slot `id` holds, if any.
    pub fn slot_of(&self, id: ParticipantId) -> Option<SlotIndex> {
        self.occupants
            .iter()
            .position(|o| *o == Some(id))
            .map(SlotIndex)
    }

    /// Who sits in `slot`.
    pub fn occupant(&self, slot: SlotIndex) -> Option<ParticipantId> {
        self.occupants.get(slot.0).copied().flatten()
    }

    /// Seats `id` in the lowest free slot. A participant who already has a
    /// slot keeps it.
    pub fn assign_lowest(&mut self, id: ParticipantId) -> Result<SlotIndex> {
        if let Some(slot) = self.slot_of(id) {
            return Ok(slot);
        }
        let index = self
            .occupants
            .iter()
            .position(|o| o.is_none())
            .ok_or(JamError::SessionFull)?;
        self.occupants[index] = Some(id);
        Ok(SlotIndex(index))
    }

    /// Seats `id` in a specific slot, as another participant announced it.
    pub fn claim(&mut self, slot: SlotIndex, id: ParticipantId) -> Result<()> {
        match self.occupants.get(slot.0) {
            None => Err(JamError::InvalidSlot(slot)),
            Some(Some(occupant)) if *occupant != id => Err(JamError::InvalidSlot(slot)),
            Some(_) => {
                if let Some(previous) = self.slot_of(id) {
                    self.occupants[previous.0] = None;
                }
                self.occupants[slot.0] = Some(id);
                Ok(())
            }
        }
    }

    /// Frees whatever slot `id` holds.
    pub fn release(&mut self, id: ParticipantId) -> Option<SlotIndex> {
        let slot = self.slot_of(id)?;
        self.occupants[slot.0] = None;
        Some(slot)
    }
}
