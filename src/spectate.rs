// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Spectating.

use crate::uid::ParticipantId;

/// Whom the local instrument mirrors, if anyone. Mirrored events are
/// visual-only.
#[derive(Debug, Default)]
pub struct SpectateAddressResolver {
    target: Option<ParticipantId>,
}
impl SpectateAddressResolver {
    /// Starts or stops mirroring. Takes effect with the next inbound event and
    /// leaves any visuals already applied alone.
    pub fn set_target(&mut self, target: Option<ParticipantId>) {
        self.target = target;
    }

    #[allow(missing_docs)]
    pub fn target(&self) -> Option<ParticipantId> {
        self.target
    }

    /// Whether events from `sender` should be mirrored.
    pub fn resolves(&self, sender: ParticipantId) -> bool {
        self.target == Some(sender)
    }

    /// Stops mirroring `departed` if it was the target. Returns true if the
    /// target changed.
    pub fn forget(&mut self, departed: ParticipantId) -> bool {
        if self.resolves(departed) {
            self.target = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_only_the_target() {
        let mut s = SpectateAddressResolver::default();
        assert!(!s.resolves(ParticipantId(2)));
        s.set_target(Some(ParticipantId(2)));
        assert!(s.resolves(ParticipantId(2)));
        assert!(!s.resolves(ParticipantId(3)));
        s.set_target(None);
        assert!(!s.resolves(ParticipantId(2)));
    }

    #[test]
    fn forget_clears_only_a_matching_target() {
        let mut s = SpectateAddressResolver::default();
        s.set_target(Some(ParticipantId(2)));
        assert!(!s.forget(ParticipantId(3)));
        assert_eq!(s.target(), Some(ParticipantId(2)));
        assert!(s.forget(ParticipantId(2)));
        assert_eq!(s.target(), None);
    }
}
