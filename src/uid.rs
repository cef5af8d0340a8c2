// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Participant identities.

use delegate::delegate;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::{hash::Hash, marker::PhantomData, sync::atomic::AtomicUsize};

/// Something that can serve as a unique identifier.
pub trait IsUid: Eq + Hash + Clone + Copy + From<usize> {
    #[allow(missing_docs)]
    fn as_usize(&self) -> usize;
}

/// A [ParticipantId] is the network identity of one participant in a
/// session. It is stable for the lifetime of that participant's connection.
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
#[display(fmt = "#{}", _0)]
pub struct ParticipantId(pub usize);
impl IsUid for ParticipantId {
    fn as_usize(&self) -> usize {
        self.0
    }
}
impl From<usize> for ParticipantId {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

/// Generates unique ids.
#[derive(Debug, Serialize, Deserialize)]
pub struct UidFactory<U: IsUid> {
    pub(crate) next_uid_value: AtomicUsize,
    #[serde(skip)]
    pub(crate) _phantom: PhantomData<U>,
}
impl<U: IsUid> UidFactory<U> {
    /// Creates a new UidFactory starting with the given value.
    pub fn new(first_uid: usize) -> Self {
        Self {
            next_uid_value: AtomicUsize::new(first_uid),
            _phantom: Default::default(),
        }
    }

    /// Generates the next unique id.
    pub fn mint_next(&self) -> U {
        let uid_value = self
            .next_uid_value
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        U::from(uid_value)
    }
}

/// Hands out [ParticipantId]s to connections. The room transport owns one of
/// these; ids start at 1, as player ids do on most hosted transports.
#[derive(Debug, Serialize, Deserialize)]
pub struct ParticipantIdFactory(UidFactory<ParticipantId>);
impl Default for ParticipantIdFactory {
    fn default() -> Self {
        Self(UidFactory::<ParticipantId>::new(1))
    }
}
impl ParticipantIdFactory {
    delegate! {
        to self.0 {
            pub fn mint_next(&self) -> ParticipantId;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_mints_unique_ids() {
        let factory = ParticipantIdFactory::default();
        let a = factory.mint_next();
        let b = factory.mint_next();
        assert_eq!(a, ParticipantId(1));
        assert_ne!(a, b, "mint_next() should never repeat itself");
        assert_eq!(b.as_usize(), 2);
        assert_eq!(format!("{b}"), "#2");
    }
}
