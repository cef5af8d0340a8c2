// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! The messages participants exchange, and how they look on the wire.
//!
//! The transport itself is somebody else's job. It must deliver each sender's
//! messages in order. [DeliveryMode::ReliableBuffered] messages are also
//! replayed to participants who arrive later.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{Announcement, DeliveryMode, EventCode, Message, MessageBody, Outbox};
}

use crate::{
    error::{JamError, Result},
    types::{InstrumentKind, InstrumentParams, KeyId, SlotIndex},
    uid::ParticipantId,
};
use crossbeam_channel::Sender;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use strum_macros::{EnumIter, FromRepr};

pub mod loopback;

/// Where outbound messages go. The transport drains the other end.
pub type Outbox = Sender<Message>;

/// Wire value identifying what a message carries.
#[derive(Clone, Copy, Debug, EnumIter, Eq, FromRepr, Hash, PartialEq, strum_macros::Display)]
#[repr(u8)]
pub enum EventCode {
    #[allow(missing_docs)]
    Release = 0,
    #[allow(missing_docs)]
    Press = 1,
    #[allow(missing_docs)]
    ParamChange = 2,
    #[allow(missing_docs)]
    Announce = 3,
}

/// How the transport should deliver a message.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeliveryMode {
    /// Fast, and a lost message is just a lost note.
    Unreliable,
    /// Guaranteed, and replayed to anyone who joins later.
    ReliableBuffered,
}

/// A participant's declaration of which instrument it plays and where it sits.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Announcement {
    #[allow(missing_docs)]
    pub instrument: InstrumentKind,
    #[allow(missing_docs)]
    pub slot: SlotIndex,
}

/// What a message carries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageBody {
    #[allow(missing_docs)]
    Press(KeyId),
    #[allow(missing_docs)]
    Release(KeyId),
    #[allow(missing_docs)]
    ParamChange(InstrumentParams),
    #[allow(missing_docs)]
    Announce(Announcement),
}
impl MessageBody {
    #[allow(missing_docs)]
    pub fn event_code(&self) -> EventCode {
        match self {
            MessageBody::Press(_) => EventCode::Press,
            MessageBody::Release(_) => EventCode::Release,
            MessageBody::ParamChange(_) => EventCode::ParamChange,
            MessageBody::Announce(_) => EventCode::Announce,
        }
    }

    #[allow(missing_docs)]
    pub fn delivery_mode(&self) -> DeliveryMode {
        match self {
            MessageBody::Press(_) | MessageBody::Release(_) => DeliveryMode::Unreliable,
            MessageBody::ParamChange(_) | MessageBody::Announce(_) => {
                DeliveryMode::ReliableBuffered
            }
        }
    }

    /// For note events, whether the key went down, and which key.
    pub fn as_note(&self) -> Option<(bool, KeyId)> {
        match self {
            MessageBody::Press(key) => Some((true, *key)),
            MessageBody::Release(key) => Some((false, *key)),
            _ => None,
        }
    }

    /// Builds a press or release.
    pub fn note(is_down: bool, key: KeyId) -> Self {
        if is_down {
            MessageBody::Press(key)
        } else {
            MessageBody::Release(key)
        }
    }
}

/// One message from one participant to all the others.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Message {
    #[allow(missing_docs)]
    pub sender: ParticipantId,
    #[allow(missing_docs)]
    pub body: MessageBody,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
struct Frame {
    event_code: u8,
    sender: ParticipantId,
    payload: serde_json::Value,
}

impl Message {
    #[allow(missing_docs)]
    pub fn new(sender: ParticipantId, body: MessageBody) -> Self {
        Self { sender, body }
    }

    #[allow(missing_docs)]
    pub fn delivery_mode(&self) -> DeliveryMode {
        self.body.delivery_mode()
    }

    /// Serializes to a JSON frame.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let payload = match &self.body {
            MessageBody::Press(key) | MessageBody::Release(key) => serde_json::to_value(key)?,
            MessageBody::ParamChange(params) => serde_json::to_value(params)?,
            MessageBody::Announce(announcement) => serde_json::to_value(announcement)?,
        };
        Ok(serde_json::to_vec(&Frame {
            event_code: self.body.event_code() as u8,
            sender: self.sender,
            payload,
        })?)
    }

    /// Parses a JSON frame. A frame that parses but whose payload doesn't
    /// match its event code is [JamError::MalformedPayload].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let frame: Frame = serde_json::from_slice(bytes)?;
        let Some(code) = EventCode::from_repr(frame.event_code) else {
            return Err(JamError::MalformedPayload(format!(
                "unknown event code {}",
                frame.event_code
            )));
        };
        let body = match code {
            EventCode::Press => MessageBody::Press(Self::payload(code, frame.payload)?),
            EventCode::Release => MessageBody::Release(Self::payload(code, frame.payload)?),
            EventCode::ParamChange => MessageBody::ParamChange(Self::payload(code, frame.payload)?),
            EventCode::Announce => MessageBody::Announce(Self::payload(code, frame.payload)?),
        };
        Ok(Self::new(frame.sender, body))
    }

    fn payload<T: DeserializeOwned>(code: EventCode, value: serde_json::Value) -> Result<T> {
        serde_json::from_value(value)
            .map_err(|e| JamError::MalformedPayload(format!("{code} payload: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn event_codes_keep_their_wire_values() {
        assert_eq!(EventCode::Release as u8, 0);
        assert_eq!(EventCode::Press as u8, 1);
        assert_eq!(EventCode::ParamChange as u8, 2);
        assert_eq!(EventCode::Announce as u8, 3);
        for code in EventCode::iter() {
            assert_eq!(EventCode::from_repr(code as u8), Some(code));
        }
        assert_eq!(EventCode::from_repr(4), None);
    }

    #[test]
    fn delivery_modes_follow_event_kind() {
        assert_eq!(
            MessageBody::Press(KeyId('a')).delivery_mode(),
            DeliveryMode::Unreliable
        );
        assert_eq!(
            MessageBody::ParamChange(InstrumentParams::default()).delivery_mode(),
            DeliveryMode::ReliableBuffered
        );
        assert_eq!(
            MessageBody::Announce(Announcement {
                instrument: InstrumentKind::QwertyPiano,
                slot: SlotIndex(0)
            })
            .delivery_mode(),
            DeliveryMode::ReliableBuffered
        );
    }

    #[test]
    fn announce_frame_decodes() {
        let message = Message::new(
            ParticipantId(7),
            MessageBody::Announce(Announcement {
                instrument: InstrumentKind::QwertyGuitar,
                slot: SlotIndex(2),
            }),
        );
        let bytes = message.encode().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"event-code\":3"), "{text}");
        assert!(text.contains("qwerty-guitar"), "{text}");
        assert_eq!(Message::decode(&bytes).unwrap(), message);
    }

    #[test]
    fn mismatched_payload_is_malformed() {
        let bytes = br#"{"event-code":1,"sender":3,"payload":{"octave":1}}"#;
        assert!(matches!(
            Message::decode(bytes),
            Err(JamError::MalformedPayload(_))
        ));

        let bytes = br#"{"event-code":9,"sender":3,"payload":"a"}"#;
        assert!(matches!(
            Message::decode(bytes),
            Err(JamError::MalformedPayload(_))
        ));

        assert!(matches!(
            Message::decode(b"not json"),
            Err(JamError::Codec(_))
        ));
    }

    #[test]
    fn press_frame_carries_the_key() {
        let bytes = br#"{"event-code":1,"sender":3,"payload":"a"}"#;
        let message = Message::decode(bytes).unwrap();
        assert_eq!(message.sender, ParticipantId(3));
        assert_eq!(message.body.as_note(), Some((true, KeyId('a'))));
    }
}
