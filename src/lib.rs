#![deny(clippy::future_not_send)]
#![deny(clippy::large_enum_variant)]

//! # whatsapp_webhook_rs
//!
//! Typed structures for the WhatsApp Business Platform webhook: the `GET`
//! verification handshake and the `POST` event payload (entries, changes,
//! inbound messages, delivery receipts and media references).
//!
//! The crate turns raw webhook input into typed values and nothing more. It
//! does not send messages, fetch media or retry deliveries.
//!
//! ## Decoding contract
//!
//! - Unknown fields are ignored, absent fields decode to `None`. The provider
//!   grows its schema independently and older integrations keep working.
//! - Failures are limited to [`DecodeError::Malformed`] (not JSON),
//!   [`DecodeError::WrongShape`] (root is not an object) and
//!   [`DecodeError::TypeMismatch`] (a present field has the wrong type; the
//!   error names the field path and carries the raw value).
//! - Decoding is pure: no I/O, no logging, no shared state. Call it from as
//!   many tasks as you like.
//!
//! ## Routing an event
//!
//! ```rust
//! use whatsapp_webhook_rs::{decode_payload, MessageKind};
//!
//! let body = br#"{
//!   "object": "whatsapp_business_account",
//!   "entry": [{
//!     "id": "102290129340398",
//!     "changes": [{
//!       "field": "messages",
//!       "value": {
//!         "messaging_product": "whatsapp",
//!         "messages": [{
//!           "from": "16315551181",
//!           "id": "wamid.ABGGFlA5Fpa",
//!           "timestamp": "1504902988",
//!           "type": "text",
//!           "text": { "body": "this is a text message" }
//!         }]
//!       }
//!     }]
//!   }]
//! }"#;
//!
//! let payload = decode_payload(body)?;
//! assert!(payload.is_whatsapp_business_account());
//!
//! for (_entry, change) in payload.changes() {
//!     let variants = change.variants();
//!     for message in variants.messages.unwrap_or_default() {
//!         assert_eq!(message.kind, Some(MessageKind::Text));
//!         assert_eq!(message.text_body(), Some("this is a text message"));
//!     }
//!     assert!(variants.statuses.is_none());
//! }
//! # Ok::<(), whatsapp_webhook_rs::DecodeError>(())
//! ```
//!
//! ## Verifying the handshake
//!
//! ```rust
//! use whatsapp_webhook_rs::{decode_verification, error::HandshakeError};
//!
//! let request = decode_verification([
//!     ("hub.mode", "subscribe"),
//!     ("hub.verify_token", "T1"),
//!     ("hub.challenge", "C1"),
//! ]);
//!
//! assert_eq!(request.verify("T1"), Ok("C1"));
//! assert_eq!(request.verify("WRONG"), Err(HandshakeError::TokenMismatch));
//! ```
//!
//! With the `byos` feature (on by default) the [`webhook_service`] module wraps
//! both flows into an `http`/`axum` compatible service that answers the
//! provider the way it expects.

#[macro_use]
mod macros;
mod de;

pub mod decode;
pub mod error;
pub mod message;
pub mod payload;
pub mod verification;
#[cfg(feature = "byos")]
pub mod webhook_service;

pub use decode::{decode_payload, decode_verification};
pub use error::{DecodeError, DecodeErrorKind, HandshakeError, JsonKind, SignatureError};
pub use message::{
    Content, ContentMismatch, Coordinate, MediaReference, Message, MessageKind, StatusKind,
    StatusUpdate,
};
pub use payload::{
    Change, Entry, Value, VariantKind, Variants, WebhookPayload, WHATSAPP_BUSINESS_ACCOUNT,
};
pub use verification::VerificationRequest;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A point in time as sent by the webhook.
///
/// Meta encodes these as UNIX seconds, usually inside a JSON string
/// (`"1603069091"`), sometimes as a bare number. Both decode; anything
/// else is a type mismatch. A decoded timestamp re-encodes in the form it was
/// received in; one built with [`Timestamp::from_seconds`] encodes as a string.
///
/// Equality, ordering and hashing only look at the instant.
#[derive(Clone, Debug)]
pub struct Timestamp {
    pub(crate) inner: i64,
    form: de::WireForm,
}

impl Timestamp {
    /// Creates a timestamp from UNIX seconds.
    #[inline]
    pub fn from_seconds(seconds: i64) -> Self {
        Self {
            inner: seconds,
            form: de::WireForm::Text(seconds.to_string().into()),
        }
    }

    /// Returns the raw timestamp in seconds since the UNIX epoch.
    #[inline]
    pub fn seconds(&self) -> i64 {
        self.inner
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.inner.cmp(&other.inner)
    }
}

impl std::hash::Hash for Timestamp {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        de::serialize_lenient(&self.inner, &self.form, serializer)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (inner, form) = de::deserialize_lenient::<i64, D>(deserializer)?;
        Ok(Self { inner, form })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn timestamp_accepts_string_and_number() {
        let from_str: Timestamp = serde_json::from_str("\"1731617831\"").unwrap();
        let from_num: Timestamp = serde_json::from_str("1731617831").unwrap();

        assert_eq!(from_str, from_num);
        assert_eq!(from_str.seconds(), 1731617831);
    }

    #[test]
    fn timestamp_reencodes_as_received() {
        let ts = Timestamp::from_seconds(1603069091);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"1603069091\"");

        for raw in ["\"1603069091\"", "1603069091", "\"0001603069091\""] {
            let ts: Timestamp = serde_json::from_str(raw).unwrap();
            assert_eq!(ts.seconds(), 1603069091);
            assert_eq!(serde_json::to_string(&ts).unwrap(), raw);
        }
    }

    #[test]
    fn timestamp_rejects_non_numeric() {
        assert!(serde_json::from_str::<Timestamp>("\"yesterday\"").is_err());
        assert!(serde_json::from_str::<Timestamp>("1.5").is_err());
        assert!(serde_json::from_str::<Timestamp>("true").is_err());
    }
}
