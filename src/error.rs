//! Error Handling
//!
//! This module defines the crate's error types: the decode taxonomy returned by
//! [`crate::decode`], the handshake failures returned by
//! [`crate::VerificationRequest::verify`], and the service-level
//! [`WebhookError`] handed to webhook handlers.

use std::fmt;

/// The error returned when raw webhook input cannot be turned into a model value.
///
/// Decoding never fails because of unknown extra fields or absent optional
/// fields; the three variants below are the only ways it can go wrong.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum DecodeError {
    /// The input is not valid JSON (syntax error, truncated input, invalid UTF-8).
    #[error("Malformed JSON payload: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The input is valid JSON, but its root is not an object.
    #[error("Expected a JSON object at the payload root, found {found}")]
    WrongShape { found: JsonKind },

    /// A field is present with a value that cannot be coerced to its declared type.
    ///
    /// `path` locates the field (`entry[0].changes[0].value.messages[0].timestamp`)
    /// and `value` holds the offending raw JSON, or `null` if it could not be located.
    #[error("Type mismatch at '{path}': {source} (raw value: {value})")]
    TypeMismatch {
        path: String,
        value: serde_json::Value,
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// Returns the fieldless category of this error.
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            Self::Malformed(_) => DecodeErrorKind::Malformed,
            Self::WrongShape { .. } => DecodeErrorKind::WrongShape,
            Self::TypeMismatch { .. } => DecodeErrorKind::TypeMismatch,
        }
    }

    /// Returns the path of the offending field for [`DecodeError::TypeMismatch`].
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::TypeMismatch { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Returns the offending raw value for [`DecodeError::TypeMismatch`].
    pub fn raw_value(&self) -> Option<&serde_json::Value> {
        match self {
            Self::TypeMismatch { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// The category of a [`DecodeError`], convenient for matching and metrics labels.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub enum DecodeErrorKind {
    Malformed,
    WrongShape,
    TypeMismatch,
}

/// The type of a JSON value, as reported by [`DecodeError::WrongShape`].
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub enum JsonKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl JsonKind {
    /// Classifies a JSON value.
    pub fn of(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "null",
            Self::Bool => "a boolean",
            Self::Number => "a number",
            Self::String => "a string",
            Self::Array => "an array",
            Self::Object => "an object",
        })
    }
}

/// Why a verification handshake was refused.
#[derive(thiserror::Error, PartialEq, Eq, Clone, Debug)]
#[non_exhaustive]
pub enum HandshakeError {
    /// One of `hub.mode`, `hub.verify_token` or `hub.challenge` was not sent.
    #[error("Missing '{0}' query parameter")]
    MissingParameter(&'static str),

    /// `hub.mode` was something other than `subscribe`.
    #[error("Unsupported hub.mode '{0}', expected 'subscribe'")]
    UnsupportedMode(String),

    /// The token sent does not match the one held by the integrator.
    #[error("Invalid verification token")]
    TokenMismatch,
}

/// Why an event's `X-Hub-Signature-256` was refused.
#[derive(thiserror::Error, PartialEq, Eq, Clone, Copy, Debug)]
#[non_exhaustive]
pub enum SignatureError {
    #[error("missing X-Hub-Signature-256 header")]
    MissingHeader,

    /// The header is not `sha256=` followed by a hex digest.
    #[error("X-Hub-Signature-256 is not a sha256 hex digest")]
    InvalidHeader,

    /// The digest does not match the body. Usually a wrong app secret, or a
    /// body changed in transit.
    #[error("X-Hub-Signature-256 does not match the body")]
    Mismatch,
}

/// Errors surfaced to a webhook handler by the service layer.
///
/// None of these change the reply already chosen for the provider; they exist
/// so the integrator can see what was refused or dropped.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum WebhookError {
    /// The event body could not be decoded. The provider was still acknowledged.
    #[error("Failed to decode webhook payload: {0}")]
    Decode(#[from] DecodeError),

    /// The verification handshake was refused.
    #[error("Verification handshake refused: {0}")]
    Handshake(#[from] HandshakeError),

    /// The `X-Hub-Signature-256` header was missing or did not match the body.
    #[error("Signature verification failed: {0}")]
    Signature(#[from] SignatureError),

    /// The payload's `object` is not `whatsapp_business_account`.
    #[error("Unexpected webhook object '{0}', expected 'whatsapp_business_account'")]
    UnexpectedObject(String),

    /// The request body could not be read.
    #[error("Failed to read request body: {0}")]
    Body(String),
}
