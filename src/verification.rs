//! The `GET` verification handshake.
//!
//! When a webhook URL is registered, Meta calls it with
//! `?hub.mode=subscribe&hub.verify_token=<yours>&hub.challenge=<random>` and
//! expects the challenge echoed back with `200 OK` if the token is the one you
//! configured, and `403 Forbidden` otherwise.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::error::HandshakeError;

/// Handshake query parameters.
///
/// Each field is `None` when its parameter was not sent and `Some("")` when it
/// was sent empty; the two are different trust decisions for the caller.
///
/// Deserializes straight from a query string, e.g. with axum's `Query`
/// extractor, using the `hub.*` names.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct VerificationRequest {
    /// Expected to be `subscribe`.
    #[serde(rename = "hub.mode", skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// The secret the integrator set when registering the webhook.
    #[serde(rename = "hub.verify_token", skip_serializing_if = "Option::is_none")]
    pub verify_token: Option<String>,

    /// An opaque value to echo back.
    #[serde(rename = "hub.challenge", skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
}

impl VerificationRequest {
    pub const MODE: &'static str = "hub.mode";
    pub const VERIFY_TOKEN: &'static str = "hub.verify_token";
    pub const CHALLENGE: &'static str = "hub.challenge";

    /// The only `hub.mode` a handshake accepts.
    pub const SUBSCRIBE: &'static str = "subscribe";

    /// Creates a request with all three parameters present.
    pub fn new(
        mode: impl Into<String>,
        verify_token: impl Into<String>,
        challenge: impl Into<String>,
    ) -> Self {
        Self {
            mode: Some(mode.into()),
            verify_token: Some(verify_token.into()),
            challenge: Some(challenge.into()),
        }
    }

    /// Whether all three parameters were sent.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.mode.is_some() && self.verify_token.is_some() && self.challenge.is_some()
    }

    /// Checks the handshake against the token held by the integrator and
    /// returns the challenge to echo back.
    ///
    /// The handshake is valid only when all three parameters are present,
    /// `hub.mode` is `subscribe`, and `hub.verify_token` equals `expected_token`.
    /// Tokens are compared in constant time. An empty `expected_token` never
    /// matches, so an unset secret cannot be satisfied by an empty parameter.
    pub fn verify(&self, expected_token: &str) -> Result<&str, HandshakeError> {
        let mode = self
            .mode
            .as_deref()
            .ok_or(HandshakeError::MissingParameter(Self::MODE))?;
        let token = self
            .verify_token
            .as_deref()
            .ok_or(HandshakeError::MissingParameter(Self::VERIFY_TOKEN))?;
        let challenge = self
            .challenge
            .as_deref()
            .ok_or(HandshakeError::MissingParameter(Self::CHALLENGE))?;

        if mode != Self::SUBSCRIBE {
            return Err(HandshakeError::UnsupportedMode(mode.to_owned()));
        }

        let matches: bool = token.as_bytes().ct_eq(expected_token.as_bytes()).into();
        if expected_token.is_empty() || !matches {
            return Err(HandshakeError::TokenMismatch);
        }

        Ok(challenge)
    }
}
