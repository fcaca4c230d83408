//! Raw input to model values.
//!
//! Decoding goes through an intermediate [`serde_json::Value`] so the three
//! failure classes stay apart: a syntax failure is [`DecodeError::Malformed`],
//! a non-object root is [`DecodeError::WrongShape`], and anything the typed
//! pass rejects is [`DecodeError::TypeMismatch`], located by
//! `serde_path_to_error` and paired with the raw value found at that path.
//!
//! The root `object` is read before anything else. A payload for another
//! object comes back with only `object` set; its `entry` is never interpreted.

use serde::de::DeserializeOwned;
use serde_path_to_error::{Path, Segment};

use crate::{
    error::{DecodeError, JsonKind},
    payload::{WebhookPayload, WHATSAPP_BUSINESS_ACCOUNT},
    verification::VerificationRequest,
};

/// Decodes a webhook `POST` body.
///
/// Unknown fields are ignored and absent fields stay `None`; only malformed
/// JSON, a non-object root, or a present field of the wrong type fail.
///
/// When `object` is a string other than `whatsapp_business_account`, the
/// result holds only `object`, whatever shape the rest of the body has.
///
/// ```rust
/// use whatsapp_webhook_rs::{decode_payload, DecodeErrorKind};
///
/// let err = decode_payload(br#"{"object": "whatsapp_business_account", "entry": [{"id": 7}]}"#)
///     .unwrap_err();
///
/// assert_eq!(err.kind(), DecodeErrorKind::TypeMismatch);
/// assert_eq!(err.path(), Some("entry[0].id"));
/// assert_eq!(err.raw_value(), Some(&serde_json::json!(7)));
/// ```
pub fn decode_payload(bytes: &[u8]) -> Result<WebhookPayload, DecodeError> {
    let raw = parse_object(bytes)?;

    match raw.get("object").and_then(serde_json::Value::as_str) {
        Some(object) if object != WHATSAPP_BUSINESS_ACCOUNT => Ok(WebhookPayload {
            object: Some(object.to_owned()),
            entry: None,
        }),
        _ => deserialize_typed(&raw),
    }
}

/// Builds a [`VerificationRequest`] from handshake query parameters.
///
/// Reads `hub.mode`, `hub.verify_token` and `hub.challenge`; other parameters
/// are ignored. A parameter that is not sent stays `None`, one sent empty is
/// `Some("")`. If a name repeats, the first occurrence wins.
pub fn decode_verification<I, K, V>(params: I) -> VerificationRequest
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut request = VerificationRequest::default();

    for (name, value) in params {
        let slot = match name.as_ref() {
            VerificationRequest::MODE => &mut request.mode,
            VerificationRequest::VERIFY_TOKEN => &mut request.verify_token,
            VerificationRequest::CHALLENGE => &mut request.challenge,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value.into());
        }
    }

    request
}

impl WebhookPayload {
    /// Same as [`decode_payload`].
    #[inline]
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        decode_payload(bytes)
    }
}

impl std::str::FromStr for WebhookPayload {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_payload(s.as_bytes())
    }
}

impl VerificationRequest {
    /// Same as [`decode_verification`].
    #[inline]
    pub fn from_query<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        decode_verification(params)
    }
}

fn parse_object(bytes: &[u8]) -> Result<serde_json::Value, DecodeError> {
    let raw: serde_json::Value = serde_json::from_slice(bytes).map_err(DecodeError::Malformed)?;

    if !raw.is_object() {
        return Err(DecodeError::WrongShape {
            found: JsonKind::of(&raw),
        });
    }
    Ok(raw)
}

fn deserialize_typed<T: DeserializeOwned>(raw: &serde_json::Value) -> Result<T, DecodeError> {
    serde_path_to_error::deserialize(raw).map_err(|err| {
        let value = lookup(raw, err.path()).cloned().unwrap_or_default();
        DecodeError::TypeMismatch {
            path: err.path().to_string(),
            value,
            source: err.into_inner(),
        }
    })
}

/// Follows a deserialization path back into the raw document.
fn lookup<'a>(raw: &'a serde_json::Value, path: &Path) -> Option<&'a serde_json::Value> {
    path.iter().try_fold(raw, |node, segment| match segment {
        Segment::Seq { index } => node.get(*index),
        Segment::Map { key } => node.get(key.as_str()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DecodeErrorKind;
    use serde_json::json;

    #[test]
    fn truncated_input_is_malformed() {
        let err = decode_payload(br#"{"object": "whatsapp_business_account", "entry": ["#)
            .unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::Malformed);

        let err = decode_payload(b"").unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::Malformed);

        let err = decode_payload(&[0xff, 0xfe]).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::Malformed);
    }

    #[test]
    fn non_object_root_is_wrong_shape() {
        for (input, found) in [
            (&b"[]"[..], JsonKind::Array),
            (&b"\"whatsapp_business_account\""[..], JsonKind::String),
            (&b"42"[..], JsonKind::Number),
            (&b"null"[..], JsonKind::Null),
        ] {
            match decode_payload(input) {
                Err(DecodeError::WrongShape { found: got }) => assert_eq!(got, found),
                other => panic!("expected WrongShape, got {other:?}"),
            }
        }
    }

    #[test]
    fn bad_timestamp_names_its_path() {
        let input = json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "1",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messages": [
                            { "id": "ok", "timestamp": "1504902988" },
                            { "id": "bad", "timestamp": "last tuesday" }
                        ]
                    }
                }]
            }]
        });

        let err = decode_payload(&serde_json::to_vec(&input).unwrap()).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::TypeMismatch);
        assert_eq!(
            err.path(),
            Some("entry[0].changes[0].value.messages[1].timestamp")
        );
        assert_eq!(err.raw_value(), Some(&json!("last tuesday")));
        assert!(err.to_string().contains("last tuesday"));
    }

    #[test]
    fn wrong_container_type_is_a_mismatch() {
        let err = decode_payload(br#"{"object": "whatsapp_business_account", "entry": {"id": "1"}}"#)
            .unwrap_err();
        assert_eq!(err.path(), Some("entry"));
        assert_eq!(err.raw_value(), Some(&json!({"id": "1"})));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let payload = decode_payload(
            br#"{
                "object": "whatsapp_business_account",
                "brand_new_top_level": {"nested": [1, 2, 3]},
                "entry": [{
                    "id": "1",
                    "shiny": true,
                    "changes": [{
                        "field": "messages",
                        "value": {
                            "messages": [{
                                "id": "wamid.1",
                                "type": "text",
                                "text": {"body": "hello", "preview_url": false},
                                "future_field": null
                            }]
                        }
                    }]
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(payload.messages().next().unwrap().text_body(), Some("hello"));
    }

    #[test]
    fn other_objects_are_not_interpreted() {
        for body in [
            &br#"{"object": "page", "entry": {"messaging": "page-shaped"}}"#[..],
            &br#"{"object": "page", "entry": [{"id": 17, "time": "soon"}]}"#[..],
        ] {
            let payload = decode_payload(body).unwrap();
            assert_eq!(payload.object.as_deref(), Some("page"));
            assert_eq!(payload.entry, None);
            assert!(!payload.is_whatsapp_business_account());
        }

        // A non-string discriminator is still type-checked
        let err = decode_payload(br#"{"object": 3}"#).unwrap_err();
        assert_eq!(err.path(), Some("object"));
    }

    #[test]
    fn null_is_unset() {
        let payload = decode_payload(br#"{"object": null, "entry": null}"#).unwrap();
        assert_eq!(payload, WebhookPayload::default());
    }

    #[test]
    fn from_str_delegates() {
        let payload: WebhookPayload = r#"{"object": "page"}"#.parse().unwrap();
        assert_eq!(payload.object.as_deref(), Some("page"));
        assert!(!payload.is_whatsapp_business_account());
    }

    #[test]
    fn verification_from_pairs() {
        let request = decode_verification([
            ("hub.mode", "subscribe"),
            ("hub.verify_token", ""),
            ("hub.challenge", "1158201444"),
            ("hub.challenge", "ignored"),
            ("utm_source", "ignored"),
        ]);

        assert_eq!(request.mode.as_deref(), Some("subscribe"));
        assert_eq!(request.verify_token.as_deref(), Some(""));
        assert_eq!(request.challenge.as_deref(), Some("1158201444"));
    }

    #[test]
    fn verification_absent_parameters_stay_unset() {
        let request = VerificationRequest::from_query(Vec::<(String, String)>::new());
        assert_eq!(request, VerificationRequest::default());
        assert_eq!(request.verify_token, None);
    }
}
