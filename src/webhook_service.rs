//! For "Bring Your Own Server" (BYOS) integrations.
//!
//! This module packages the reply contract Meta expects from a webhook
//! endpoint around the decoder, so it can be mounted into any web server that
//! speaks `http` types (`axum`, `hyper`, ...). It does not bind sockets.
//!
//! # Reply contract
//!
//! | Request | Reply |
//! |---|---|
//! | `GET`, valid handshake | `200`, body = `hub.challenge` |
//! | `GET`, anything else | `403` |
//! | `POST`, bad `X-Hub-Signature-256` (when an app secret is set) | `401` |
//! | `POST`, body fails to decode | `200 EVENT_RECEIVED`, error reported to the handler |
//! | `POST`, `object` is not `whatsapp_business_account` | `404` |
//! | `POST`, accepted | `200 EVENT_RECEIVED`, payload handed to the handler |
//!
//! A non-2xx reply makes Meta redeliver with backoff, so a body that cannot be
//! decoded is still acknowledged: redelivering it would not make it decode.
//!
//! # Usage Example (with axum)
//!
//! ```rust,no_run
//! use whatsapp_webhook_rs::{
//!     webhook_service::{Handler, WebhookServiceBuilder},
//!     WebhookPayload,
//! };
//!
//! struct Echo;
//!
//! impl Handler for Echo {
//!     async fn handle(&self, payload: WebhookPayload) {
//!         for message in payload.messages() {
//!             println!("{:?} says {:?}", message.from, message.text_body());
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     // Reads WHATSAPP_VERIFY_TOKEN and WHATSAPP_APP_SECRET
//!     let service = WebhookServiceBuilder::from_env().build(Echo);
//!
//!     let app = service.router("/webhook");
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

use axum::{
    body::Body,
    extract::{Query, Request},
    http::{HeaderMap, Method, Response, StatusCode},
    response::IntoResponse,
    routing::any,
    Router,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::{borrow::Cow, fmt, future::Future, sync::Arc};
use tracing::{debug, info};

use crate::{
    decode::{decode_payload, decode_verification},
    error::{DecodeError, HandshakeError, SignatureError, WebhookError},
    message::{Message, StatusUpdate},
    payload::{Change, Entry, WebhookPayload},
    verification::VerificationRequest,
};

/// Body of every acknowledged event.
pub const EVENT_RECEIVED: &str = "EVENT_RECEIVED";

/// Environment variable read by [`WebhookServiceBuilder::from_env`] for the handshake token.
pub const VERIFY_TOKEN_ENV: &str = "WHATSAPP_VERIFY_TOKEN";

/// Environment variable read by [`WebhookServiceBuilder::from_env`] for the app secret.
pub const APP_SECRET_ENV: &str = "WHATSAPP_APP_SECRET";

/// Largest event body read by default.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// A status code and body, ready to be turned into a response.
pub type Reply = (StatusCode, Cow<'static, str>);

/// Receives accepted payloads and the errors the service swallowed.
///
/// Every method has a default. Override [`Handler::handle`] to see whole
/// payloads, or the narrower hooks to get changes already routed by variant.
pub trait Handler: Send + Sync {
    /// Called once per accepted payload, on a spawned task.
    ///
    /// The default walks the changes in delivery order and calls
    /// [`Handler::handle_change`] for each.
    fn handle(&self, payload: WebhookPayload) -> impl Future<Output = ()> + Send {
        async move {
            for (entry, change) in payload.changes() {
                self.handle_change(entry, change).await;
            }
        }
    }

    /// Routes one change by the variants it carries.
    ///
    /// Messages are delivered before statuses if a change carries both.
    /// Changes with no known variant are ignored.
    fn handle_change<'a>(
        &'a self,
        entry: &'a Entry,
        change: &'a Change,
    ) -> impl Future<Output = ()> + Send + 'a {
        async move {
            let variants = change.variants();
            if let Some(messages) = variants.messages {
                self.handle_messages(entry, messages).await;
            }
            if let Some(statuses) = variants.statuses {
                self.handle_statuses(entry, statuses).await;
            }
        }
    }

    /// Handle inbound messages
    fn handle_messages<'a>(
        &'a self,
        _entry: &'a Entry,
        _messages: &'a [Message],
    ) -> impl Future<Output = ()> + Send + 'a {
        async {}
    }

    /// Handle delivery/read receipts
    fn handle_statuses<'a>(
        &'a self,
        _entry: &'a Entry,
        _statuses: &'a [StatusUpdate],
    ) -> impl Future<Output = ()> + Send + 'a {
        async {}
    }

    /// Called for requests that were refused or bodies that were dropped.
    ///
    /// The reply has already been chosen; this is for diagnostics only. The
    /// default logs the error at `WARN`.
    fn handle_error(&self, error: WebhookError) -> impl Future<Output = ()> + Send + '_ {
        async move {
            tracing::warn!(%error, "webhook request not processed");
        }
    }
}

#[derive(Clone)]
struct Secret(String);

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// A builder for creating a [`WebhookService`].
///
/// It configures request checks only; endpoint, TLS and shutdown belong to
/// the server you mount the service into.
#[derive(Debug, Clone)]
#[must_use]
pub struct WebhookServiceBuilder {
    app_secret: Option<Secret>,
    verify_token: Option<Secret>,
    body_limit: usize,
}

impl Default for WebhookServiceBuilder {
    fn default() -> Self {
        Self {
            app_secret: None,
            verify_token: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl WebhookServiceBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with its secrets read from [`VERIFY_TOKEN_ENV`] and
    /// [`APP_SECRET_ENV`].
    ///
    /// Unset or empty variables leave the corresponding check unconfigured.
    pub fn from_env() -> Self {
        let mut builder = Self::new();
        if let Some(token) = env_var(VERIFY_TOKEN_ENV) {
            builder = builder.verify_token(token);
        }
        if let Some(secret) = env_var(APP_SECRET_ENV) {
            builder = builder.verify_payload(secret);
        }
        builder
    }

    /// Verifies the `X-Hub-Signature-256` header of every event against an
    /// HMAC-SHA256 of the body keyed with your app secret.
    pub fn verify_payload(mut self, app_secret: impl Into<String>) -> Self {
        self.app_secret = Some(Secret(app_secret.into()));
        self
    }

    /// Sets the token expected in the verification handshake.
    ///
    /// Without it, `GET` requests are answered with `405`.
    pub fn verify_token(mut self, verify_token: impl Into<String>) -> Self {
        self.verify_token = Some(Secret(verify_token.into()));
        self
    }

    /// Caps the size of event bodies. Defaults to [`DEFAULT_BODY_LIMIT`].
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Builds the service around your [`Handler`].
    pub fn build<H: Handler + 'static>(self, handler: H) -> WebhookService<H> {
        WebhookService {
            inner: Arc::new(Inner {
                handler,
                app_secret: self.app_secret,
                verify_token: self.verify_token,
                body_limit: self.body_limit,
            }),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

struct Inner<H> {
    handler: H,
    app_secret: Option<Secret>,
    verify_token: Option<Secret>,
    body_limit: usize,
}

/// Answers webhook requests per the reply contract in the [module docs](self).
///
/// Cheap to clone; clones share the handler.
pub struct WebhookService<H> {
    inner: Arc<Inner<H>>,
}

impl<H> Clone for WebhookService<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl WebhookService<()> {
    /// Returns a new builder to create a `WebhookService`.
    pub fn builder() -> WebhookServiceBuilder {
        WebhookServiceBuilder::new()
    }
}

impl<H: Handler + 'static> WebhookService<H> {
    /// Handles one request: `GET` is the handshake, `POST` an event, anything
    /// else gets `405`.
    ///
    /// Must be called from within a tokio runtime; handler calls are spawned.
    pub async fn handle<B>(&self, request: Request<B>) -> Response<Body>
    where
        B: Into<Body> + Send,
    {
        let (parts, body) = request.into_parts();

        match parts.method {
            Method::GET => {
                let params = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
                    .map(|Query(params)| params)
                    .unwrap_or_default();
                self.verify(&decode_verification(params)).into_response()
            }
            Method::POST => match axum::body::to_bytes(body.into(), self.inner.body_limit).await {
                Ok(bytes) => self.receive(&parts.headers, &bytes).into_response(),
                Err(err) => {
                    self.report(WebhookError::Body(err.to_string()));
                    (StatusCode::BAD_REQUEST, "Failed to read request body").into_response()
                }
            },
            _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
        }
    }

    /// Returns an axum router serving this service on `path`.
    pub fn router(&self, path: &str) -> Router {
        let service = self.clone();
        Router::new().route(
            path,
            any(move |request: Request| {
                let service = service.clone();
                async move { service.handle(request).await }
            }),
        )
    }

    fn verify(&self, request: &VerificationRequest) -> Reply {
        let expected = self.inner.verify_token.as_ref().map(|Secret(token)| token.as_str());
        let outcome = expected.map(|token| request.verify(token));

        match &outcome {
            Some(Ok(_)) => info!("webhook verification handshake accepted"),
            Some(Err(err)) => self.report(err.clone().into()),
            None => debug!("handshake received without a configured verify token"),
        }

        handshake_reply(outcome)
    }

    fn receive(&self, headers: &HeaderMap, body: &[u8]) -> Reply {
        if let Some(secret) = &self.inner.app_secret {
            if let Err(err) = check_signature(secret, headers, body) {
                self.report(err.into());
                return (
                    StatusCode::UNAUTHORIZED,
                    "Signature verification failed".into(),
                );
            }
        }

        let decoded = decode_payload(body);
        let reply = event_reply(&decoded);

        match decoded {
            Ok(payload) if payload.is_whatsapp_business_account() => {
                debug!(entries = payload.entries().len(), "webhook event accepted");
                let inner = self.inner.clone();
                tokio::spawn(async move { inner.handler.handle(payload).await });
            }
            Ok(payload) => {
                self.report(WebhookError::UnexpectedObject(
                    payload.object.unwrap_or_default(),
                ));
            }
            Err(err) => self.report(err.into()),
        }

        reply
    }

    fn report(&self, error: WebhookError) {
        let inner = self.inner.clone();
        tokio::spawn(async move { inner.handler.handle_error(error).await });
    }
}

/// The reply owed to a handshake, given the token configured by the integrator.
///
/// `200` with the challenge when valid, `403` when not, `405` when no token
/// is configured.
pub fn verification_reply(request: &VerificationRequest, expected_token: Option<&str>) -> Reply {
    handshake_reply(expected_token.map(|token| request.verify(token)))
}

fn handshake_reply(outcome: Option<Result<&str, HandshakeError>>) -> Reply {
    match outcome {
        None => no_verify_token(),
        Some(Ok(challenge)) => (StatusCode::OK, challenge.to_owned().into()),
        Some(Err(_)) => forbidden(),
    }
}

/// The reply owed to an event body once it has been decoded.
///
/// Decode failures are still acknowledged with `200 EVENT_RECEIVED`; payloads
/// for another `object` get `404` without their entries being looked at.
pub fn event_reply(decoded: &Result<WebhookPayload, DecodeError>) -> Reply {
    match decoded {
        Ok(payload) if !payload.is_whatsapp_business_account() => {
            (StatusCode::NOT_FOUND, "Unsupported webhook object".into())
        }
        _ => (StatusCode::OK, EVENT_RECEIVED.into()),
    }
}

#[inline]
fn forbidden() -> Reply {
    (StatusCode::FORBIDDEN, "Invalid verification token".into())
}

#[inline]
fn no_verify_token() -> Reply {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        "GET method not supported without a verify_token configured.".into(),
    )
}

/// Checks `X-Hub-Signature-256: sha256=<hex>` against an HMAC-SHA256 of the
/// raw body keyed with the app secret.
fn check_signature(secret: &Secret, headers: &HeaderMap, body: &[u8]) -> Result<(), SignatureError> {
    let header = headers
        .get(SIGNATURE_HEADER)
        .ok_or(SignatureError::MissingHeader)?;
    let claimed = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("sha256="))
        .and_then(|digest| hex::decode(digest).ok())
        .ok_or(SignatureError::InvalidHeader)?;

    // HMAC takes keys of any length
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.0.as_bytes())
        .map_err(|_| SignatureError::Mismatch)?;
    mac.update(body);

    // Constant-time comparison
    mac.verify_slice(&claimed)
        .map_err(|_| SignatureError::Mismatch)
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::http::{HeaderValue, Request as HttpRequest};

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn handshake_replies() {
        let good = VerificationRequest::new("subscribe", "T1", "C1");
        let bad = VerificationRequest::new("subscribe", "WRONG", "C1");

        assert_eq!(
            verification_reply(&good, Some("T1")),
            (StatusCode::OK, Cow::Borrowed("C1"))
        );
        assert_eq!(verification_reply(&bad, Some("T1")).0, StatusCode::FORBIDDEN);
        assert_eq!(
            verification_reply(&good, None).0,
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[test]
    fn event_replies() {
        let accepted = decode_payload(br#"{"object": "whatsapp_business_account"}"#);
        let foreign = decode_payload(br#"{"object": "some_other_kind", "entry": 12}"#);
        let foreign_ok = decode_payload(br#"{"object": "some_other_kind"}"#);
        let malformed = decode_payload(br#"{"object": "whatsapp_busi"#);

        assert_eq!(
            event_reply(&accepted),
            (StatusCode::OK, Cow::Borrowed(EVENT_RECEIVED))
        );
        // Another object's `entry` is never looked at, whatever its shape
        assert_eq!(event_reply(&foreign).0, StatusCode::NOT_FOUND);
        assert_eq!(event_reply(&foreign_ok).0, StatusCode::NOT_FOUND);
        assert_eq!(
            event_reply(&malformed),
            (StatusCode::OK, Cow::Borrowed(EVENT_RECEIVED))
        );
    }

    #[test]
    fn signature_checks() {
        let secret = Secret("a1b2c3d4e5f6".to_owned());
        let body = br#"{"object":"whatsapp_business_account"}"#;
        fn with(value: &str) -> HeaderMap {
            let mut headers = HeaderMap::new();
            headers.insert(SIGNATURE_HEADER, HeaderValue::from_str(value).unwrap());
            headers
        }

        assert_eq!(
            check_signature(&secret, &HeaderMap::new(), body),
            Err(SignatureError::MissingHeader)
        );

        let signed = with(&sign("a1b2c3d4e5f6", body));
        assert_eq!(check_signature(&secret, &signed, body), Ok(()));
        assert_eq!(
            check_signature(&secret, &signed, b"{}"),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(
            check_signature(&secret, &with(&sign("another secret", body)), body),
            Err(SignatureError::Mismatch)
        );

        // Bare digest, wrong algorithm, not hex
        let digest = sign("a1b2c3d4e5f6", body).replace("sha256=", "");
        for header in [digest.clone(), format!("sha1={digest}"), "sha256=zz".to_owned()] {
            assert_eq!(
                check_signature(&secret, &with(&header), body),
                Err(SignatureError::InvalidHeader)
            );
        }
    }

    #[test]
    fn secrets_are_not_debug_printed() {
        let builder = WebhookServiceBuilder::new()
            .verify_token("verify_token")
            .verify_payload("app_secret");
        let printed = format!("{builder:?}");

        assert!(!printed.contains("verify_token\""));
        assert!(!printed.contains("app_secret\""));
        assert!(printed.contains("Secret(***)"));
    }

    #[tokio::test]
    async fn unsupported_method() {
        struct H;
        impl Handler for H {}

        let service = WebhookService::builder().verify_token("T1").build(H);
        let request = HttpRequest::builder()
            .method(Method::PUT)
            .uri("http://example.com/webhook")
            .body(Body::empty())
            .unwrap();

        assert_eq!(
            service.handle(request).await.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }
}
