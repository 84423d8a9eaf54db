//! For "Bring Your Own Server" (BYOS) integrations.
//!
//! [`WebhookService`] holds the request handling logic for the LINE webhook:
//!
//! ```text
//! Received → Reading → Rejected (413)
//!          → Verifying → Rejected (400)
//!                      → Parsing → Rejected (400)
//!                                → Routing → Completed (200 "OK")
//! ```
//!
//! It works with any framework using the `http` types re-exported by axum.
//! For a fully managed server, see the [`crate::server`] module.
//!
//! # Usage Example (with axum)
//!
//! ```rust,no_run
//! use axum::{routing::post, Router};
//! use line_webhook_rs::{router::ReplyBot, webhook_service::WebhookService, Client};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let bot = ReplyBot::new(Client::new("CHANNEL_ACCESS_TOKEN")?);
//! let service = WebhookService::builder()
//!     .channel_secret("CHANNEL_SECRET")
//!     .build(bot)?;
//!
//! let app = Router::new().route(
//!     "/callback",
//!     post(move |req: axum::extract::Request| async move { service.handle(req).await }),
//! );
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(()) }
//! ```

use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{
    error::{ConfigError, WebhookError},
    event::parse_payload,
    router::{dispatch, DispatchReport, Handler},
    signature::{check_signature, ChannelSecret},
};

/// Largest webhook body accepted. Larger bodies, and bodies that fail to
/// read, are answered with `413`.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// A builder for creating a [`WebhookService`].
#[derive(Debug, Default, Clone)]
#[must_use]
pub struct WebhookServiceBuilder {
    channel_secret: Option<ChannelSecret>,
}

impl WebhookServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the channel secret used to verify `X-Line-Signature`.
    pub fn channel_secret(mut self, secret: impl Into<ChannelSecret>) -> Self {
        self.channel_secret = Some(secret.into());
        self
    }

    /// Builds the service around `handler`.
    ///
    /// Fails with [`ConfigError::MissingCredentials`] when no non-empty
    /// channel secret was set: every request would be rejected otherwise.
    pub fn build<H: Handler + 'static>(self, handler: H) -> Result<WebhookService<H>, ConfigError> {
        let channel_secret = self
            .channel_secret
            .filter(|secret| !secret.0.is_empty())
            .ok_or(ConfigError::MissingCredentials("LINE_CHANNEL_SECRET"))?;

        Ok(WebhookService {
            inner: Arc::new(InnerService {
                handler,
                channel_secret,
            }),
        })
    }
}

struct InnerService<H> {
    handler: H,
    channel_secret: ChannelSecret,
}

/// The webhook request handler.
///
/// Cheap to clone: clones share the handler and secret.
pub struct WebhookService<H> {
    inner: Arc<InnerService<H>>,
}

impl<H> Clone for WebhookService<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl WebhookService<()> {
    /// Returns a new builder; the handler type is fixed by
    /// [`WebhookServiceBuilder::build`].
    pub fn builder() -> WebhookServiceBuilder {
        WebhookServiceBuilder::new()
    }
}

impl<H: Handler + 'static> WebhookService<H> {
    pub fn handler(&self) -> &H {
        &self.inner.handler
    }

    /// Verifies, parses and routes one webhook delivery.
    ///
    /// Only verification and envelope parsing can fail. Undecodable events
    /// and handler errors are logged and show up in the returned report.
    pub async fn process(
        &self,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<DispatchReport, WebhookError> {
        check_signature(&self.inner.channel_secret, headers, body)?;

        debug!(body = %String::from_utf8_lossy(body), "webhook body");
        let payload = parse_payload(body)?;
        let count = payload.events.len() + payload.malformed;

        let mut report = dispatch(&self.inner.handler, payload.events).await;
        report.malformed = payload.malformed;
        info!(
            destination = payload.destination.as_deref().unwrap_or_default(),
            events = count,
            handled = report.handled,
            ignored = report.ignored,
            failed = report.failed,
            malformed = report.malformed,
            "webhook processed"
        );
        Ok(report)
    }

    /// Handles a whole HTTP request.
    ///
    /// `GET` is a liveness probe and always answers `200 OK`; `POST` runs
    /// [`process`](Self::process); anything else is `405`. A body over
    /// [`MAX_BODY_BYTES`] is rejected with `413` before verification.
    ///
    /// The managed [`Server`](crate::server::Server) routes through here too.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Body>
    where
        B: Into<Body> + Send,
    {
        let (parts, body) = req.into_parts();
        match parts.method {
            Method::GET => health().into_response(),
            Method::POST => {
                let body = match axum::body::to_bytes(body.into(), MAX_BODY_BYTES).await {
                    Ok(body) => body,
                    Err(err) => {
                        debug!(error = %err, "failed to read webhook body");
                        let err = WebhookError::PayloadTooLarge {
                            limit: MAX_BODY_BYTES,
                        };
                        return rejection(&err).into_response();
                    }
                };
                outcome(self.process(&parts.headers, &body).await)
            }
            _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
        }
    }
}

pub(crate) fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

fn outcome(result: Result<DispatchReport, WebhookError>) -> Response<Body> {
    match result {
        Ok(_) => (StatusCode::OK, "OK").into_response(),
        Err(err) => rejection(&err).into_response(),
    }
}

fn rejection(err: &WebhookError) -> (StatusCode, Json<serde_json::Value>) {
    warn!(error = %err, "webhook rejected");
    let (status, message) = match err {
        WebhookError::InvalidSignature(_) => (StatusCode::BAD_REQUEST, "Invalid signature"),
        WebhookError::MalformedPayload(_) => (
            StatusCode::BAD_REQUEST,
            "Invalid JSON payload. Please ensure the body is a webhook envelope.",
        ),
        WebhookError::PayloadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large"),
    };
    (status, Json(json!({ "error": message })))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        error::Error,
        event::{EventContext, TextContent},
        signature::{sign, SIGNATURE_HEADER},
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SECRET: &str = "channel_secret";

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl Handler for Counter {
        async fn handle_text(&self, _ctx: EventContext, _text: TextContent) -> Result<(), Error> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn service() -> WebhookService<Counter> {
        WebhookService::builder()
            .channel_secret(SECRET)
            .build(Counter::default())
            .unwrap()
    }

    fn signed_post(body: &'static str, secret: &str) -> Request<String> {
        Request::post("http://example.com/webhook")
            .header(SIGNATURE_HEADER, sign(body.as_bytes(), secret))
            .body(body.to_owned())
            .unwrap()
    }

    #[test]
    fn build_without_secret_fails_fast() {
        assert_eq!(
            WebhookService::builder().build(Counter::default()).err(),
            Some(ConfigError::MissingCredentials("LINE_CHANNEL_SECRET"))
        );
        assert!(WebhookService::builder()
            .channel_secret("")
            .build(Counter::default())
            .is_err());
    }

    #[tokio::test]
    async fn get_is_a_health_check() {
        let response = service()
            .handle(Request::get("http://example.com/webhook").body(()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn empty_batch_is_accepted() {
        let s = service();
        let response = s.handle(signed_post(r#"{"events":[]}"#, SECRET)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(s.handler().0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn forged_and_malformed_requests_are_rejected() {
        let s = service();

        let response = s.handle(signed_post(r#"{"events":[]}"#, "wrong")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = s.handle(signed_post("{not json", SECRET)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = s.handle(signed_post(r#"{"destination":"U"}"#, SECRET)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn text_events_reach_the_handler() {
        let s = service();
        let body = r#"{"events":[
            {"type":"message","replyToken":"r1","message":{"type":"text","id":"1","text":"a"}},
            {"type":"follow","replyToken":"r2"},
            {"type":"message","replyToken":"r3","message":{"type":"text","id":"2","text":"b"}}
        ]}"#;

        let response = s.handle(signed_post(body, SECRET)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(s.handler().0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn undecodable_event_does_not_reject_the_batch() {
        let s = service();
        let body = r#"{"events":[
            {"type":"message","replyToken":"r1","message":{"type":"text","id":"1","text":"a"}},
            {"type":"message","replyToken":"r2","message":{"type":"text"}}
        ]}"#;
        let headers = signed_post(body, SECRET).headers().clone();

        let report = s.process(&headers, body.as_bytes()).await.unwrap();
        assert_eq!(report.handled, 1);
        assert_eq!(report.malformed, 1);
        assert_eq!(s.handler().0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn oversized_body_is_too_large() {
        let body = vec![b' '; MAX_BODY_BYTES + 1];
        let response = service()
            .handle(Request::post("http://example.com/webhook").body(body).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn other_methods_are_not_allowed() {
        let response = service()
            .handle(
                Request::put("http://example.com/webhook")
                    .body(String::new())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
