//! LINE Messaging API client.
//!
//! Only the two calls a webhook bot needs are covered: replying to an event
//! with its reply token, and pushing to a user id. Routing code depends on
//! the narrow [`MessagingClient`] trait, so tests can substitute a recorder.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use line_webhook_rs::{client::Client, message::OutboundMessage};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::builder()
//!     .timeout(Duration::from_secs(5))
//!     .auth("YOUR_CHANNEL_ACCESS_TOKEN")
//!     .build()?;
//!
//! client
//!     .reply("nHuyWiB7yP5Zw52FIkcQobQuGDXCTA", &["Hello!".into()])
//!     .await?;
//! # Ok(()) }
//! ```

use std::{future::Future, sync::Arc, time::Duration};

use reqwest::{Client as HttpClient, ClientBuilder as HttpClientBuilder};
use serde::Serialize;

use crate::{
    error::{Error, LineApiError, ServiceError},
    message::OutboundMessage,
};

/// Default Messaging API host.
pub const DEFAULT_BASE_URL: &str = "https://api.line.me";
/// Default bound on a single API call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default user agent for the client
const USER_AGENT: &str = "line-webhook-rs/0.1 (Rust)";

const REPLY_PATH: &str = "/v2/bot/message/reply";
const PUSH_PATH: &str = "/v2/bot/message/push";

/// The outbound capability the router needs.
///
/// Reply tokens are single-use: callers must pass the token of the event
/// being answered, once. The platform rejects reuse; nothing here checks it.
pub trait MessagingClient: Send + Sync {
    /// Sends `messages` as the reply to the event that issued `reply_token`.
    fn reply_message(
        &self,
        reply_token: &str,
        messages: Vec<OutboundMessage>,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}

/// A bearer credential for outbound calls.
#[derive(PartialEq, Clone)]
pub struct AccessToken(pub String);

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl From<&str> for AccessToken {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for AccessToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Messaging API client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<InnerClient>,
}

#[derive(Debug)]
struct InnerClient {
    http: HttpClient,
    base_url: String,
    token: AccessToken,
}

impl Client {
    /// Creates a client with the default host and timeout.
    pub fn new(token: impl Into<AccessToken>) -> Result<Self, Error> {
        Self::builder().auth(token).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Replies to an event. `messages` may hold up to five entries.
    pub async fn reply(&self, reply_token: &str, messages: &[OutboundMessage]) -> Result<(), Error> {
        self.post(
            REPLY_PATH,
            &ReplyMessageRequest {
                reply_token,
                messages,
            },
        )
        .await
    }

    /// Pushes messages to a user, group or room id at any time.
    pub async fn push(&self, to: &str, messages: &[OutboundMessage]) -> Result<(), Error> {
        self.post(PUSH_PATH, &PushMessageRequest { to, messages })
            .await
    }

    async fn post<T: Serialize>(&self, path: &'static str, body: &T) -> Result<(), Error> {
        let url = format!("{}{path}", self.inner.base_url);
        let response = self
            .inner
            .http
            .post(url)
            .bearer_auth(&self.inner.token.0)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await?;
        let kind = match serde_json::from_str::<LineApiError>(&body) {
            Ok(error) => ServiceError::api(error),
            Err(err) => ServiceError::parse(err.into(), body),
        };
        Err(kind.service(path, status).into())
    }
}

impl MessagingClient for Client {
    fn reply_message(
        &self,
        reply_token: &str,
        messages: Vec<OutboundMessage>,
    ) -> impl Future<Output = Result<(), Error>> + Send {
        async move { self.reply(reply_token, &messages).await }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyMessageRequest<'a> {
    reply_token: &'a str,
    messages: &'a [OutboundMessage],
}

#[derive(Serialize)]
struct PushMessageRequest<'a> {
    to: &'a str,
    messages: &'a [OutboundMessage],
}

/// Builder for [`Client`].
#[derive(Debug)]
#[must_use]
pub struct ClientBuilder {
    http: HttpClientBuilder,
    base_url: String,
    timeout: Duration,
    token: Option<AccessToken>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            http: HttpClientBuilder::new().user_agent(USER_AGENT),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            token: None,
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout for every API call.
    ///
    /// A call that exceeds it fails with [`Error::Timeout`].
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = duration;
        self
    }

    /// Overrides the API host, e.g. to point at a mock server.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        self.base_url = base_url;
        self
    }

    /// Sets the channel access token sent as the bearer credential.
    pub fn auth(mut self, token: impl Into<AccessToken>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Builds the client.
    ///
    /// Fails if no token was given or the HTTP client cannot be created.
    pub fn build(self) -> Result<Client, Error> {
        let token = self
            .token
            .ok_or_else(|| Error::internal("no channel access token configured".into()))?;
        let http = self.http.timeout(self.timeout).build()?;

        Ok(Client {
            inner: Arc::new(InnerClient {
                http,
                base_url: self.base_url,
                token,
            }),
        })
    }
}
