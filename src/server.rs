//! LINE webhook server implementation
//!
//! A high-level [`Server`] that handles networking, routing and lifecycle.
//! Requests are answered by a [`WebhookService`]; for embedding the webhook
//! into an existing application, see the [`crate::webhook_service`] module.
//!
//! Routes:
//! - `GET /`: liveness probe, `200 OK`.
//! - `GET <path>`: liveness probe, `200 OK`.
//! - `POST <path>`: the webhook.
//!
//! `<path>` is the canonical webhook path plus any aliases. Webhook requests
//! go through [`WebhookService::handle`], so status codes and the body
//! limit match a BYOS setup.
//!
//! # Example
//! ```rust,no_run
//! use line_webhook_rs::{router::ReplyBot, Client, Server, WebhookService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bot = ReplyBot::new(Client::new("ACCESS_TOKEN")?);
//! let service = WebhookService::builder()
//!     .channel_secret("CHANNEL_SECRET")
//!     .build(bot)?;
//!
//! Server::builder()
//!     .endpoint("127.0.0.1:8080".parse()?)
//!     .route("/callback")
//!     .shutdown(async { tokio::signal::ctrl_c().await.ok(); })
//!     .build()
//!     .serve(service)
//!     .await?;
//! # Ok(()) }
//! ```

use std::{future::Future, net::SocketAddr, pin::Pin};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::Response,
    routing::{get, MethodRouter},
    Router,
};
use tokio::net::TcpListener;
use tracing::info;

use crate::{
    config::{normalize_path, Config, DEFAULT_LISTEN_ADDR, DEFAULT_WEBHOOK_PATH},
    error::Error,
    router::Handler,
    webhook_service::{health, WebhookService},
};

/// LINE webhook server
///
/// Create using [`Server::builder()`] or [`Server::new()`].
#[derive(Default)]
pub struct Server {
    pub(crate) config: ServerBuilder,
}

impl Server {
    /// Create a new server with default settings
    pub fn new() -> Self {
        ServerBuilder::new().build()
    }

    /// Create a server builder for custom configuration
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// The axum router serving `service`, without binding a socket.
    pub fn router<H: Handler + 'static>(&self, service: WebhookService<H>) -> Router {
        let mut paths = vec![self.config.route_path.clone()];
        for alias in &self.config.aliases {
            if !paths.contains(alias) {
                paths.push(alias.clone());
            }
        }

        let mut router = Router::new();
        if !paths.iter().any(|path| path == "/") {
            router = router.route("/", get(liveness));
        }
        for path in &paths {
            router = router.route(path, webhook_routes());
        }
        router.with_state(service)
    }

    /// Binds the endpoint and serves until the shutdown future resolves.
    pub async fn serve<H: Handler + 'static>(self, service: WebhookService<H>) -> Result<(), Error> {
        let app = self.router(service);
        let listener = TcpListener::bind(&self.config.endpoint)
            .await
            .map_err(|err| Error::Network(err.into()))?;

        info!(
            endpoint = %self.config.endpoint,
            path = %self.config.route_path,
            aliases = ?self.config.aliases,
            "webhook server listening"
        );

        let served = if let Some(shutdown) = self.config.shutdown {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
        } else {
            axum::serve(listener, app).await
        };

        info!("webhook server stopped");
        served.map_err(|err| Error::Network(err.into()))
    }
}

fn webhook_routes<H: Handler + 'static>() -> MethodRouter<WebhookService<H>> {
    get(liveness).post(handle_webhook::<H>)
}

async fn liveness() -> (StatusCode, &'static str) {
    health()
}

async fn handle_webhook<H: Handler + 'static>(
    State(service): State<WebhookService<H>>,
    request: Request,
) -> Response {
    service.handle(request).await
}

/// Builder for creating a [`Server`]
///
/// Customize endpoint, route, aliases, and shutdown signal.
#[must_use]
pub struct ServerBuilder {
    pub(crate) endpoint: SocketAddr,
    pub(crate) route_path: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) shutdown: Option<Pin<Box<dyn Future<Output = ()> + Send + 'static>>>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LISTEN_ADDR,
            route_path: DEFAULT_WEBHOOK_PATH.to_owned(),
            aliases: Vec::new(),
            shutdown: None,
        }
    }
}

impl ServerBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder preloaded with the listen address and paths of `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .endpoint(config.listen_addr)
            .route(&config.webhook_path)
            .aliases(config.path_aliases.iter().cloned())
    }

    /// Sets the address and port to bind.
    pub fn endpoint(mut self, endpoint: SocketAddr) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Sets the canonical webhook path. The default is `/webhook`.
    ///
    /// A missing leading slash is added.
    pub fn route<P: AsRef<str>>(mut self, path: P) -> Self {
        self.route_path = normalize_path(path.as_ref());
        self
    }

    /// Adds another path answering exactly like the canonical one.
    pub fn alias<P: AsRef<str>>(mut self, path: P) -> Self {
        self.aliases.push(normalize_path(path.as_ref()));
        self
    }

    pub fn aliases<I, P>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        paths.into_iter().fold(self, |builder, path| builder.alias(path))
    }

    /// Sets a future that, when resolved, shuts the server down gracefully.
    pub fn shutdown<F>(mut self, shutdown: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.shutdown = Some(Box::pin(shutdown));
        self
    }

    pub fn build(self) -> Server {
        Server { config: self }
    }
}
