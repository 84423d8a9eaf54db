#![deny(clippy::future_not_send)]

//! # line_webhook_rs
//!
//! A webhook receiver for LINE Messaging API bots. Inbound callbacks are
//! verified against the channel secret, parsed into typed events, routed by
//! kind, and answered through the reply API.
//!
//! ## ✨ Features
//!
//! - **Signature verification**: constant-time HMAC-SHA256 check of
//!   `X-Line-Signature` over the raw body.
//! - **Typed events**: message (text, sticker, image) and postback events as
//!   tagged enums; unknown kinds are tolerated.
//! - **Routing**: a [`Handler`] trait with per-kind methods and a batch
//!   dispatcher that isolates failing events.
//! - **Replies**: text, sticker and flex messages, sent by a [`Client`] with
//!   an explicit timeout.
//! - **Server**: a managed axum [`Server`], or a [`WebhookService`] to mount
//!   in your own.
//!
//! ## 🚀 Example
//!
//! ```rust,no_run
//! use line_webhook_rs::{router::ReplyBot, Client, Config, ServerBuilder, WebhookService};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//!
//! let client = Client::builder()
//!     .base_url(&config.api_base_url)
//!     .timeout(config.reply_timeout)
//!     .auth(config.access_token.clone())
//!     .build()?;
//! let bot = ReplyBot::new(client).reply_timeout(config.reply_timeout);
//!
//! let service = WebhookService::builder()
//!     .channel_secret(config.channel_secret.clone())
//!     .build(bot)?;
//!
//! ServerBuilder::from_config(&config).build().serve(service).await?;
//! # Ok(()) }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod message;
pub mod reply;
pub mod router;
pub mod server;
pub mod signature;
pub mod webhook_service;

pub use client::{Client, MessagingClient};
pub use config::Config;
pub use error::{ConfigError, Error, WebhookError};
pub use event::{parse_events, Event};
pub use message::OutboundMessage;
pub use router::{dispatch, Handler};
pub use server::{Server, ServerBuilder};
pub use signature::verify_signature;
pub use webhook_service::WebhookService;
