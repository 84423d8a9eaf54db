//! `line-webhook`: runs the reply bot behind the webhook server.
//!
//! Configuration comes from the environment; see [`line_webhook_rs::config`].

use std::process::ExitCode;

use line_webhook_rs::{router::ReplyBot, Client, Config, ServerBuilder, WebhookService};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            init_tracing("info");
            error!(error = %err, "refusing to start");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.log_level);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "webhook server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::builder()
        .base_url(&config.api_base_url)
        .timeout(config.reply_timeout)
        .auth(config.access_token.clone())
        .build()?;
    let bot = ReplyBot::new(client).reply_timeout(config.reply_timeout);

    let service = WebhookService::builder()
        .channel_secret(config.channel_secret.clone())
        .build(bot)?;

    ServerBuilder::from_config(&config)
        .shutdown(shutdown_signal())
        .build()
        .serve(service)
        .await?;

    Ok(())
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
