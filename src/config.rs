//! Process configuration.
//!
//! Everything is read once at startup from the environment (a `.env` file
//! is loaded first when present). Missing credentials are a startup error:
//! the process does not run in a degraded mode.
//!
//! | Variable | Default |
//! |---|---|
//! | `LINE_CHANNEL_SECRET` | required |
//! | `LINE_CHANNEL_ACCESS_TOKEN` | required |
//! | `LISTEN_ADDR` | `0.0.0.0:3000` |
//! | `PORT` | overrides the port of `LISTEN_ADDR` |
//! | `WEBHOOK_PATH` | `/webhook` |
//! | `WEBHOOK_PATH_ALIASES` | none; comma separated |
//! | `LINE_API_BASE_URL` | `https://api.line.me` |
//! | `REPLY_TIMEOUT_SECS` | `5` |
//! | `LOG_LEVEL` | `info`; `RUST_LOG` wins when set |

use std::{
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    time::Duration,
};

use crate::{
    client::{AccessToken, DEFAULT_BASE_URL, DEFAULT_TIMEOUT},
    error::ConfigError,
    signature::ChannelSecret,
};

pub const DEFAULT_LISTEN_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 3000));
pub const DEFAULT_WEBHOOK_PATH: &str = "/webhook";

/// Resolved configuration. Immutable after load.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Config {
    pub channel_secret: ChannelSecret,
    pub access_token: AccessToken,
    pub listen_addr: SocketAddr,
    pub webhook_path: String,
    pub path_aliases: Vec<String>,
    pub api_base_url: String,
    pub reply_timeout: Duration,
    pub log_level: String,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let channel_secret = get("LINE_CHANNEL_SECRET")
            .ok_or(ConfigError::MissingCredentials("LINE_CHANNEL_SECRET"))?;
        let access_token = get("LINE_CHANNEL_ACCESS_TOKEN")
            .ok_or(ConfigError::MissingCredentials("LINE_CHANNEL_ACCESS_TOKEN"))?;

        let mut listen_addr: SocketAddr = match get("LISTEN_ADDR") {
            Some(addr) => addr.trim().parse().map_err(|err| ConfigError::Invalid {
                key: "LISTEN_ADDR",
                reason: format!("{err}"),
            })?,
            None => DEFAULT_LISTEN_ADDR,
        };
        if let Some(port) = get("PORT") {
            let port = port.trim().parse().map_err(|err| ConfigError::Invalid {
                key: "PORT",
                reason: format!("{err}"),
            })?;
            listen_addr.set_port(port);
        }

        let webhook_path = normalize_path(
            &get("WEBHOOK_PATH").unwrap_or_else(|| DEFAULT_WEBHOOK_PATH.to_owned()),
        );
        let path_aliases = get("WEBHOOK_PATH_ALIASES")
            .map(|aliases| {
                aliases
                    .split(',')
                    .map(str::trim)
                    .filter(|alias| !alias.is_empty())
                    .map(normalize_path)
                    .collect()
            })
            .unwrap_or_default();

        let reply_timeout = match get("REPLY_TIMEOUT_SECS") {
            Some(secs) => {
                let secs: f64 = secs.trim().parse().map_err(|err| ConfigError::Invalid {
                    key: "REPLY_TIMEOUT_SECS",
                    reason: format!("{err}"),
                })?;
                Duration::try_from_secs_f64(secs).map_err(|err| ConfigError::Invalid {
                    key: "REPLY_TIMEOUT_SECS",
                    reason: format!("{err}"),
                })?
            }
            None => DEFAULT_TIMEOUT,
        };
        if reply_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "REPLY_TIMEOUT_SECS",
                reason: "must be greater than zero".to_owned(),
            });
        }

        Ok(Self {
            channel_secret: ChannelSecret(channel_secret),
            access_token: AccessToken(access_token),
            listen_addr,
            webhook_path,
            path_aliases,
            api_base_url: get("LINE_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            reply_timeout,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_owned()),
        })
    }
}

/// Ensures a leading slash and drops trailing ones (except for `/` itself).
pub(crate) fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const CREDS: [(&str, &str); 2] = [
        ("LINE_CHANNEL_SECRET", "secret"),
        ("LINE_CHANNEL_ACCESS_TOKEN", "token"),
    ];

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&CREDS)).unwrap();
        assert_eq!(config.channel_secret.0, "secret");
        assert_eq!(config.access_token.0, "token");
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        assert_eq!(config.webhook_path, "/webhook");
        assert!(config.path_aliases.is_empty());
        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.reply_timeout, Duration::from_secs(5));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn missing_credentials_fail_fast() {
        assert_eq!(
            Config::from_lookup(lookup(&[])).unwrap_err(),
            ConfigError::MissingCredentials("LINE_CHANNEL_SECRET")
        );
        assert_eq!(
            Config::from_lookup(lookup(&[
                ("LINE_CHANNEL_SECRET", "secret"),
                ("LINE_CHANNEL_ACCESS_TOKEN", "  ")
            ]))
            .unwrap_err(),
            ConfigError::MissingCredentials("LINE_CHANNEL_ACCESS_TOKEN")
        );
    }

    #[test]
    fn overrides() {
        let mut vars = CREDS.to_vec();
        vars.extend([
            ("LISTEN_ADDR", "127.0.0.1:8080"),
            ("PORT", "9000"),
            ("WEBHOOK_PATH", "callback/"),
            ("WEBHOOK_PATH_ALIASES", "/api/webhook, api/line ,"),
            ("REPLY_TIMEOUT_SECS", "2.5"),
        ]);
        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.webhook_path, "/callback");
        assert_eq!(config.path_aliases, ["/api/webhook", "/api/line"]);
        assert_eq!(config.reply_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn invalid_values_are_reported() {
        for (key, value) in [
            ("PORT", "eighty"),
            ("LISTEN_ADDR", "nowhere"),
            ("REPLY_TIMEOUT_SECS", "0"),
            ("REPLY_TIMEOUT_SECS", "-1"),
        ] {
            let mut vars = CREDS.to_vec();
            vars.push((key, value));
            assert!(
                matches!(
                    Config::from_lookup(lookup(&vars)),
                    Err(ConfigError::Invalid { key: k, .. }) if k == key
                ),
                "{key}={value}"
            );
        }
    }

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("webhook"), "/webhook");
        assert_eq!(normalize_path("/a/b/"), "/a/b");
    }

    #[test]
    fn reads_process_environment() {
        temp_env::with_vars(
            [
                ("LINE_CHANNEL_SECRET", Some("env-secret")),
                ("LINE_CHANNEL_ACCESS_TOKEN", Some("env-token")),
                ("WEBHOOK_PATH", Some("/line")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.channel_secret.0, "env-secret");
                assert_eq!(config.webhook_path, "/line");
            },
        );
    }
}
