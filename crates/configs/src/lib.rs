//! game-vault/crates/configs/src/lib.rs
//!
//! Runtime settings for the portal binary.
//!
//! Sources are layered, later ones winning:
//!
//! 1. built-in defaults
//! 2. an optional `portal.toml` (path overridable with `PORTAL_CONFIG`)
//! 3. environment variables prefixed `PORTAL__`, nested with `__`,
//!    e.g. `PORTAL__UPSTREAM__BASE_URL=https://api.example.com`
//!
//! A `.env` file in the working directory is loaded first, if present.

use std::net::SocketAddr;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const DEFAULT_CONFIG_FILE: &str = "portal.toml";
const CONFIG_FILE_VAR: &str = "PORTAL_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub upstream: UpstreamSettings,
    pub catalog: CatalogSettings,
    pub search: SearchSettings,
    pub board: BoardSettings,
    pub visitors: VisitorSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid {
                key: "server.host",
                reason: format!("{e}"),
            })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSettings {
    pub base_url: String,
    /// Sent on every call as `X-Auth-Token`
    pub service_token: SecretString,
    pub timeout_secs: u64,
}

impl UpstreamSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    pub page_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    pub min_chars: usize,
    pub limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardSettings {
    /// Cards revealed per "load more" in a status section
    pub reveal_step: usize,
    /// Upper bound on visitors whose board state is kept in memory
    pub max_boards: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitorBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisitorSettings {
    pub backend: VisitorBackend,
    #[serde(default)]
    pub redis_url: Option<SecretString>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub format: LogFormat,
    /// Fallback filter when `RUST_LOG` is unset
    pub filter: String,
}

impl Settings {
    /// Loads `.env`, then the layered sources described in the crate docs.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }

        let file = std::env::var(CONFIG_FILE_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
        let config = Self::defaults()?
            .add_source(File::with_name(&file).required(false))
            .add_source(
                Environment::with_prefix("PORTAL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Self::from_config(config)
    }

    /// Builder seeded with the built-in defaults.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("upstream.base_url", "")?
            .set_default("upstream.service_token", "")?
            .set_default("upstream.timeout_secs", 15)?
            .set_default("catalog.page_size", 48)?
            .set_default("search.min_chars", 2)?
            .set_default("search.limit", 8)?
            .set_default("board.reveal_step", 6)?
            .set_default("board.max_boards", 10_000)?
            .set_default("visitors.backend", "memory")?
            .set_default("log.format", "pretty")?
            .set_default("log.filter", "info,game_vault=debug")?)
    }

    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "upstream.base_url",
                reason: "must be set (PORTAL__UPSTREAM__BASE_URL)".into(),
            });
        }
        if self.upstream.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "upstream.timeout_secs",
                reason: "must be positive".into(),
            });
        }
        if !(1..=100).contains(&self.catalog.page_size) {
            return Err(ConfigError::Invalid {
                key: "catalog.page_size",
                reason: format!("{} is outside 1..=100", self.catalog.page_size),
            });
        }
        if self.board.reveal_step == 0 {
            return Err(ConfigError::Invalid {
                key: "board.reveal_step",
                reason: "must be positive".into(),
            });
        }
        if self.board.max_boards == 0 {
            return Err(ConfigError::Invalid {
                key: "board.max_boards",
                reason: "must be positive".into(),
            });
        }
        if self.search.limit == 0 {
            return Err(ConfigError::Invalid {
                key: "search.limit",
                reason: "must be positive".into(),
            });
        }
        if self.visitors.backend == VisitorBackend::Redis
            && self
                .visitors
                .redis_url
                .as_ref()
                .is_none_or(|url| url.expose_secret().trim().is_empty())
        {
            return Err(ConfigError::Invalid {
                key: "visitors.redis_url",
                reason: "required for the redis backend".into(),
            });
        }
        Ok(())
    }
}
