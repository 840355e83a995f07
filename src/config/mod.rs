//! Configuration module for the timetable backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// How a push to the remote store decides it succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMode {
    /// Success once the request was delivered; the response is ignored
    FireAndForget,
    /// Success only on a 2xx response
    Verified,
}

impl PushMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fire-and-forget" | "fire_and_forget" => Some(PushMode::FireAndForget),
            "verified" => Some(PushMode::Verified),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PushMode::FireAndForget => "fire-and-forget",
            PushMode::Verified => "verified",
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite local store
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Endpoint used when the stored settings have none
    pub default_remote_url: Option<String>,
    pub push_mode: PushMode,
    /// Per-request timeout for the remote store; none by default
    pub remote_timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("TT_DB_PATH")
            .unwrap_or_else(|| "./data/timetable.sqlite".to_string())
            .into();

        let bind_addr = lookup("TT_BIND_ADDR")
            .unwrap_or_else(|| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| format!("Invalid TT_BIND_ADDR format: {}", e))?;

        let log_level = lookup("TT_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let default_remote_url = lookup("TT_REMOTE_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let push_mode = match lookup("TT_REMOTE_PUSH_MODE") {
            Some(value) => PushMode::parse(&value)
                .ok_or_else(|| format!("Invalid TT_REMOTE_PUSH_MODE: {}", value))?,
            None => PushMode::Verified,
        };

        let remote_timeout = lookup("TT_REMOTE_TIMEOUT_SECS")
            .map(|value| {
                value
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| format!("Invalid TT_REMOTE_TIMEOUT_SECS: {}", e))
            })
            .transpose()?;

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            default_remote_url,
            push_mode,
            remote_timeout,
        })
    }
}
