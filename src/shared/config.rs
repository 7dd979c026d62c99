//! Application configuration. API credentials, session, target chat, server.
//!
//! Loaded once in `main` and passed by reference; nothing here is global.

use crate::domain::{ChatRef, DomainError};
use crate::usecases::DEFAULT_BATCH_SIZE;
use serde::Deserialize;
use std::net::SocketAddr;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// Default session file, created by `join-approver login`.
pub const DEFAULT_SESSION_PATH: &str = "./approver.session";

#[derive(Debug, Deserialize, Default, Clone)]
pub struct AppConfig {
    /// Telegram API id. Read from APPROVER_API_ID or API_ID.
    pub api_id: Option<i32>,
    /// Telegram API hash. Read from APPROVER_API_HASH or API_HASH.
    pub api_hash: Option<String>,
    /// Session file established by `login`. Read from APPROVER_SESSION_PATH or SESSION_PATH.
    pub session_path: Option<String>,
    /// Chat processed by `GET /`. Read from APPROVER_CHAT_ID or CHAT_ID.
    pub chat_id: Option<String>,

    /// Approvals in flight per batch (default 20). Read from BATCH_SIZE.
    #[serde(default)]
    pub batch_size: Option<usize>,

    /// HTTP bind address (default 0.0.0.0:5000). Read from BIND_ADDR.
    #[serde(default)]
    pub bind_addr: Option<String>,

    /// Serve against the mock gateway instead of Telegram. Read from APPROVER_DRY_RUN.
    #[serde(default)]
    pub dry_run: Option<bool>,
}

/// Unprefixed variables, read directly so a plain `.env` works.
fn env_override(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Reads the process environment; `main` loads `.env` into it beforehand.
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut c = config::Config::builder();
        if let Ok(path) = std::env::var("APPROVER_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c = c.add_source(config::Environment::with_prefix("APPROVER"));
        let mut cfg: Self = c.build()?.try_deserialize()?;

        if cfg.api_id.is_none() {
            cfg.api_id = env_override("API_ID").and_then(|s| s.trim().parse().ok());
        }
        if cfg.api_hash.is_none() {
            cfg.api_hash = env_override("API_HASH");
        }
        if cfg.session_path.is_none() {
            cfg.session_path = env_override("SESSION_PATH");
        }
        if cfg.chat_id.is_none() {
            cfg.chat_id = env_override("CHAT_ID");
        }
        if let Some(n) = env_override("BATCH_SIZE").and_then(|s| s.trim().parse().ok()) {
            cfg.batch_size = Some(n);
        }
        if let Some(addr) = env_override("BIND_ADDR") {
            cfg.bind_addr = Some(addr);
        }
        Ok(cfg)
    }

    /// Returns batch size. Defaults to DEFAULT_BATCH_SIZE; 0 is raised to 1.
    pub fn batch_size_or_default(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1)
    }

    pub fn session_path_or_default(&self) -> String {
        self.session_path
            .clone()
            .unwrap_or_else(|| DEFAULT_SESSION_PATH.to_string())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.bind_addr
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse()
    }

    /// Default chat for `GET /`, normalized like `/accept` references.
    pub fn default_chat(&self) -> Result<Option<ChatRef>, DomainError> {
        self.chat_id.as_deref().map(ChatRef::parse).transpose()
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run.unwrap_or(false)
    }

    /// Returns (api_id, api_hash) when both are present and non-empty.
    pub fn credentials(&self) -> Option<(i32, String)> {
        let api_id = self.api_id.filter(|id| *id != 0)?;
        let api_hash = self.api_hash.clone().filter(|h| !h.is_empty())?;
        Some((api_id, api_hash))
    }
}
