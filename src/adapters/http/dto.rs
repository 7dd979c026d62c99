//! Request / response bodies.

use serde::{Deserialize, Serialize};

/// Body of `/receive` and `/accept`.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub username: Option<serde_json::Value>,
}

impl ChatRequest {
    /// The reference as text. Missing, null, blank, zero, fractional or non-scalar values
    /// count as absent.
    pub fn reference(&self) -> Option<String> {
        match self.username.as_ref()? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => n
                .as_i64()
                .filter(|id| *id != 0)
                .map(|id| id.to_string()),
            _ => None,
        }
    }
}

/// Every response carries a `status` discriminator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ApiResponse {
    Done { result: String },
    Joined { title: String, id: i64 },
    Success { approved: usize, skipped: usize },
    Error { message: String },
}

impl ApiResponse {
    pub fn error(message: impl Into<String>) -> Self {
        ApiResponse::Error {
            message: message.into(),
        }
    }
}
