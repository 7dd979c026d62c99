//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Telegram gateway error: {0}")]
    TgGateway(String),

    /// The target account can never be added: too many chats, deactivated, or unresolvable.
    #[error("Permanent failure: {0}")]
    PermanentFailure(String),

    /// FloodWait error: caller must wait `seconds` seconds before retrying the same call.
    #[error("FloodWait: retry after {seconds} seconds")]
    FloodWait { seconds: u64 },

    /// Chat reference or invite link cannot be interpreted at all.
    #[error("Invalid invite or identifier")]
    InvalidReference,

    #[error("Invalid chat ID format: {0}")]
    InvalidChatId(String),

    #[error("Authentication failed: {0}")]
    Auth(String),
}

impl DomainError {
    /// Per-user failures that will not go away by retrying.
    pub fn is_permanent(&self) -> bool {
        matches!(self, DomainError::PermanentFailure(_))
    }
}
