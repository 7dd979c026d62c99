//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{Chat, ChatRef, DomainError, JoinRequest, SignInResult};

/// Telegram API gateway. One authenticated session, shared by every concurrent caller.
///
/// Errors are classified by the adapter: `PermanentFailure`, `FloodWait`,
/// `InvalidReference`, or `TgGateway` for everything else.
#[async_trait::async_trait]
pub trait TgGateway: Send + Sync {
    /// Resolve a reference to its canonical chat.
    async fn resolve_chat(&self, chat: &ChatRef) -> Result<Chat, DomainError>;

    /// Fetch every pending join request of a chat. Drains all pages before returning.
    async fn get_join_requests(&self, chat: &ChatRef) -> Result<Vec<JoinRequest>, DomainError>;

    /// Approve one user's pending request. A single attempt; no internal retry.
    async fn approve_join_request(&self, chat: &ChatRef, user_id: i64)
        -> Result<(), DomainError>;

    /// Join a chat by invite link / hash or public handle.
    async fn join_chat(&self, reference: &str) -> Result<Chat, DomainError>;
}

/// Authentication port. Used only to establish the long-lived session.
#[async_trait::async_trait]
pub trait AuthPort: Send + Sync {
    async fn is_authenticated(&self) -> Result<bool, DomainError>;

    async fn request_login_code(&self, phone: &str, api_hash: &str) -> Result<(), DomainError>;

    async fn sign_in(&self, code: &str) -> Result<SignInResult, DomainError>;

    async fn check_password(&self, password: &[u8]) -> Result<(), DomainError>;
}
