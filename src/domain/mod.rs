//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;

pub use entities::{ApprovalOutcome, BatchResult, Chat, ChatRef, JoinRequest, RunSummary};
pub use errors::DomainError;

/// Outcome of `AuthPort::sign_in`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInResult {
    Success,
    /// Account has 2FA enabled; `check_password` must follow.
    PasswordRequired { hint: Option<String> },
}
