//! Application use cases. Orchestrate domain logic via ports.

pub mod approval_service;
pub mod auth_service;
pub mod join_service;

pub use approval_service::{ApprovalService, DEFAULT_BATCH_SIZE};
pub use auth_service::AuthService;
pub use join_service::JoinService;
