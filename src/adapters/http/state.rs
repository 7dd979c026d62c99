//! Shared application state.

use crate::domain::ChatRef;
use crate::usecases::{ApprovalService, JoinService};
use std::sync::Arc;

pub struct AppState {
    pub approval: Arc<ApprovalService>,
    pub join: Arc<JoinService>,
    /// Chat processed by `GET /`. From CHAT_ID.
    pub default_chat: Option<ChatRef>,
}
