//! Join a chat by invite link or public handle.

use crate::domain::{Chat, DomainError};
use crate::ports::TgGateway;
use std::sync::Arc;
use tracing::info;

pub struct JoinService {
    tg: Arc<dyn TgGateway>,
}

impl JoinService {
    pub fn new(tg: Arc<dyn TgGateway>) -> Self {
        Self { tg }
    }

    pub async fn join(&self, reference: &str) -> Result<Chat, DomainError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(DomainError::InvalidReference);
        }
        let chat = self.tg.join_chat(reference).await?;
        info!(chat_id = chat.id, title = %chat.title, "joined chat");
        Ok(chat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::telegram::mock_gateway::MockTgGateway;

    #[tokio::test]
    async fn test_join_trims_reference() {
        let gw = Arc::new(MockTgGateway::new());
        let svc = JoinService::new(Arc::clone(&gw) as Arc<dyn TgGateway>);

        let chat = svc.join("  https://t.me/+AbCdEf  ").await.unwrap();

        assert_eq!(chat.title, "Mock Channel");
        assert_eq!(gw.joined_refs(), vec!["https://t.me/+AbCdEf".to_string()]);
    }

    #[tokio::test]
    async fn test_blank_reference_is_invalid() {
        let gw = Arc::new(MockTgGateway::new());
        let svc = JoinService::new(Arc::clone(&gw) as Arc<dyn TgGateway>);

        assert_eq!(svc.join("   ").await.unwrap_err(), DomainError::InvalidReference);
        assert!(gw.joined_refs().is_empty());
    }
}
