//! Handle Login / 2FA flow. Establishes the long-lived session used by the server.
//!
//! Delegates Telegram calls to AuthPort and user input to LoginPrompt.

use crate::domain::{DomainError, SignInResult};
use crate::ports::{AuthPort, LoginPrompt};
use std::sync::Arc;
use tracing::info;

pub struct AuthService {
    auth: Arc<dyn AuthPort>,
    api_hash: String,
}

impl AuthService {
    pub fn new(auth: Arc<dyn AuthPort>, api_hash: String) -> Self {
        Self { auth, api_hash }
    }

    /// Check if the session is already authorized.
    pub async fn is_authenticated(&self) -> Result<bool, DomainError> {
        self.auth.is_authenticated().await
    }

    /// Run full auth flow (phone -> code -> 2FA if needed). No-op when already signed in.
    pub async fn run_auth_flow(&self, prompt: &dyn LoginPrompt) -> Result<(), DomainError> {
        if self.is_authenticated().await? {
            info!("session already authorized");
            return Ok(());
        }

        let phone = prompt.phone()?;
        self.auth
            .request_login_code(phone.trim(), &self.api_hash)
            .await?;

        let code = prompt.code()?;
        match self.auth.sign_in(code.trim()).await? {
            SignInResult::Success => {}
            SignInResult::PasswordRequired { hint } => {
                let password = prompt.password(hint.as_deref())?;
                self.auth.check_password(password.as_bytes()).await?;
            }
        }

        info!("signed in; session saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeAuth {
        authorized: bool,
        needs_password: bool,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl AuthPort for FakeAuth {
        async fn is_authenticated(&self) -> Result<bool, DomainError> {
            Ok(self.authorized)
        }

        async fn request_login_code(&self, phone: &str, api_hash: &str) -> Result<(), DomainError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("code:{}:{}", phone, api_hash));
            Ok(())
        }

        async fn sign_in(&self, code: &str) -> Result<SignInResult, DomainError> {
            self.calls.lock().unwrap().push(format!("sign_in:{}", code));
            if self.needs_password {
                Ok(SignInResult::PasswordRequired {
                    hint: Some("pet".into()),
                })
            } else {
                Ok(SignInResult::Success)
            }
        }

        async fn check_password(&self, password: &[u8]) -> Result<(), DomainError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("password:{}", String::from_utf8_lossy(password)));
            Ok(())
        }
    }

    struct ScriptedPrompt;

    impl LoginPrompt for ScriptedPrompt {
        fn phone(&self) -> Result<String, DomainError> {
            Ok(" +15550001111 ".into())
        }

        fn code(&self) -> Result<String, DomainError> {
            Ok("12345".into())
        }

        fn password(&self, hint: Option<&str>) -> Result<String, DomainError> {
            assert_eq!(hint, Some("pet"));
            Ok("hunter2".into())
        }
    }

    #[tokio::test]
    async fn test_already_authorized_skips_prompts() {
        let auth = Arc::new(FakeAuth {
            authorized: true,
            ..Default::default()
        });
        let svc = AuthService::new(Arc::clone(&auth) as Arc<dyn AuthPort>, "hash".into());

        svc.run_auth_flow(&ScriptedPrompt).await.unwrap();

        assert!(auth.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_is_authenticated_reports_session_state() {
        let signed_out = AuthService::new(Arc::new(FakeAuth::default()), "hash".into());
        assert!(!signed_out.is_authenticated().await.unwrap());

        let signed_in = AuthService::new(
            Arc::new(FakeAuth {
                authorized: true,
                ..Default::default()
            }),
            "hash".into(),
        );
        assert!(signed_in.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn test_flow_with_password() {
        let auth = Arc::new(FakeAuth {
            needs_password: true,
            ..Default::default()
        });
        let svc = AuthService::new(Arc::clone(&auth) as Arc<dyn AuthPort>, "hash".into());

        svc.run_auth_flow(&ScriptedPrompt).await.unwrap();

        assert_eq!(
            *auth.calls.lock().unwrap(),
            vec![
                "code:+15550001111:hash".to_string(),
                "sign_in:12345".to_string(),
                "password:hunter2".to_string(),
            ]
        );
    }
}
