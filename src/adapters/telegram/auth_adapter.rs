//! Implements AuthPort using grammers Client.
//!
//! Only used by the `login` command to establish the session the server runs on.
//! Keeps the login token and password token between calls of the flow.

use crate::adapters::telegram::mapper;
use crate::domain::{DomainError, SignInResult};
use crate::ports::AuthPort;
use async_trait::async_trait;
use grammers_client::client::{LoginToken, PasswordToken};
use grammers_client::{Client, SignInError};
use tokio::sync::Mutex;

pub struct GrammersAuthAdapter {
    client: Client,
    /// From request_login_code; consumed by sign_in.
    login_token: Mutex<Option<LoginToken>>,
    /// From sign_in(PasswordRequired); consumed by check_password.
    password_token: Mutex<Option<PasswordToken>>,
}

impl GrammersAuthAdapter {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            login_token: Mutex::new(None),
            password_token: Mutex::new(None),
        }
    }
}

fn auth_error(step: &str, e: DomainError) -> DomainError {
    match e {
        DomainError::FloodWait { seconds } => DomainError::Auth(format!(
            "{}: too many attempts, retry in {} seconds",
            step, seconds
        )),
        other => DomainError::Auth(format!("{}: {}", step, other)),
    }
}

#[async_trait]
impl AuthPort for GrammersAuthAdapter {
    async fn is_authenticated(&self) -> Result<bool, DomainError> {
        self.client
            .is_authorized()
            .await
            .map_err(|e| auth_error("is_authorized", mapper::map_invocation_error(e)))
    }

    async fn request_login_code(&self, phone: &str, api_hash: &str) -> Result<(), DomainError> {
        let token = self
            .client
            .request_login_code(phone, api_hash)
            .await
            .map_err(|e| DomainError::Auth(format!("request_login_code: {}", e)))?;
        *self.login_token.lock().await = Some(token);
        *self.password_token.lock().await = None;
        Ok(())
    }

    async fn sign_in(&self, code: &str) -> Result<SignInResult, DomainError> {
        let token = self.login_token.lock().await.take().ok_or_else(|| {
            DomainError::Auth("request_login_code must be called before sign_in".into())
        })?;
        match self.client.sign_in(&token, code).await {
            Ok(_user) => Ok(SignInResult::Success),
            Err(SignInError::PasswordRequired(pt)) => {
                let hint = pt.hint().map(String::from);
                *self.password_token.lock().await = Some(pt);
                Ok(SignInResult::PasswordRequired { hint })
            }
            Err(SignInError::InvalidCode) => Err(DomainError::Auth(
                "Invalid login code. Run `login` again and enter the correct code.".into(),
            )),
            Err(SignInError::SignUpRequired) => Err(DomainError::Auth(
                "Sign-up required. Create an account with the official Telegram app first.".into(),
            )),
            Err(e) => Err(DomainError::Auth(format!("sign in: {}", e))),
        }
    }

    async fn check_password(&self, password: &[u8]) -> Result<(), DomainError> {
        let pt = self.password_token.lock().await.take().ok_or_else(|| {
            DomainError::Auth("sign_in must return PasswordRequired before check_password".into())
        })?;
        self.client
            .check_password(pt, password)
            .await
            .map_err(|e| DomainError::Auth(format!("check_password: {}", e)))?;
        Ok(())
    }
}
