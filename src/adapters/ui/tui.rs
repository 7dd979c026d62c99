//! Implements LoginPrompt. Inquire-based interactive prompts.

use crate::domain::DomainError;
use crate::ports::LoginPrompt;
use inquire::{Password, PasswordDisplayMode, Text};

/// TUI adapter. Inquire prompts for phone, code and 2FA password.
pub struct TuiLoginPrompt;

impl TuiLoginPrompt {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TuiLoginPrompt {
    fn default() -> Self {
        Self::new()
    }
}

fn prompt_error(e: inquire::InquireError) -> DomainError {
    DomainError::Auth(e.to_string())
}

impl LoginPrompt for TuiLoginPrompt {
    fn phone(&self) -> Result<String, DomainError> {
        Text::new("Phone number (international format):")
            .with_placeholder("+15551234567")
            .prompt()
            .map_err(prompt_error)
    }

    fn code(&self) -> Result<String, DomainError> {
        Text::new("Login code (sent via Telegram):")
            .prompt()
            .map_err(prompt_error)
    }

    fn password(&self, hint: Option<&str>) -> Result<String, DomainError> {
        let message = match hint {
            Some(h) => format!("2FA password (hint: {}):", h),
            None => "2FA password:".to_string(),
        };
        Password::new(&message)
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
            .map_err(prompt_error)
    }
}
