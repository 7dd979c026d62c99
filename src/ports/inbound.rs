//! Inbound port. UI (adapter) supplies what the sign-in flow asks for.

use crate::domain::DomainError;

/// Interactive source of login credentials.
pub trait LoginPrompt: Send + Sync {
    fn phone(&self) -> Result<String, DomainError>;

    fn code(&self) -> Result<String, DomainError>;

    /// 2FA password. `hint` is the hint configured on the account, if any.
    fn password(&self, hint: Option<&str>) -> Result<String, DomainError>;
}
