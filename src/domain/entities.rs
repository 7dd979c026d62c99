//! Domain entities. Pure data structures for the core business.
//!
//! No Telegram/IO types here — these are mapped from adapters.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::DomainError;

/// How a caller names a chat: a numeric Bot-API id or a textual handle / invite link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatRef {
    /// Bot-API style dialog id, e.g. `-1001234567890` for a channel.
    Id(i64),
    /// `name`, `@name`, `t.me/name`, `t.me/+hash`, `t.me/joinchat/hash` or `+hash`.
    Handle(String),
}

impl ChatRef {
    /// Normalize a raw reference.
    ///
    /// A string made solely of digits, optionally prefixed with `-`, is parsed as a numeric id;
    /// anything else is kept as a handle. Digit-only strings that do not fit an `i64`
    /// (or carry more than one leading `-`) are rejected.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let raw = raw.trim();
        let digits = raw.trim_start_matches('-');
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return raw
                .parse::<i64>()
                .map(ChatRef::Id)
                .map_err(|_| DomainError::InvalidChatId(raw.to_string()));
        }
        Ok(ChatRef::Handle(raw.to_string()))
    }

    /// Invite hash if this reference is a private invite (`+hash` / `joinchat/hash`).
    pub fn invite_hash(&self) -> Option<&str> {
        let ChatRef::Handle(h) = self else {
            return None;
        };
        let path = strip_tme_prefix(h);
        path.strip_prefix('+')
            .or_else(|| path.strip_prefix("joinchat/"))
            .map(|s| s.trim_end_matches('/'))
            .filter(|s| !s.is_empty())
    }

    /// Public username if this reference is a handle that is not an invite.
    pub fn username(&self) -> Option<&str> {
        if self.invite_hash().is_some() {
            return None;
        }
        let ChatRef::Handle(h) = self else {
            return None;
        };
        let name = strip_tme_prefix(h).trim_start_matches('@');
        let name = name.split(['/', '?']).next().unwrap_or_default();
        (!name.is_empty()).then_some(name)
    }
}

fn strip_tme_prefix(h: &str) -> &str {
    let h = h.trim();
    let h = h
        .strip_prefix("https://")
        .or_else(|| h.strip_prefix("http://"))
        .unwrap_or(h);
    h.strip_prefix("t.me/")
        .or_else(|| h.strip_prefix("telegram.me/"))
        .unwrap_or(h)
}

impl fmt::Display for ChatRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRef::Id(id) => write!(f, "{}", id),
            ChatRef::Handle(h) => f.write_str(h),
        }
    }
}

/// A resolved Telegram chat (group, supergroup or channel).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub title: String,
    pub username: Option<String>,
}

/// One pending request to join a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub user_id: i64,
    pub first_name: String,
    pub username: Option<String>,
    /// Unix seconds when the request was made. Used as the listing cursor.
    pub date: i64,
}

impl fmt::Display for JoinRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.username {
            Some(u) => write!(f, "{} (@{})", self.first_name, u),
            None => write!(f, "{} ({})", self.first_name, self.user_id),
        }
    }
}

/// Terminal classification of one approval attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalOutcome {
    Approved,
    Skipped,
}

/// Outcomes of one batch, in the order of the batch's input.
pub type BatchResult = Vec<ApprovalOutcome>;

/// Aggregate counts of a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub approved: usize,
    pub skipped: usize,
}

impl RunSummary {
    /// Add one batch's outcomes to the running totals.
    pub fn record(&mut self, batch: &[ApprovalOutcome]) {
        for outcome in batch {
            match outcome {
                ApprovalOutcome::Approved => self.approved += 1,
                ApprovalOutcome::Skipped => self.skipped += 1,
            }
        }
    }

    pub fn total(&self) -> usize {
        self.approved + self.skipped
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Approved {}, Skipped {}", self.approved, self.skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_ids() {
        assert_eq!(
            ChatRef::parse("-1001234567890").unwrap(),
            ChatRef::Id(-1001234567890)
        );
        assert_eq!(ChatRef::parse("42").unwrap(), ChatRef::Id(42));
    }

    #[test]
    fn test_parse_handles() {
        assert_eq!(
            ChatRef::parse("@mychannel").unwrap(),
            ChatRef::Handle("@mychannel".into())
        );
        // Lone dash has no digits: treated as a handle.
        assert_eq!(ChatRef::parse("-").unwrap(), ChatRef::Handle("-".into()));
        assert_eq!(
            ChatRef::parse("12ab").unwrap(),
            ChatRef::Handle("12ab".into())
        );
    }

    #[test]
    fn test_parse_rejects_malformed_ids() {
        assert!(matches!(
            ChatRef::parse("--5"),
            Err(DomainError::InvalidChatId(_))
        ));
        assert!(matches!(
            ChatRef::parse("99999999999999999999"),
            Err(DomainError::InvalidChatId(_))
        ));
    }

    #[test]
    fn test_invite_hash_and_username() {
        let invite = ChatRef::Handle("https://t.me/+AbCdEf123".into());
        assert_eq!(invite.invite_hash(), Some("AbCdEf123"));
        assert_eq!(invite.username(), None);

        let legacy = ChatRef::Handle("t.me/joinchat/XyZ".into());
        assert_eq!(legacy.invite_hash(), Some("XyZ"));

        let public = ChatRef::Handle("https://t.me/rustlang".into());
        assert_eq!(public.invite_hash(), None);
        assert_eq!(public.username(), Some("rustlang"));

        assert_eq!(
            ChatRef::Handle("@rustlang".into()).username(),
            Some("rustlang")
        );
        assert_eq!(ChatRef::Id(-100).username(), None);
    }

    #[test]
    fn test_summary_record_and_display() {
        let mut summary = RunSummary::default();
        summary.record(&[
            ApprovalOutcome::Approved,
            ApprovalOutcome::Skipped,
            ApprovalOutcome::Approved,
        ]);
        assert_eq!(summary.approved, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.to_string(), "Approved 2, Skipped 1");
    }
}
