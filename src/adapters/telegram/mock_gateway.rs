//! Mock Telegram gateway for testing and dry runs without a session.
//!
//! Scriptable per user: queue errors to return before an approval succeeds,
//! or make one error sticky. Records every call so tests can assert on them.

use crate::domain::{Chat, ChatRef, DomainError, JoinRequest};
use crate::ports::TgGateway;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::info;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Build `n` synthetic join requests with user ids `1..=n`.
pub fn synthetic_requests(n: usize) -> Vec<JoinRequest> {
    (1..=n as i64)
        .map(|id| JoinRequest {
            user_id: id,
            first_name: format!("User {}", id),
            username: (id % 2 == 0).then(|| format!("user{}", id)),
            date: 1_700_000_000 + id,
        })
        .collect()
}

/// Mock gateway. Every approval succeeds unless scripted otherwise.
pub struct MockTgGateway {
    chat: Chat,
    requests: Vec<JoinRequest>,
    /// Simulated network latency of each approval call.
    delay: Duration,
    resolve_error: Option<DomainError>,
    list_error: Option<DomainError>,
    join_error: Option<DomainError>,
    /// Errors returned (in order) before the user's approval succeeds.
    scripted: Mutex<HashMap<i64, VecDeque<DomainError>>>,
    /// Error returned on every attempt for the user.
    sticky: HashMap<i64, DomainError>,

    attempts: Mutex<HashMap<i64, usize>>,
    approved: Mutex<Vec<i64>>,
    listed: Mutex<Vec<ChatRef>>,
    approved_in: Mutex<Vec<ChatRef>>,
    joined: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTgGateway {
    pub fn new() -> Self {
        Self {
            chat: Chat {
                id: -1001234567890,
                title: "Mock Channel".to_string(),
                username: Some("mockchannel".to_string()),
            },
            requests: Vec::new(),
            delay: Duration::ZERO,
            resolve_error: None,
            list_error: None,
            join_error: None,
            scripted: Mutex::new(HashMap::new()),
            sticky: HashMap::new(),
            attempts: Mutex::new(HashMap::new()),
            approved: Mutex::new(Vec::new()),
            listed: Mutex::new(Vec::new()),
            approved_in: Mutex::new(Vec::new()),
            joined: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_chat(mut self, chat: Chat) -> Self {
        self.chat = chat;
        self
    }

    pub fn with_requests(mut self, requests: Vec<JoinRequest>) -> Self {
        self.requests = requests;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_resolve_error(mut self, err: DomainError) -> Self {
        self.resolve_error = Some(err);
        self
    }

    pub fn with_list_error(mut self, err: DomainError) -> Self {
        self.list_error = Some(err);
        self
    }

    pub fn with_join_error(mut self, err: DomainError) -> Self {
        self.join_error = Some(err);
        self
    }

    /// Return `errors` in order on the user's next attempts, then succeed.
    pub fn fail_then_succeed(self, user_id: i64, errors: Vec<DomainError>) -> Self {
        lock(&self.scripted)
            .entry(user_id)
            .or_default()
            .extend(errors);
        self
    }

    /// Return `err` on every attempt for the user.
    pub fn always_fail(mut self, user_id: i64, err: DomainError) -> Self {
        self.sticky.insert(user_id, err);
        self
    }

    pub fn attempts(&self, user_id: i64) -> usize {
        lock(&self.attempts).get(&user_id).copied().unwrap_or(0)
    }

    pub fn approved_ids(&self) -> Vec<i64> {
        lock(&self.approved).clone()
    }

    /// References passed to `get_join_requests`, in call order.
    pub fn listed_refs(&self) -> Vec<ChatRef> {
        lock(&self.listed).clone()
    }

    /// References passed to `approve_join_request`, in call order.
    pub fn approval_refs(&self) -> Vec<ChatRef> {
        lock(&self.approved_in).clone()
    }

    pub fn joined_refs(&self) -> Vec<String> {
        lock(&self.joined).clone()
    }

    /// Highest number of approvals observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_result(&self, user_id: i64) -> Result<(), DomainError> {
        *lock(&self.attempts).entry(user_id).or_insert(0) += 1;
        if let Some(err) = self.sticky.get(&user_id) {
            return Err(err.clone());
        }
        if let Some(err) = lock(&self.scripted)
            .get_mut(&user_id)
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }
        Ok(())
    }
}

impl Default for MockTgGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TgGateway for MockTgGateway {
    async fn resolve_chat(&self, chat: &ChatRef) -> Result<Chat, DomainError> {
        if let Some(err) = &self.resolve_error {
            return Err(err.clone());
        }
        info!(chat = %chat, "[MOCK] resolving chat");
        Ok(self.chat.clone())
    }

    async fn get_join_requests(&self, chat: &ChatRef) -> Result<Vec<JoinRequest>, DomainError> {
        lock(&self.listed).push(chat.clone());
        if let Some(err) = &self.list_error {
            return Err(err.clone());
        }
        info!(
            chat = %chat,
            count = self.requests.len(),
            "[MOCK] listing join requests"
        );
        Ok(self.requests.clone())
    }

    async fn approve_join_request(
        &self,
        chat: &ChatRef,
        user_id: i64,
    ) -> Result<(), DomainError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        lock(&self.approved_in).push(chat.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = self.next_result(user_id);
        if result.is_ok() {
            lock(&self.approved).push(user_id);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn join_chat(&self, reference: &str) -> Result<Chat, DomainError> {
        lock(&self.joined).push(reference.to_string());
        if let Some(err) = &self.join_error {
            return Err(err.clone());
        }
        Ok(self.chat.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_errors_then_success() {
        let gw = MockTgGateway::new()
            .fail_then_succeed(7, vec![DomainError::FloodWait { seconds: 1 }]);
        let chat = ChatRef::Id(-100);

        assert!(matches!(
            gw.approve_join_request(&chat, 7).await,
            Err(DomainError::FloodWait { seconds: 1 })
        ));
        assert!(gw.approve_join_request(&chat, 7).await.is_ok());
        assert_eq!(gw.attempts(7), 2);
        assert_eq!(gw.approved_ids(), vec![7]);
    }

    #[test]
    fn test_synthetic_requests() {
        let reqs = synthetic_requests(3);
        assert_eq!(reqs.len(), 3);
        assert_eq!(reqs[0].user_id, 1);
        assert_eq!(reqs[1].username.as_deref(), Some("user2"));
    }
}
