//! Resolution state held by the Telegram gateway between calls.
//!
//! Peers expire after a TTL and are dropped as soon as Telegram rejects them.
//! User access hashes are kept only while an approval for that user is pending.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Duration;

use tokio::time::Instant;

use crate::domain::{ChatRef, DomainError};

/// Resolved peers older than this are resolved again.
pub const PEER_TTL: Duration = Duration::from_secs(600);

struct PeerEntry<V> {
    resolved_at: Instant,
    chat_id: i64,
    value: V,
}

/// Resolved chats by reference. A reference and the canonical id it resolved to
/// share one lifetime: invalidating either drops both.
pub struct PeerCache<V> {
    ttl: Duration,
    entries: HashMap<ChatRef, PeerEntry<V>>,
}

impl<V: Clone> PeerCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn get(&mut self, chat: &ChatRef) -> Option<V> {
        let fresh = self
            .entries
            .get(chat)
            .map(|e| e.resolved_at.elapsed() < self.ttl)?;
        if !fresh {
            self.entries.remove(chat);
            return None;
        }
        self.entries.get(chat).map(|e| e.value.clone())
    }

    /// Store a resolution under `chat` and under `ChatRef::Id(chat_id)`, pruning expired entries.
    pub fn insert(&mut self, chat: ChatRef, chat_id: i64, value: V) {
        let ttl = self.ttl;
        self.entries.retain(|_, e| e.resolved_at.elapsed() < ttl);

        let resolved_at = Instant::now();
        for key in [ChatRef::Id(chat_id), chat] {
            self.entries.insert(
                key,
                PeerEntry {
                    resolved_at,
                    chat_id,
                    value: value.clone(),
                },
            );
        }
    }

    /// Forget `chat` and every other reference that resolved to the same chat.
    pub fn invalidate(&mut self, chat: &ChatRef) {
        let Some(chat_id) = self.entries.get(chat).map(|e| e.chat_id) else {
            return;
        };
        self.entries.retain(|_, e| e.chat_id != chat_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// user_id -> access_hash for join requests awaiting approval.
///
/// Each listing holds one claim per user; a terminal approval result releases it.
#[derive(Debug, Default)]
pub struct AccessHashes {
    entries: HashMap<i64, (i64, usize)>,
}

impl AccessHashes {
    /// Claim the hashes of one completed listing.
    pub fn claim(&mut self, hashes: HashMap<i64, i64>) {
        for (user_id, access_hash) in hashes {
            let entry = self.entries.entry(user_id).or_insert((access_hash, 0));
            entry.0 = access_hash;
            entry.1 += 1;
        }
    }

    pub fn get(&self, user_id: i64) -> Option<i64> {
        self.entries.get(&user_id).map(|(hash, _)| *hash)
    }

    /// Release one claim after an approval attempt. FloodWait keeps it for the retry.
    pub fn settle(&mut self, user_id: i64, result: &Result<(), DomainError>) {
        if matches!(result, Err(DomainError::FloodWait { .. })) {
            return;
        }
        if let Entry::Occupied(mut entry) = self.entries.entry(user_id) {
            entry.get_mut().1 -= 1;
            if entry.get().1 == 0 {
                entry.remove();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(name: &str) -> ChatRef {
        ChatRef::Handle(name.to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn test_peer_cache_aliases_canonical_id() {
        let mut cache = PeerCache::new(PEER_TTL);
        cache.insert(handle("@chan"), -1001, "peer");

        assert_eq!(cache.get(&handle("@chan")), Some("peer"));
        assert_eq!(cache.get(&ChatRef::Id(-1001)), Some("peer"));
        assert_eq!(cache.get(&handle("@other")), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_peer_cache_entries_expire() {
        let mut cache = PeerCache::new(PEER_TTL);
        cache.insert(handle("@chan"), -1001, "peer");

        tokio::time::advance(PEER_TTL).await;

        assert_eq!(cache.get(&handle("@chan")), None);
        assert_eq!(cache.len(), 1, "only the looked-up key is dropped on read");

        cache.insert(handle("@next"), -1002, "next");
        assert_eq!(cache.len(), 2, "insert prunes the remaining stale alias");
    }

    #[tokio::test(start_paused = true)]
    async fn test_peer_cache_invalidate_drops_every_alias() {
        let mut cache = PeerCache::new(PEER_TTL);
        cache.insert(handle("@chan"), -1001, "peer");
        cache.insert(handle("t.me/chan"), -1001, "peer");
        cache.insert(handle("@keep"), -1002, "kept");

        cache.invalidate(&handle("t.me/chan"));

        assert_eq!(cache.get(&handle("@chan")), None);
        assert_eq!(cache.get(&ChatRef::Id(-1001)), None);
        assert_eq!(cache.get(&handle("@keep")), Some("kept"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_access_hash_released_on_terminal_result() {
        let mut hashes = AccessHashes::default();
        hashes.claim(HashMap::from([(1, 111), (2, 222), (3, 333)]));

        hashes.settle(1, &Ok(()));
        hashes.settle(
            2,
            &Err(DomainError::PermanentFailure("USER_CHANNELS_TOO_MUCH".into())),
        );
        hashes.settle(3, &Err(DomainError::TgGateway("INTERNAL (500)".into())));

        assert!(hashes.is_empty());
    }

    #[test]
    fn test_access_hash_kept_across_flood_wait() {
        let mut hashes = AccessHashes::default();
        hashes.claim(HashMap::from([(7, 777)]));

        hashes.settle(7, &Err(DomainError::FloodWait { seconds: 5 }));
        assert_eq!(hashes.get(7), Some(777));

        hashes.settle(7, &Ok(()));
        assert_eq!(hashes.get(7), None);
    }

    #[test]
    fn test_overlapping_listings_each_hold_a_claim() {
        let mut hashes = AccessHashes::default();
        hashes.claim(HashMap::from([(7, 777)]));
        hashes.claim(HashMap::from([(7, 778)]));

        hashes.settle(7, &Ok(()));
        assert_eq!(hashes.get(7), Some(778));

        hashes.settle(7, &Ok(()));
        assert!(hashes.is_empty());

        // Unknown users are ignored.
        hashes.settle(8, &Ok(()));
        assert!(hashes.is_empty());
    }
}
