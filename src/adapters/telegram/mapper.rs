//! Map Grammers types and errors to domain entities.
//!
//! Extracts Chat, JoinRequest from grammers_client tl types and classifies
//! InvocationError into DomainError.

use crate::domain::{Chat, DomainError, JoinRequest};
use grammers_client::InvocationError;
use grammers_client::tl;
use std::collections::HashMap;

/// RPC errors meaning the user can never be approved into this chat.
const PERMANENT_ERRORS: &[&str] = &[
    "USER_CHANNELS_TOO_MUCH",
    "USER_DEACTIVATED",
    "USER_DEACTIVATED_BAN",
    "PEER_ID_INVALID",
    "USER_ID_INVALID",
];

/// RPC errors meaning the chat reference itself is unusable.
const INVALID_REFERENCE_ERRORS: &[&str] = &[
    "INVITE_HASH_INVALID",
    "INVITE_HASH_EXPIRED",
    "INVITE_HASH_EMPTY",
    "USERNAME_INVALID",
    "USERNAME_NOT_OCCUPIED",
    "CHANNEL_INVALID",
    "CHAT_ID_INVALID",
];

/// Seconds to wait when a FloodWait carries no value.
const DEFAULT_FLOOD_WAIT_SECS: u64 = 60;

/// Classify an RPC error by code / name (name has the numeric suffix already split into `value`).
pub fn classify_rpc(code: i32, name: &str, value: Option<u32>) -> DomainError {
    if code == 420 || name == "FLOOD_WAIT" || name == "FLOOD_PREMIUM_WAIT" {
        return DomainError::FloodWait {
            seconds: value.map(u64::from).unwrap_or(DEFAULT_FLOOD_WAIT_SECS),
        };
    }
    if PERMANENT_ERRORS.contains(&name) {
        return DomainError::PermanentFailure(name.to_string());
    }
    if INVALID_REFERENCE_ERRORS.contains(&name) {
        return DomainError::InvalidReference;
    }
    DomainError::TgGateway(format!("{} ({})", name, code))
}

pub fn map_invocation_error(e: InvocationError) -> DomainError {
    match e {
        InvocationError::Rpc(rpc) => classify_rpc(rpc.code, &rpc.name, rpc.value),
        other => DomainError::TgGateway(other.to_string()),
    }
}

/// Bot-API dialog id for a channel / supergroup.
pub fn channel_dialog_id(channel_id: i64) -> i64 {
    -1_000_000_000_000 - channel_id
}

/// Basic group: dialog id is the negated chat id.
fn group_to_domain(chat_id: i64, title: &str) -> (Chat, tl::enums::InputPeer) {
    (
        Chat {
            id: -chat_id,
            title: title.to_string(),
            username: None,
        },
        tl::enums::InputPeer::Chat(tl::types::InputPeerChat { chat_id }),
    )
}

/// Channel or supergroup. Without an access hash it cannot be addressed.
fn channel_to_domain(
    channel_id: i64,
    title: &str,
    username: Option<&str>,
    access_hash: Option<i64>,
) -> Option<(Chat, tl::enums::InputPeer)> {
    Some((
        Chat {
            id: channel_dialog_id(channel_id),
            title: title.to_string(),
            username: username.map(String::from),
        },
        tl::enums::InputPeer::Channel(tl::types::InputPeerChannel {
            channel_id,
            access_hash: access_hash?,
        }),
    ))
}

/// Map a tl Chat (basic group or channel) to domain Chat plus the InputPeer used to address it.
pub fn tl_chat_to_domain(chat: &tl::enums::Chat) -> Option<(Chat, tl::enums::InputPeer)> {
    match chat {
        tl::enums::Chat::Chat(c) => Some(group_to_domain(c.id, &c.title)),
        tl::enums::Chat::Channel(c) => {
            channel_to_domain(c.id, &c.title, c.username.as_deref(), c.access_hash)
        }
        _ => None,
    }
}

/// First chat carried by an Updates result (join / import invite).
pub fn chat_from_updates(updates: &tl::enums::Updates) -> Option<(Chat, tl::enums::InputPeer)> {
    let chats = match updates {
        tl::enums::Updates::Updates(u) => &u.chats,
        tl::enums::Updates::Combined(u) => &u.chats,
        _ => return None,
    };
    chats.iter().find_map(tl_chat_to_domain)
}

/// One page of `messages.getChatInviteImporters`, with the access hash of each user.
pub struct ImporterPage {
    pub requests: Vec<JoinRequest>,
    pub access_hashes: HashMap<i64, i64>,
    pub total: usize,
}

/// What a join request needs from the requesting user.
#[derive(Debug, Clone, Default)]
struct ImporterUser {
    first_name: Option<String>,
    username: Option<String>,
    access_hash: Option<i64>,
}

impl From<tl::types::User> for ImporterUser {
    fn from(u: tl::types::User) -> Self {
        Self {
            first_name: u.first_name,
            username: u.username,
            access_hash: u.access_hash,
        }
    }
}

pub fn importers_to_domain(page: tl::enums::messages::ChatInviteImporters) -> ImporterPage {
    let tl::enums::messages::ChatInviteImporters::ChatInviteImporters(page) = page;

    let users: HashMap<i64, ImporterUser> = page
        .users
        .into_iter()
        .filter_map(|u| match u {
            tl::enums::User::User(u) => Some((u.id, ImporterUser::from(u))),
            tl::enums::User::Empty(_) => None,
        })
        .collect();
    let importers = page
        .importers
        .into_iter()
        .map(|importer| {
            let tl::enums::ChatInviteImporter::ChatInviteImporter(imp) = importer;
            (imp.user_id, imp.date)
        })
        .collect();

    build_importer_page(importers, &users, page.count)
}

/// Join requests in server order. A user missing from `users` still yields a request,
/// named by id and without an access hash.
fn build_importer_page(
    importers: Vec<(i64, i32)>,
    users: &HashMap<i64, ImporterUser>,
    count: i32,
) -> ImporterPage {
    let mut requests = Vec::with_capacity(importers.len());
    let mut access_hashes = HashMap::new();
    for (user_id, date) in importers {
        let user = users.get(&user_id);
        if let Some(hash) = user.and_then(|u| u.access_hash) {
            access_hashes.insert(user_id, hash);
        }
        requests.push(JoinRequest {
            user_id,
            first_name: user
                .and_then(|u| u.first_name.clone())
                .unwrap_or_else(|| user_id.to_string()),
            username: user.and_then(|u| u.username.clone()),
            date: date as i64,
        });
    }

    ImporterPage {
        requests,
        access_hashes,
        total: count.max(0) as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_flood_wait() {
        assert_eq!(
            classify_rpc(420, "FLOOD_WAIT", Some(31)),
            DomainError::FloodWait { seconds: 31 }
        );
        assert_eq!(
            classify_rpc(420, "FLOOD_WAIT", None),
            DomainError::FloodWait { seconds: 60 }
        );
    }

    #[test]
    fn test_classify_permanent() {
        for name in ["USER_CHANNELS_TOO_MUCH", "USER_DEACTIVATED", "PEER_ID_INVALID"] {
            assert!(classify_rpc(400, name, None).is_permanent(), "{}", name);
        }
    }

    #[test]
    fn test_classify_invalid_reference() {
        assert_eq!(
            classify_rpc(400, "INVITE_HASH_INVALID", None),
            DomainError::InvalidReference
        );
        assert_eq!(
            classify_rpc(400, "USERNAME_NOT_OCCUPIED", None),
            DomainError::InvalidReference
        );
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(
            classify_rpc(400, "HIDE_REQUESTER_MISSING", None),
            DomainError::TgGateway("HIDE_REQUESTER_MISSING (400)".into())
        );
    }

    #[test]
    fn test_channel_dialog_id() {
        assert_eq!(channel_dialog_id(1234567890), -1001234567890);
    }

    #[test]
    fn test_group_maps_to_negated_id() {
        let (chat, peer) = group_to_domain(4242, "Book Club");

        assert_eq!(
            chat,
            Chat {
                id: -4242,
                title: "Book Club".into(),
                username: None,
            }
        );
        assert!(matches!(
            peer,
            tl::enums::InputPeer::Chat(tl::types::InputPeerChat { chat_id: 4242 })
        ));
    }

    #[test]
    fn test_channel_maps_to_dialog_id() {
        let (chat, peer) =
            channel_to_domain(1234567890, "Rust Jobs", Some("rustjobs"), Some(99)).unwrap();

        assert_eq!(chat.id, -1001234567890);
        assert_eq!(chat.title, "Rust Jobs");
        assert_eq!(chat.username.as_deref(), Some("rustjobs"));
        assert!(matches!(
            peer,
            tl::enums::InputPeer::Channel(tl::types::InputPeerChannel {
                channel_id: 1234567890,
                access_hash: 99,
            })
        ));
    }

    #[test]
    fn test_channel_without_access_hash_is_unaddressable() {
        assert!(channel_to_domain(1234567890, "Rust Jobs", None, None).is_none());
    }

    #[test]
    fn test_importer_page_maps_users() {
        let users = HashMap::from([
            (
                1,
                ImporterUser {
                    first_name: Some("Alice".into()),
                    username: Some("alice".into()),
                    access_hash: Some(111),
                },
            ),
            (2, ImporterUser::default()),
        ]);

        let page = build_importer_page(vec![(1, 1_700_000_010), (2, 1_700_000_005)], &users, 2);

        assert_eq!(
            page.requests,
            vec![
                JoinRequest {
                    user_id: 1,
                    first_name: "Alice".into(),
                    username: Some("alice".into()),
                    date: 1_700_000_010,
                },
                JoinRequest {
                    user_id: 2,
                    first_name: "2".into(),
                    username: None,
                    date: 1_700_000_005,
                },
            ]
        );
        assert_eq!(page.access_hashes, HashMap::from([(1, 111)]));
        assert_eq!(page.total, 2);
    }

    #[test]
    fn test_importer_page_tolerates_unknown_users() {
        let page = build_importer_page(vec![(9, 1_700_000_000)], &HashMap::new(), -1);

        assert_eq!(page.requests.len(), 1);
        assert_eq!(page.requests[0].first_name, "9");
        assert!(page.access_hashes.is_empty());
        assert_eq!(page.total, 0);
    }
}
