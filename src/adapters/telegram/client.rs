//! Implements TgGateway using grammers Client.
//!
//! Join requests are listed and approved with raw invokes
//! (`messages.getChatInviteImporters` / `messages.hideChatJoinRequest`).
//! Approval calls are single attempts: FloodWait is surfaced to the caller,
//! which owns the retry policy. Listing pages retry FloodWait themselves.
//! User access hashes captured by a listing are held until that user's approval
//! reaches a terminal result.

use crate::adapters::telegram::cache::{AccessHashes, PEER_TTL, PeerCache};
use crate::adapters::telegram::mapper;
use crate::domain::{Chat, ChatRef, DomainError, JoinRequest};
use crate::ports::TgGateway;
use async_trait::async_trait;
use grammers_client::Client;
use grammers_client::tl;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Join requests fetched per listing call (server maximum is 100).
const IMPORTERS_PAGE_SIZE: i32 = 100;

/// FloodWait retries per listing page before the run is aborted.
const LIST_MAX_ATTEMPTS: usize = 3;

type ResolvedPeer = (Chat, tl::enums::InputPeer);

/// Telegram gateway adapter. `Client` is a cheap handle over one sender pool; no lock around calls.
pub struct GrammersTgGateway {
    client: Client,
    /// Resolved chats by reference, so approvals don't re-resolve on every call.
    peer_cache: Mutex<PeerCache<ResolvedPeer>>,
    /// Access hashes of listed users whose approval is still pending.
    user_hashes: Mutex<AccessHashes>,
}

impl GrammersTgGateway {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            peer_cache: Mutex::new(PeerCache::new(PEER_TTL)),
            user_hashes: Mutex::new(AccessHashes::default()),
        }
    }

    /// Resolve a reference to (Chat, InputPeer), using the cache first.
    async fn resolve_peer(&self, chat: &ChatRef) -> Result<ResolvedPeer, DomainError> {
        if let Some(hit) = self.peer_cache.lock().await.get(chat) {
            return Ok(hit);
        }

        let resolved = match chat {
            ChatRef::Id(id) => self.resolve_by_dialog_id(*id).await?,
            ChatRef::Handle(_) => {
                if let Some(hash) = chat.invite_hash() {
                    self.resolve_invite(hash).await?
                } else if let Some(name) = chat.username() {
                    self.resolve_username(name).await?
                } else {
                    return Err(DomainError::InvalidReference);
                }
            }
        };

        debug!(chat = %chat, chat_id = resolved.0.id, "resolved peer");
        self.peer_cache
            .lock()
            .await
            .insert(chat.clone(), resolved.0.id, resolved.clone());
        Ok(resolved)
    }

    /// A reference Telegram rejects is resolved afresh next time.
    async fn forget_if_invalid<T>(
        &self,
        chat: &ChatRef,
        result: Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        if matches!(result, Err(DomainError::InvalidReference)) {
            debug!(chat = %chat, "dropping cached peer");
            self.peer_cache.lock().await.invalidate(chat);
        }
        result
    }

    /// Numeric ids carry no access hash; find the chat among our dialogs.
    async fn resolve_by_dialog_id(&self, chat_id: i64) -> Result<ResolvedPeer, DomainError> {
        let mut dialogs = self.client.iter_dialogs();
        while let Some(dialog) = dialogs.next().await.map_err(mapper::map_invocation_error)? {
            let peer = dialog.peer();
            if peer.id().bot_api_dialog_id() != chat_id {
                continue;
            }
            let chat = Chat {
                id: chat_id,
                title: peer.name().map(String::from).unwrap_or_else(|| chat_id.to_string()),
                username: peer.username().map(String::from),
            };
            let peer_ref = peer
                .to_ref()
                .await
                .ok_or_else(|| DomainError::TgGateway("peer not in session cache".into()))?;
            return Ok((chat, peer_ref.into()));
        }
        Err(DomainError::InvalidReference)
    }

    async fn resolve_username(&self, username: &str) -> Result<ResolvedPeer, DomainError> {
        let peer = self
            .client
            .resolve_username(username)
            .await
            .map_err(mapper::map_invocation_error)?
            .ok_or(DomainError::InvalidReference)?;
        let id = peer.id().bot_api_dialog_id();
        let chat = Chat {
            id,
            title: peer.name().map(String::from).unwrap_or_else(|| username.to_string()),
            username: peer.username().map(String::from),
        };
        let peer_ref = peer
            .to_ref()
            .await
            .ok_or_else(|| DomainError::TgGateway("peer not in session cache".into()))?;
        Ok((chat, peer_ref.into()))
    }

    /// Private invite: only usable if we are already a member.
    async fn resolve_invite(&self, hash: &str) -> Result<ResolvedPeer, DomainError> {
        let req = tl::functions::messages::CheckChatInvite {
            hash: hash.to_string(),
        };
        match self
            .client
            .invoke(&req)
            .await
            .map_err(mapper::map_invocation_error)?
        {
            tl::enums::ChatInvite::Already(already) => {
                mapper::tl_chat_to_domain(&already.chat).ok_or_else(|| {
                    DomainError::TgGateway("invite points to an inaccessible chat".into())
                })
            }
            _ => Err(DomainError::TgGateway(
                "not a member of the invited chat; join it first".into(),
            )),
        }
    }

    async fn fetch_importers_page(
        &self,
        peer: &tl::enums::InputPeer,
        offset_date: i32,
        offset_user: &tl::enums::InputUser,
    ) -> Result<mapper::ImporterPage, DomainError> {
        let req = tl::functions::messages::GetChatInviteImporters {
            requested: true,
            subscription_expired: false,
            peer: peer.clone(),
            link: None,
            q: None,
            offset_date,
            offset_user: offset_user.clone(),
            limit: IMPORTERS_PAGE_SIZE,
        };

        for attempt in 1..=LIST_MAX_ATTEMPTS {
            match self.client.invoke(&req).await.map_err(mapper::map_invocation_error) {
                Ok(raw) => return Ok(mapper::importers_to_domain(raw)),
                Err(DomainError::FloodWait { seconds }) if attempt < LIST_MAX_ATTEMPTS => {
                    warn!(attempt, wait_secs = seconds, "FloodWait while listing, sleeping");
                    tokio::time::sleep(Duration::from_secs(seconds)).await;
                }
                Err(e) => return Err(e),
            }
        }
        Err(DomainError::TgGateway("FloodWait max retries".into()))
    }

    async fn input_user(&self, user_id: i64) -> Result<tl::enums::InputUser, DomainError> {
        let access_hash = self.user_hashes.lock().await.get(user_id).ok_or_else(|| {
            DomainError::PermanentFailure(format!("user {} not resolvable", user_id))
        })?;
        Ok(tl::enums::InputUser::User(tl::types::InputUser {
            user_id,
            access_hash,
        }))
    }

    async fn hide_join_request(&self, chat: &ChatRef, user_id: i64) -> Result<(), DomainError> {
        let (_, peer) = self.resolve_peer(chat).await?;
        let req = tl::functions::messages::HideChatJoinRequest {
            approved: true,
            peer,
            user_id: self.input_user(user_id).await?,
        };
        self.client
            .invoke(&req)
            .await
            .map_err(mapper::map_invocation_error)?;
        Ok(())
    }

    async fn list_join_requests(
        &self,
        chat: &ChatRef,
    ) -> Result<(Vec<JoinRequest>, HashMap<i64, i64>), DomainError> {
        let (resolved, peer) = self.resolve_peer(chat).await?;

        let mut out: Vec<JoinRequest> = Vec::new();
        let mut hashes: HashMap<i64, i64> = HashMap::new();
        let mut offset_date = 0;
        let mut offset_user = tl::enums::InputUser::Empty;
        loop {
            let page = self
                .fetch_importers_page(&peer, offset_date, &offset_user)
                .await?;
            let fetched = page.requests.len();
            hashes.extend(page.access_hashes);

            let Some(last) = page.requests.last() else {
                break;
            };
            offset_date = last.date as i32;
            offset_user = match hashes.get(&last.user_id) {
                Some(&access_hash) => tl::enums::InputUser::User(tl::types::InputUser {
                    user_id: last.user_id,
                    access_hash,
                }),
                None => tl::enums::InputUser::Empty,
            };
            out.extend(page.requests);

            if fetched < IMPORTERS_PAGE_SIZE as usize || out.len() >= page.total {
                break;
            }
        }

        info!(
            chat_id = resolved.id,
            pending = out.len(),
            "fetched join requests"
        );
        Ok((out, hashes))
    }
}

#[async_trait]
impl TgGateway for GrammersTgGateway {
    async fn resolve_chat(&self, chat: &ChatRef) -> Result<Chat, DomainError> {
        self.resolve_peer(chat).await.map(|(chat, _)| chat)
    }

    async fn get_join_requests(&self, chat: &ChatRef) -> Result<Vec<JoinRequest>, DomainError> {
        let listed = self.list_join_requests(chat).await;
        let (requests, hashes) = self.forget_if_invalid(chat, listed).await?;
        // Claimed only once the whole listing succeeded; each approval releases its user.
        self.user_hashes.lock().await.claim(hashes);
        Ok(requests)
    }

    async fn approve_join_request(
        &self,
        chat: &ChatRef,
        user_id: i64,
    ) -> Result<(), DomainError> {
        let result = self.hide_join_request(chat, user_id).await;
        self.user_hashes.lock().await.settle(user_id, &result);
        self.forget_if_invalid(chat, result).await
    }

    async fn join_chat(&self, reference: &str) -> Result<Chat, DomainError> {
        let chat_ref = ChatRef::parse(reference)?;

        if let Some(hash) = chat_ref.invite_hash() {
            let req = tl::functions::messages::ImportChatInvite {
                hash: hash.to_string(),
            };
            return match self.client.invoke(&req).await {
                Ok(updates) => mapper::chat_from_updates(&updates)
                    .map(|(chat, _)| chat)
                    .ok_or_else(|| {
                        DomainError::TgGateway("joined, but no chat in response".into())
                    }),
                Err(grammers_client::InvocationError::Rpc(rpc))
                    if rpc.name == "USER_ALREADY_PARTICIPANT" =>
                {
                    self.resolve_invite(hash).await.map(|(chat, _)| chat)
                }
                Err(e) => Err(mapper::map_invocation_error(e)),
            };
        }

        let (chat, peer) = self.resolve_peer(&chat_ref).await?;
        let tl::enums::InputPeer::Channel(channel) = peer else {
            // Basic groups and numeric ids can only be "joined" if we are already in them.
            return Ok(chat);
        };
        let req = tl::functions::channels::JoinChannel {
            channel: tl::enums::InputChannel::Channel(tl::types::InputChannel {
                channel_id: channel.channel_id,
                access_hash: channel.access_hash,
            }),
        };
        self.client
            .invoke(&req)
            .await
            .map_err(mapper::map_invocation_error)?;
        Ok(chat)
    }
}
