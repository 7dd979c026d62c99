//! Bulk approval of pending join requests.
//!
//! - Drains the full pending list before any approval starts
//! - Approves in fixed-size batches; every request of a batch runs concurrently,
//!   the next batch starts only once the whole batch has a terminal outcome
//! - FloodWait is waited out and the same approval retried, with no retry cap
//! - Per-user failures collapse into `Skipped`; only chat resolution/listing
//!   failures abort a run

use crate::domain::{ApprovalOutcome, BatchResult, ChatRef, DomainError, JoinRequest, RunSummary};
use crate::ports::TgGateway;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Approvals in flight per batch when not configured.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Approval service. Shares one gateway (one session) across all concurrent attempts.
pub struct ApprovalService {
    tg: Arc<dyn TgGateway>,
    batch_size: usize,
}

impl ApprovalService {
    /// `batch_size` of 0 is treated as 1.
    pub fn new(tg: Arc<dyn TgGateway>, batch_size: usize) -> Self {
        Self {
            tg,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Resolve the reference to its canonical chat, then approve everything pending there.
    pub async fn run_for_chat(&self, chat: &ChatRef) -> Result<RunSummary, DomainError> {
        let resolved = self.tg.resolve_chat(chat).await?;
        info!(
            chat_id = resolved.id,
            title = %resolved.title,
            "resolved chat"
        );
        let target = ChatRef::Id(resolved.id);
        let requests = self.tg.get_join_requests(&target).await?;
        Ok(self.approve_all(&target, &requests).await)
    }

    /// Approve everything pending in the chat named by `chat`, passing the raw
    /// reference straight to the gateway.
    pub async fn run_for_reference(&self, chat: &ChatRef) -> Result<RunSummary, DomainError> {
        let requests = self.tg.get_join_requests(chat).await?;
        Ok(self.approve_all(chat, &requests).await)
    }

    /// Batch pipeline. Never fails: every request ends up counted once.
    pub async fn approve_all(&self, chat: &ChatRef, requests: &[JoinRequest]) -> RunSummary {
        info!(
            chat = %chat,
            pending = requests.len(),
            batch_size = self.batch_size,
            "approving join requests"
        );

        let mut summary = RunSummary::default();
        for (index, batch) in requests.chunks(self.batch_size).enumerate() {
            let results: BatchResult =
                join_all(batch.iter().map(|req| self.approve_user(chat, req))).await;
            summary.record(&results);
            debug!(
                batch = index + 1,
                size = batch.len(),
                approved = summary.approved,
                skipped = summary.skipped,
                "batch complete"
            );
        }

        info!(
            chat = %chat,
            approved = summary.approved,
            skipped = summary.skipped,
            "run complete"
        );
        summary
    }

    /// Approve one request, retrying for as long as Telegram keeps answering FloodWait.
    pub async fn approve_user(&self, chat: &ChatRef, req: &JoinRequest) -> ApprovalOutcome {
        loop {
            match self.tg.approve_join_request(chat, req.user_id).await {
                Ok(()) => {
                    info!(user_id = req.user_id, user = %req, "approved");
                    return ApprovalOutcome::Approved;
                }
                Err(DomainError::FloodWait { seconds }) => {
                    warn!(
                        user_id = req.user_id,
                        wait_secs = seconds,
                        "FloodWait, sleeping before retry"
                    );
                    tokio::time::sleep(Duration::from_secs(seconds)).await;
                }
                Err(e) if e.is_permanent() => {
                    warn!(user_id = req.user_id, user = %req, reason = %e, "skipped");
                    return ApprovalOutcome::Skipped;
                }
                Err(e) => {
                    error!(
                        user_id = req.user_id,
                        user = %req,
                        error = %e,
                        "approval failed, skipping"
                    );
                    return ApprovalOutcome::Skipped;
                }
            }
        }
    }
}
