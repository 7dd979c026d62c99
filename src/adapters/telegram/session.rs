//! Session storage and client bootstrap.
//!
//! The session is a grammers SQLite file created once by `login` and reused by
//! `serve`; it is the long-lived credential the server authenticates with.

use grammers_client::{Client, SenderPool};
use grammers_session::storages::SqliteSession;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Opens (or creates) the session file. Parent directories are created as needed.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, or if the
/// SQLite database cannot be opened (e.g. permissions, disk full).
pub async fn open_file_session(path: impl AsRef<Path>) -> anyhow::Result<SqliteSession> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| anyhow::anyhow!("create session directory: {}", e))?;
    }
    SqliteSession::open(path)
        .await
        .map_err(|e| anyhow::anyhow!("open session file {}: {}", path.display(), e))
}

/// Build a client on top of the session and spawn its network runner on the current runtime.
pub async fn connect(api_id: i32, session_path: &Path) -> anyhow::Result<Client> {
    let session = Arc::new(open_file_session(session_path).await?);
    let pool = SenderPool::new(session, api_id);
    let handle = pool.handle.clone();
    tokio::spawn(async move {
        pool.runner.run().await;
    });
    debug!(path = %session_path.display(), "telegram sender pool started");
    Ok(Client::new(handle))
}
