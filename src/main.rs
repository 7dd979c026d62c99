//! Wiring & DI. Entry point: load config, bootstrap adapters, inject into services, serve.
//! No business logic here.

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use join_approver::adapters::http::{self, AppState};
use join_approver::adapters::telegram::mock_gateway::synthetic_requests;
use join_approver::adapters::telegram::{
    GrammersAuthAdapter, GrammersTgGateway, MockTgGateway, session,
};
use join_approver::adapters::ui::tui::TuiLoginPrompt;
use join_approver::ports::{AuthPort, TgGateway};
use join_approver::shared::config::AppConfig;
use join_approver::usecases::{ApprovalService, AuthService, JoinService};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Synthetic pending requests served in dry-run mode.
const DRY_RUN_REQUESTS: usize = 25;

const MISSING_CREDENTIALS: &str =
    "Set API_ID and API_HASH (env or .env). Get them from https://my.telegram.org";

#[derive(Parser, Debug)]
#[command(name = "join-approver", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP trigger server (default).
    Serve,
    /// Sign in interactively and save the session file used by `serve`.
    Login,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!("no .env found; using process environment"),
    }

    let cli = Cli::parse();
    let cfg = AppConfig::load()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&cfg).await,
        Command::Login => login(&cfg).await,
    }
}

async fn serve(cfg: &AppConfig) -> anyhow::Result<()> {
    let tg: Arc<dyn TgGateway> = if cfg.is_dry_run() {
        warn!(
            requests = DRY_RUN_REQUESTS,
            "APPROVER_DRY_RUN set, using mock Telegram gateway"
        );
        Arc::new(MockTgGateway::new().with_requests(synthetic_requests(DRY_RUN_REQUESTS)))
    } else {
        let client = create_telegram_client(cfg).await?;
        if !auth_service(cfg, client.clone())?.is_authenticated().await? {
            anyhow::bail!(
                "Session at {} is not authorized. Run `join-approver login` first.",
                cfg.session_path_or_default()
            );
        }
        Arc::new(GrammersTgGateway::new(client))
    };

    let batch_size = cfg.batch_size_or_default();
    let default_chat = cfg.default_chat()?;
    match &default_chat {
        Some(chat) => info!(chat = %chat, batch_size, "default chat configured"),
        None => warn!("CHAT_ID not set; GET / will report it as unconfigured"),
    }

    let state = Arc::new(AppState {
        approval: Arc::new(ApprovalService::new(Arc::clone(&tg), batch_size)),
        join: Arc::new(JoinService::new(tg)),
        default_chat,
    });

    http::serve(cfg.bind_addr()?, state).await
}

async fn login(cfg: &AppConfig) -> anyhow::Result<()> {
    let client = create_telegram_client(cfg).await?;
    auth_service(cfg, client)?
        .run_auth_flow(&TuiLoginPrompt::new())
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    info!(
        path = %cfg.session_path_or_default(),
        "session ready; start the server with `join-approver serve`"
    );
    Ok(())
}

fn auth_service(cfg: &AppConfig, client: grammers_client::Client) -> anyhow::Result<AuthService> {
    let Some((_, api_hash)) = cfg.credentials() else {
        anyhow::bail!(MISSING_CREDENTIALS);
    };
    let auth: Arc<dyn AuthPort> = Arc::new(GrammersAuthAdapter::new(client));
    Ok(AuthService::new(auth, api_hash))
}

/// Create grammers Client over the persistent session file. Requires API_ID.
async fn create_telegram_client(cfg: &AppConfig) -> anyhow::Result<grammers_client::Client> {
    let Some((api_id, _)) = cfg.credentials() else {
        anyhow::bail!(MISSING_CREDENTIALS);
    };
    let session_path = PathBuf::from(cfg.session_path_or_default());
    info!(path = %session_path.display(), "opening telegram session");
    session::connect(api_id, &session_path).await
}
