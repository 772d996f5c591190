mod config;
mod legacy;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use argon2::Argon2;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::{Key, SameSite, time::Duration};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tracing::info;

use bookboard_api::passwords::Passwords;
use bookboard_api::router::routes;
use bookboard_api::state::{AppState, AppStateInner};
use bookboard_db::Database;

use crate::config::ServerConfig;

const SESSION_COOKIE_NAME: &str = "bookboard_session";

/// Sessions expire after a week without requests.
const SESSION_INACTIVITY_DAYS: i64 = 7;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Serve,
    Import(PathBuf),
    Export(PathBuf),
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        match args {
            [_] => Ok(Self::Serve),
            [_, cmd] if cmd == "serve" => Ok(Self::Serve),
            [_, cmd, dir] if cmd == "import" => Ok(Self::Import(dir.into())),
            [_, cmd, dir] if cmd == "export" => Ok(Self::Export(dir.into())),
            _ => bail!("usage: bookboard [serve | import <dir> | export <dir>]"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bookboard_server=debug,bookboard_api=debug,bookboard_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = Command::parse(&args)?;
    let config = ServerConfig::from_env()?;

    let db = Database::open(&config.db_path)?;
    let passwords = Passwords::new(Argon2::default()).map_err(|e| anyhow!("argon2 setup failed: {}", e))?;

    match command {
        Command::Serve => {
            let state: AppState = Arc::new(AppStateInner { db, passwords });
            serve(state, &config).await
        }
        Command::Import(dir) => legacy::import(&db, &passwords, &dir),
        Command::Export(dir) => legacy::export(&db, &dir),
    }
}

async fn serve(state: AppState, config: &ServerConfig) -> Result<()> {
    let key = match &config.session_secret {
        Some(secret) => Key::try_from(secret.as_bytes())
            .map_err(|e| anyhow!("BOOKBOARD_SESSION_SECRET must be at least 64 bytes: {:?}", e))?,
        None => {
            info!("BOOKBOARD_SESSION_SECRET not set, signing session cookies with a random key");
            Key::generate()
        }
    };

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_INACTIVITY_DAYS)))
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key);

    let app = routes(state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Bookboard listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
