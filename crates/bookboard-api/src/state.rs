use std::sync::Arc;

use bookboard_db::Database;

use crate::error::ApiError;
use crate::passwords::Passwords;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub passwords: Passwords,
}

/// Run a database call off the async runtime.
pub async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    let out = tokio::task::spawn_blocking(move || f(&state.db)).await??;
    Ok(out)
}
