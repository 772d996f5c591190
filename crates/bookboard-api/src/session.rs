//! Typed access to the per-browser session.
//!
//! The session holds three kinds of entries: the authenticated username, one
//! anonymous id per notice the browser has talked about (`anon_id_{notice_id}`),
//! and pending flash messages.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use tower_sessions::Session;

use bookboard_types::ids;

use crate::error::ApiError;

/// Session keys.
pub mod keys {
    /// Username of the logged-in user.
    pub const CURRENT_USER: &str = "username";

    /// Pending one-shot messages for the next rendered page.
    pub const FLASHES: &str = "_flashes";

    pub fn anon_id(notice_id: &str) -> String {
        format!("anon_id_{}", notice_id)
    }
}

/// Extractor wrapping the `tower-sessions` session set by `SessionManagerLayer`.
#[derive(Clone)]
pub struct BoardSession(Session);

impl<S> FromRequestParts<S> for BoardSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(Self)
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "session layer missing"))
    }
}

impl BoardSession {
    pub async fn current_user(&self) -> Result<Option<String>, ApiError> {
        Ok(self.0.get::<String>(keys::CURRENT_USER).await?)
    }

    /// Mark the session as authenticated. The session id is rotated first.
    pub async fn log_in(&self, username: &str) -> Result<(), ApiError> {
        self.0.cycle_id().await?;
        self.0.insert(keys::CURRENT_USER, username).await?;
        Ok(())
    }

    /// Drop everything: login, anonymous ids and pending flashes.
    pub async fn log_out(&self) -> Result<(), ApiError> {
        self.0.flush().await?;
        Ok(())
    }

    /// The caller's anonymous id for `notice_id`, allocated on first use.
    pub async fn anon_id(&self, notice_id: &str) -> Result<String, ApiError> {
        let key = keys::anon_id(notice_id);
        if let Some(existing) = self.0.get::<String>(&key).await? {
            return Ok(existing);
        }

        let anon_id = ids::new_anon_id();
        self.0.insert(&key, &anon_id).await?;
        Ok(anon_id)
    }

    pub async fn flash(&self, message: impl Into<String>) -> Result<(), ApiError> {
        let mut flashes: Vec<String> = self.0.get(keys::FLASHES).await?.unwrap_or_default();
        flashes.push(message.into());
        self.0.insert(keys::FLASHES, flashes).await?;
        Ok(())
    }

    pub async fn take_flashes(&self) -> Result<Vec<String>, ApiError> {
        Ok(self.0.remove::<Vec<String>>(keys::FLASHES).await?.unwrap_or_default())
    }
}
