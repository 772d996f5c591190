use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};

use crate::session::BoardSession;

/// Extractor for routes that need a logged-in user. Anonymous callers are
/// redirected to `/login`.
pub struct RequireUser(pub String);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = BoardSession::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match session.current_user().await {
            Ok(Some(username)) => Ok(Self(username)),
            Ok(None) => Err(Redirect::to("/login").into_response()),
            Err(e) => Err(e.into_response()),
        }
    }
}
