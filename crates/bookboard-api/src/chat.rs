use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, warn};

use bookboard_types::api::SendMessageForm;
use bookboard_types::models::{Message, Sender};
use bookboard_types::timestamp;

use crate::error::ApiError;
use crate::middleware::RequireUser;
use crate::session::BoardSession;
use crate::state::{AppState, with_db};
use crate::views::{ChatTemplate, ConversationsTemplate, ThreadView};

fn chat_path(notice_id: &str) -> String {
    format!("/chat/{}", notice_id)
}

/// GET /chat/{id} — the caller's own thread on one notice.
pub async fn chat_view(
    State(state): State<AppState>,
    session: BoardSession,
    Path(notice_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = notice_id.clone();
    let Some(notice) = with_db(&state, move |db| db.get_notice(&id)).await? else {
        session.flash("Notice not found").await?;
        return Ok(Redirect::to("/").into_response());
    };

    let anon_id = session.anon_id(&notice.id).await?;
    let username = session.current_user().await?;
    let is_owner = notice.is_owned_by(username.as_deref());

    let (id, anon) = (notice.id.clone(), anon_id.clone());
    let messages = with_db(&state, move |db| db.get_thread(&id, &anon)).await?;

    Ok(ChatTemplate {
        flashes: session.take_flashes().await?,
        username,
        notice,
        anon_id,
        messages,
        is_owner,
    }
    .into_response())
}

/// POST /send_dm/{id} — append to the caller's thread.
///
/// The sender is `owner` when the caller owns the notice, but the message
/// still goes into the caller's own anon_id thread like any other visitor's.
pub async fn send_dm(
    State(state): State<AppState>,
    session: BoardSession,
    Path(notice_id): Path<String>,
    Form(form): Form<SendMessageForm>,
) -> Result<Redirect, ApiError> {
    let text = form.message.trim().to_string();
    if text.is_empty() {
        session.flash("Message cannot be empty").await?;
    }

    let id = notice_id.clone();
    let Some(notice) = with_db(&state, move |db| db.get_notice(&id)).await? else {
        session.flash("Notice not found").await?;
        return Ok(Redirect::to("/"));
    };

    if text.is_empty() {
        return Ok(Redirect::to(&chat_path(&notice.id)));
    }

    let anon_id = session.anon_id(&notice.id).await?;
    let username = session.current_user().await?;
    let sender = if notice.is_owned_by(username.as_deref()) {
        Sender::Owner
    } else {
        Sender::Anonymous
    };

    let message = Message {
        sender,
        text,
        timestamp: timestamp::now(),
    };

    let (id, anon) = (notice.id.clone(), anon_id.clone());
    let appended = with_db(&state, move |db| db.append_message(&id, &anon, &message)).await?;
    if !appended {
        // Deleted between the lookup and the insert.
        session.flash("Notice not found").await?;
        return Ok(Redirect::to("/"));
    }

    debug!("{} message on notice {} thread {}", sender, notice.id, anon_id);
    Ok(Redirect::to(&chat_path(&notice.id)))
}

/// GET /conversations/{id} — owner only; every thread on the notice.
pub async fn conversations(
    State(state): State<AppState>,
    RequireUser(username): RequireUser,
    session: BoardSession,
    Path(notice_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = notice_id.clone();
    let notice = with_db(&state, move |db| db.get_notice(&id)).await?;

    let Some(notice) = notice.filter(|n| n.is_owned_by(Some(username.as_str()))) else {
        warn!("{} denied access to conversations of {}", username, notice_id);
        session.flash("Access denied").await?;
        return Ok(Redirect::to("/dashboard").into_response());
    };

    let id = notice.id.clone();
    let threads = with_db(&state, move |db| db.get_threads(&id)).await?;

    Ok(ConversationsTemplate {
        flashes: session.take_flashes().await?,
        username: Some(username),
        notice,
        threads: ThreadView::from_threads(threads),
    }
    .into_response())
}
