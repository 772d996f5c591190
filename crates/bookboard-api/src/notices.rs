use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use tracing::{info, warn};

use bookboard_db::queries::DeleteOutcome;
use bookboard_types::api::PostNoticeForm;
use bookboard_types::ids;
use bookboard_types::models::Notice;
use bookboard_types::timestamp;

use crate::error::ApiError;
use crate::middleware::RequireUser;
use crate::session::BoardSession;
use crate::state::{AppState, with_db};
use crate::views::{DashboardEntry, DashboardTemplate, IndexTemplate, ThreadView};

/// Attempts at drawing an unused notice id before giving up.
const MAX_ID_ATTEMPTS: usize = 8;

/// GET / — every notice, newest first.
pub async fn index(
    State(state): State<AppState>,
    session: BoardSession,
) -> Result<IndexTemplate, ApiError> {
    let notices = with_db(&state, |db| db.list_notices()).await?;

    Ok(IndexTemplate {
        flashes: session.take_flashes().await?,
        username: session.current_user().await?,
        notices,
    })
}

/// GET /dashboard — the caller's notices with all of their threads.
pub async fn dashboard(
    State(state): State<AppState>,
    RequireUser(username): RequireUser,
    session: BoardSession,
) -> Result<DashboardTemplate, ApiError> {
    let owner = username.clone();
    let (notices, mut threads) = with_db(&state, move |db| {
        let notices = db.list_notices_by_owner(&owner)?;
        let ids: Vec<String> = notices.iter().map(|n| n.id.clone()).collect();
        let threads = db.get_threads_for_notices(&ids)?;
        Ok((notices, threads))
    })
    .await?;

    let entries = notices
        .into_iter()
        .map(|notice| {
            let threads = ThreadView::from_threads(threads.remove(&notice.id).unwrap_or_default());
            DashboardEntry { notice, threads }
        })
        .collect();

    Ok(DashboardTemplate {
        flashes: session.take_flashes().await?,
        username: Some(username),
        entries,
    })
}

/// POST /post_notice
pub async fn post_notice(
    State(state): State<AppState>,
    RequireUser(username): RequireUser,
    session: BoardSession,
    Form(form): Form<PostNoticeForm>,
) -> Result<Redirect, ApiError> {
    let book_name = form.book_name.trim().to_string();
    let description = form.description.trim().to_string();

    if book_name.is_empty() {
        session.flash("Book name is required").await?;
        return Ok(Redirect::to("/dashboard"));
    }

    let owner = username.clone();
    let notice = with_db(&state, move |db| {
        for _ in 0..MAX_ID_ATTEMPTS {
            let notice = Notice {
                id: ids::new_notice_id(),
                owner: owner.clone(),
                book_name: book_name.clone(),
                description: description.clone(),
                timestamp: timestamp::now(),
            };
            if db.insert_notice(&notice)? {
                return Ok(notice);
            }
        }
        anyhow::bail!("no unused notice id after {} attempts", MAX_ID_ATTEMPTS)
    })
    .await?;

    info!("Notice {} ({:?}) posted by {}", notice.id, notice.book_name, username);
    session.flash("Notice posted successfully!").await?;
    Ok(Redirect::to("/dashboard"))
}

/// GET /delete_notice/{id} — owner only; removes the notice and every thread on it.
pub async fn delete_notice(
    State(state): State<AppState>,
    RequireUser(username): RequireUser,
    session: BoardSession,
    Path(notice_id): Path<String>,
) -> Result<Redirect, ApiError> {
    let (id, owner) = (notice_id.clone(), username.clone());
    let outcome = with_db(&state, move |db| db.delete_notice(&id, &owner)).await?;

    match outcome {
        DeleteOutcome::Deleted { messages } => {
            info!("Notice {} deleted by {} ({} messages removed)", notice_id, username, messages);
            session.flash("Notice deleted successfully!").await?;
        }
        DeleteOutcome::NotFound => {
            session.flash("Notice not found").await?;
        }
        DeleteOutcome::NotOwner => {
            warn!("{} tried to delete notice {} they do not own", username, notice_id);
            session.flash("Access denied").await?;
        }
    }

    Ok(Redirect::to("/dashboard"))
}
