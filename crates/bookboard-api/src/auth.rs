use axum::{Form, extract::State, response::Redirect};
use tracing::{info, warn};

use bookboard_types::api::{LoginForm, RegisterForm};

use crate::error::ApiError;
use crate::passwords::{hash_password, verify_password};
use crate::session::BoardSession;
use crate::state::{AppState, with_db};
use crate::views::{LoginTemplate, RegisterTemplate};

pub async fn register_page(session: BoardSession) -> Result<RegisterTemplate, ApiError> {
    Ok(RegisterTemplate {
        flashes: session.take_flashes().await?,
        username: session.current_user().await?,
    })
}

pub async fn register(
    State(state): State<AppState>,
    session: BoardSession,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect, ApiError> {
    let username = form.username.trim().to_string();
    if username.is_empty() || form.password.is_empty() {
        session.flash("Username and password are required").await?;
        return Ok(Redirect::to("/register"));
    }

    // Checked up front so a taken name does not pay for a hash
    let name = username.clone();
    let taken = with_db(&state, move |db| Ok(db.get_user(&name)?.is_some())).await?;
    if taken {
        session.flash("Username already exists").await?;
        return Ok(Redirect::to("/register"));
    }

    let password_hash = hash_password(&state, form.password).await?;

    let name = username.clone();
    let created = with_db(&state, move |db| db.create_user(&name, &password_hash)).await?;
    if !created {
        session.flash("Username already exists").await?;
        return Ok(Redirect::to("/register"));
    }

    info!("Registered user {}", username);
    session.flash("Registration successful! Please login.").await?;
    Ok(Redirect::to("/login"))
}

pub async fn login_page(session: BoardSession) -> Result<LoginTemplate, ApiError> {
    Ok(LoginTemplate {
        flashes: session.take_flashes().await?,
        username: session.current_user().await?,
    })
}

pub async fn login(
    State(state): State<AppState>,
    session: BoardSession,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, ApiError> {
    let username = form.username.trim().to_string();

    let name = username.clone();
    let stored = with_db(&state, move |db| Ok(db.get_user(&name)?.map(|u| u.password_hash))).await?;

    if !verify_password(&state, form.password, stored).await? {
        warn!("Failed login for {:?}", username);
        session.flash("Invalid credentials").await?;
        return Ok(Redirect::to("/login"));
    }

    session.log_in(&username).await?;
    info!("User {} logged in", username);
    Ok(Redirect::to("/dashboard"))
}

pub async fn logout(session: BoardSession) -> Result<Redirect, ApiError> {
    session.log_out().await?;
    Ok(Redirect::to("/"))
}
