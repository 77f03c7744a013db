//! Authentication route handlers.
//!
//! Email + password sign-in and sign-up share one page at `/auth`; results
//! are reported through flash notices.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::PageContext;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_current_user, set_current_user, set_flash};
use crate::models::{CurrentUser, Flash, User};
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Sign in / sign up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/index.html")]
pub struct AuthTemplate {
    pub page: PageContext,
}

/// User-facing notice for a failed login or registration.
fn auth_error_message(error: &AuthError) -> String {
    match error {
        AuthError::InvalidEmail(_) => "Please enter a valid email address.".to_string(),
        AuthError::InvalidCredentials => "Invalid email or password.".to_string(),
        AuthError::UserAlreadyExists => "An account with this email already exists.".to_string(),
        AuthError::WeakPassword(reason) => format!("Password is too weak: {reason}."),
        AuthError::PasswordMismatch => "Passwords do not match.".to_string(),
        AuthError::Repository(_) | AuthError::PasswordHash => {
            "Something went wrong. Please try again.".to_string()
        }
    }
}

/// Store the user in the session and tag Sentry events with them.
async fn log_in(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user))
        .await
        .map_err(|e| AppError::Internal(format!("failed to store session: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Report an auth failure as a flash and send the visitor back to `/auth`.
async fn auth_failed(session: &Session, error: &AuthError) -> Redirect {
    if matches!(error, AuthError::Repository(_) | AuthError::PasswordHash) {
        tracing::error!(error = %error, "Authentication failed");
    } else {
        tracing::info!(error = %error, "Authentication rejected");
    }
    set_flash(session, Flash::error(auth_error_message(error))).await;
    Redirect::to("/auth")
}

// =============================================================================
// Routes
// =============================================================================

/// Display the sign in / sign up page. Logged-in users go home.
pub async fn index(page: PageContext) -> Response {
    if page.user.is_some() {
        return Redirect::to("/").into_response();
    }

    AuthTemplate { page }.into_response()
}

/// Log in with email and password.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let user = match AuthService::new(state.pool())
        .login_with_password(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(e) => return Ok(auth_failed(&session, &e).await),
    };

    log_in(&session, &user).await?;
    tracing::info!(user_id = %user.id, "User logged in");

    set_flash(&session, Flash::success("Welcome back!")).await;
    Ok(Redirect::to("/"))
}

/// Create an account and log it in.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect> {
    let user = match AuthService::new(state.pool())
        .register_with_password(&form.email, &form.password, &form.password_confirm)
        .await
    {
        Ok(user) => user,
        Err(e) => return Ok(auth_failed(&session, &e).await),
    };

    log_in(&session, &user).await?;
    tracing::info!(user_id = %user.id, "User registered");

    set_flash(&session, Flash::success("Your account has been created.")).await;
    Ok(Redirect::to("/"))
}

/// Log out and discard the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("failed to clear session: {e}")))?;
    clear_sentry_user();

    set_flash(&session, Flash::success("You have been logged out.")).await;
    Ok(Redirect::to("/"))
}
