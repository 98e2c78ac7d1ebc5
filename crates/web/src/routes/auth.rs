//! Authentication route handlers.
//!
//! Local email + password accounts. A successful sign-in or sign-up stores a
//! `CurrentIdentity` in the session and redirects to the dashboard.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{
    OptionalIdentity, SIGN_IN_PATH, clear_current_identity, found, set_current_identity,
};
use crate::models::CurrentIdentity;
use crate::services::auth::SignUp;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Sign-in form data.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

/// Sign-up form data.
#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/sign_in.html")]
pub struct SignInTemplate {
    pub email: String,
    pub error: Option<String>,
}

/// Sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/sign_up.html")]
pub struct SignUpTemplate {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub error: Option<String>,
}

impl SignUpTemplate {
    fn refill(form: SignUpForm, error: String) -> Self {
        Self {
            email: form.email,
            first_name: form.first_name.unwrap_or_default(),
            last_name: form.last_name.unwrap_or_default(),
            error: Some(error),
        }
    }
}

/// Put the identity in a fresh session and tag Sentry with it.
async fn sign_in_as(session: &Session, identity: &CurrentIdentity) -> Result<(), AppError> {
    set_current_identity(session, identity)
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;
    set_sentry_user(&identity.id, Some(identity.email.as_str()));
    Ok(())
}

// =============================================================================
// Sign-in
// =============================================================================

/// Display the sign-in page. Signed-in visitors go straight to the dashboard.
pub async fn sign_in_page(OptionalIdentity(identity): OptionalIdentity) -> Response {
    if identity.is_some() {
        return found("/");
    }

    SignInTemplate {
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle sign-in form submission.
///
/// # Errors
///
/// Returns `AppError` for store or session failures. Bad credentials
/// re-render the form with 401.
#[instrument(skip(state, session, form))]
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignInForm>,
) -> Result<Response, AppError> {
    let auth = AuthService::new(state.pool());

    match auth.login_with_password(&form.email, &form.password).await {
        Ok(account) => {
            let identity = CurrentIdentity::from(account);
            sign_in_as(&session, &identity).await?;
            tracing::info!(user_id = %identity.id, "Signed in");
            Ok(found("/"))
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("Sign-in failed: invalid credentials");
            let page = SignInTemplate {
                email: form.email,
                error: Some("Invalid email or password".to_owned()),
            };
            Ok((StatusCode::UNAUTHORIZED, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Sign-up
// =============================================================================

/// Display the sign-up page.
pub async fn sign_up_page(OptionalIdentity(identity): OptionalIdentity) -> Response {
    if identity.is_some() {
        return found("/");
    }

    SignUpTemplate {
        email: String::new(),
        first_name: String::new(),
        last_name: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle sign-up form submission.
///
/// New accounts have no profile yet, so the dashboard sends them on to
/// onboarding.
///
/// # Errors
///
/// Returns `AppError` for store or session failures. Invalid input
/// re-renders the form with 400, a taken email with 409.
#[instrument(skip(state, session, form))]
pub async fn sign_up(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignUpForm>,
) -> Result<Response, AppError> {
    let auth = AuthService::new(state.pool());
    let request = SignUp {
        email: &form.email,
        password: &form.password,
        password_confirm: &form.password_confirm,
        first_name: form.first_name.as_deref(),
        last_name: form.last_name.as_deref(),
    };

    let (status, message) = match auth.register_with_password(&request).await {
        Ok(account) => {
            let identity = CurrentIdentity::from(account);
            sign_in_as(&session, &identity).await?;
            tracing::info!(user_id = %identity.id, "Account created");
            return Ok(found("/"));
        }
        Err(AuthError::InvalidEmail(_)) => {
            (StatusCode::BAD_REQUEST, "Enter a valid email address".to_owned())
        }
        Err(AuthError::WeakPassword(msg)) => (StatusCode::BAD_REQUEST, msg),
        Err(AuthError::AccountAlreadyExists) => (
            StatusCode::CONFLICT,
            "An account with this email already exists".to_owned(),
        ),
        Err(e) => return Err(e.into()),
    };

    Ok((status, SignUpTemplate::refill(form, message)).into_response())
}

// =============================================================================
// Sign-out
// =============================================================================

/// Clear the session identity.
///
/// # Errors
///
/// Returns `AppError::Internal` if the session cannot be modified.
pub async fn sign_out(session: Session) -> Result<Response, AppError> {
    clear_current_identity(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;
    clear_sentry_user();
    Ok(found(SIGN_IN_PATH))
}
