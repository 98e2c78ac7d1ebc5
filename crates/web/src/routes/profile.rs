//! Profile editor: onboarding, editing, and the upsert form endpoint.
//!
//! ```text
//! GET  /onboarding                - Editor for first-time users
//! GET  /profile/edit              - Editor pre-filled from the saved profile
//! POST /resources/profile-editor  - Add/remove a corgi row, or save
//! ```

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use santa_paws_core::UsState;

use crate::error::AppError;
use crate::filters;
use crate::forms::profile::DEFAULT_REDIRECT;
use crate::forms::{CorgiForm, FieldErrors, FormPairs, ProfileForm, field};
use crate::middleware::{RequireIdentity, found};
use crate::services::ProfileService;
use crate::state::AppState;

/// Hidden field naming the page the editor was opened from.
const EDITOR_FIELD: &str = "editor";

/// Which page hosts the editor; re-renders keep the same heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorPage {
    Onboarding,
    Edit,
}

impl EditorPage {
    /// Page heading.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Onboarding => "Welcome! Tell us about your corgis",
            Self::Edit => "Edit your profile",
        }
    }

    /// Value of the hidden `editor` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Onboarding => "onboarding",
            Self::Edit => "edit",
        }
    }

    /// Read the page back from a submission; anything unknown is the edit page.
    fn from_pairs(pairs: &[(String, String)]) -> Self {
        match field(pairs, EDITOR_FIELD) {
            Some("onboarding") => Self::Onboarding,
            _ => Self::Edit,
        }
    }
}

/// One corgi sub-form with its position and messages.
pub struct CorgiRow {
    pub index: usize,
    pub corgi: CorgiForm,
    pub id_error: String,
    pub name_error: String,
    pub birth_date_error: String,
    pub image_uri_error: String,
}

/// Profile editor template.
#[derive(Template, WebTemplate)]
#[template(path = "profile_editor.html")]
pub struct ProfileEditorTemplate {
    pub page: EditorPage,
    pub form: ProfileForm,
    pub rows: Vec<CorgiRow>,
    pub errors: FieldErrors,
    pub states: &'static [UsState],
}

impl ProfileEditorTemplate {
    fn new(page: EditorPage, form: ProfileForm, errors: FieldErrors) -> Self {
        let rows = form
            .corgis
            .iter()
            .enumerate()
            .map(|(index, corgi)| {
                let message =
                    |field: &str| errors.get(&format!("corgis[{index}].{field}")).to_owned();
                CorgiRow {
                    index,
                    corgi: corgi.clone(),
                    id_error: message("id"),
                    name_error: message("name"),
                    birth_date_error: message("birth_date"),
                    image_uri_error: message("image_uri"),
                }
            })
            .collect();

        Self {
            page,
            form,
            rows,
            errors,
            states: UsState::ALL,
        }
    }
}

/// Display the editor for a new (or returning) user.
///
/// # Errors
///
/// Returns `AppError::Database` if loading fails.
#[instrument(skip(state, identity), fields(user_id = %identity.id))]
pub async fn onboarding(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
) -> Result<ProfileEditorTemplate, AppError> {
    let profile = ProfileService::new(state.pool()).load(identity.id).await?;

    let form = match &profile {
        Some(p) => ProfileForm::from_profile(p.address.as_ref(), &p.corgis, DEFAULT_REDIRECT),
        None => ProfileForm::from_profile(None, &[], DEFAULT_REDIRECT),
    };

    Ok(ProfileEditorTemplate::new(
        EditorPage::Onboarding,
        form,
        FieldErrors::new(),
    ))
}

/// Display the editor for an existing profile.
///
/// # Errors
///
/// Returns `AppError::Database` if loading fails.
#[instrument(skip(state, identity), fields(user_id = %identity.id))]
pub async fn edit(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
) -> Result<Response, AppError> {
    let Some(profile) = ProfileService::new(state.pool()).load(identity.id).await? else {
        return Ok(found("/onboarding"));
    };

    let form = ProfileForm::from_profile(
        profile.address.as_ref(),
        &profile.corgis,
        DEFAULT_REDIRECT,
    );

    Ok(ProfileEditorTemplate::new(EditorPage::Edit, form, FieldErrors::new()).into_response())
}

/// Handle an editor submission.
///
/// Add/remove intents re-render the editor without touching the database.
/// A submit validates everything first; on success the address and the exact
/// corgi set are saved in one transaction.
///
/// # Errors
///
/// Returns `AppError::Conflict` if a corgi id belongs to another user (nothing
/// is saved), or `AppError::Database` if the save fails.
#[instrument(skip(state, identity, pairs), fields(user_id = %identity.id))]
pub async fn submit(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
    Form(pairs): Form<FormPairs>,
) -> Result<Response, AppError> {
    let (mut form, intent) = ProfileForm::from_pairs(&pairs);
    let page = EditorPage::from_pairs(&pairs);

    if form.apply_intent(intent) {
        tracing::debug!(?intent, corgis = form.corgis.len(), "Editor intent");
        return Ok(ProfileEditorTemplate::new(page, form, FieldErrors::new()).into_response());
    }

    let input = match form.to_input() {
        Ok(input) => input,
        Err(errors) => {
            tracing::info!(fields = errors.len(), "Profile form invalid");
            let editor = ProfileEditorTemplate::new(page, form, errors);
            return Ok((StatusCode::BAD_REQUEST, editor).into_response());
        }
    };

    let saved = ProfileService::new(state.pool())
        .save(&identity, &input)
        .await?;
    tracing::info!(corgis = saved.len(), "Profile saved");

    Ok(found(&input.redirect_to))
}
