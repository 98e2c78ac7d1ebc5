//! Dashboard: the signed-in home page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireIdentity, found};
use crate::models::{Corgi, EntrySummary, MailingAddress};
use crate::services::ExchangeService;
use crate::state::AppState;

/// Mailing address display data.
#[derive(Clone)]
pub struct AddressView {
    pub lines: Vec<String>,
    pub phone: String,
}

impl From<&MailingAddress> for AddressView {
    fn from(address: &MailingAddress) -> Self {
        let mut lines = vec![address.address1.clone()];
        lines.extend(address.address2.clone());
        lines.push(format!(
            "{}, {} {}",
            address.city,
            address.state.code(),
            address.zip
        ));
        Self {
            lines,
            phone: address.phone.clone(),
        }
    }
}

/// Corgi display data.
#[derive(Clone)]
pub struct CorgiView {
    pub name: String,
    pub image_uri: String,
    /// e.g. "2 years, 3 months"; `None` without a birth date.
    pub age: Option<String>,
}

impl CorgiView {
    fn new(corgi: &Corgi, today: NaiveDate) -> Self {
        Self {
            name: corgi.name.clone(),
            image_uri: corgi.image_uri.clone(),
            age: corgi.age_on(today).map(|age| age.to_string()),
        }
    }
}

/// Exchange entry display data.
#[derive(Clone)]
pub struct EntryView {
    pub exchange: String,
    pub due_date: String,
    pub santa_name: String,
    pub notes: Option<String>,
    pub recipient_name: Option<String>,
}

impl From<&EntrySummary> for EntryView {
    fn from(entry: &EntrySummary) -> Self {
        Self {
            exchange: format!("{} {}", entry.exchange_title, entry.exchange_year),
            due_date: entry.due_date.format("%B %-d, %Y").to_string(),
            santa_name: entry.santa_name.clone(),
            notes: entry.notes.clone(),
            recipient_name: entry.recipient_name.clone(),
        }
    }
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub name: String,
    pub address: Option<AddressView>,
    pub corgis: Vec<CorgiView>,
    pub entries: Vec<EntryView>,
}

/// Display the dashboard, or send first-time visitors to onboarding.
///
/// # Errors
///
/// Returns `AppError::Database` if loading fails.
#[instrument(skip(state, identity), fields(user_id = %identity.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
) -> Result<Response, AppError> {
    let Some(dashboard) = ExchangeService::new(state.pool())
        .dashboard(identity.id)
        .await?
    else {
        return Ok(found("/onboarding"));
    };

    let today = Utc::now().date_naive();

    Ok(DashboardTemplate {
        name: dashboard.user.first_name.clone(),
        address: dashboard.address.as_ref().map(AddressView::from),
        corgis: dashboard
            .corgis
            .iter()
            .map(|c| CorgiView::new(c, today))
            .collect(),
        entries: dashboard.entries.iter().map(EntryView::from).collect(),
    }
    .into_response())
}
