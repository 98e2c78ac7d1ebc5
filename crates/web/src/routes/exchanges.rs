//! Exchange listing and joining.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use santa_paws_core::ExchangeId;

use crate::error::AppError;
use crate::filters;
use crate::forms::{FieldErrors, FormPairs, JoinEntryForm, JoinForm};
use crate::middleware::{RequireIdentity, found};
use crate::models::Exchange;
use crate::services::{ExchangeService, ProfileService};
use crate::state::AppState;

/// Exchange display data.
#[derive(Clone)]
pub struct ExchangeView {
    pub id: String,
    pub title: String,
    pub year: i32,
    pub due_date: String,
}

impl From<&Exchange> for ExchangeView {
    fn from(exchange: &Exchange) -> Self {
        Self {
            id: exchange.id.to_string(),
            title: exchange.title.clone(),
            year: exchange.year,
            due_date: exchange.due_date.format("%B %-d, %Y").to_string(),
        }
    }
}

/// Open exchanges page template.
#[derive(Template, WebTemplate)]
#[template(path = "exchanges/current.html")]
pub struct CurrentExchangesTemplate {
    pub exchanges: Vec<ExchangeView>,
}

/// One corgi row of the join form, with its message.
pub struct JoinRow {
    pub index: usize,
    pub entry: JoinEntryForm,
    pub error: String,
}

/// Join form template.
#[derive(Template, WebTemplate)]
#[template(path = "exchanges/join.html")]
pub struct JoinTemplate {
    pub exchange: ExchangeView,
    pub rows: Vec<JoinRow>,
    pub errors: FieldErrors,
}

impl JoinTemplate {
    fn new(exchange: &Exchange, form: JoinForm, errors: FieldErrors) -> Self {
        let rows = form
            .entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                // First message wins: a repeated corgi, then notes, then exchange id.
                let error = ["santa_id", "notes", "exchange_id"]
                    .iter()
                    .map(|field| errors.get(&format!("entries[{index}].{field}")))
                    .find(|message| !message.is_empty())
                    .unwrap_or_default()
                    .to_owned();
                JoinRow {
                    index,
                    entry,
                    error,
                }
            })
            .collect();

        Self {
            exchange: ExchangeView::from(exchange),
            rows,
            errors,
        }
    }
}

/// Unparseable ids are treated as unknown exchanges.
fn parse_exchange_id(raw: &str) -> Result<ExchangeId, AppError> {
    ExchangeId::parse(raw).map_err(|_| AppError::NotFound("exchange".to_owned()))
}

/// List open exchanges the user's corgis have not joined.
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
#[instrument(skip(state, identity), fields(user_id = %identity.id))]
pub async fn current(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
) -> Result<CurrentExchangesTemplate, AppError> {
    let exchanges = ExchangeService::new(state.pool())
        .open_for(identity.id)
        .await?;

    Ok(CurrentExchangesTemplate {
        exchanges: exchanges.iter().map(ExchangeView::from).collect(),
    })
}

/// Display the join form: one row per corgi.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown exchange and
/// `AppError::Conflict` for a closed one.
#[instrument(skip(state, identity), fields(user_id = %identity.id))]
pub async fn join_page(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let exchange_id = parse_exchange_id(&id)?;
    let exchanges = ExchangeService::new(state.pool());
    let profiles = ProfileService::new(state.pool());

    let (exchange, corgis) = tokio::try_join!(
        async { exchanges.get(exchange_id).await.map_err(AppError::from) },
        async { profiles.corgis(identity.id).await.map_err(AppError::from) },
    )?;

    if !exchange.is_open {
        return Err(AppError::Conflict("This exchange is closed".to_owned()));
    }
    if corgis.is_empty() {
        return Ok(found("/onboarding"));
    }

    Ok(JoinTemplate::new(
        &exchange,
        JoinForm::for_corgis(exchange_id, &corgis),
        FieldErrors::new(),
    )
    .into_response())
}

/// Enter the ticked corgis as Santas, all or nothing.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown exchange (no entries are
/// created), `AppError::Conflict` if it is closed or a corgi already joined,
/// and `AppError::Forbidden` if a corgi is not the user's.
#[instrument(skip(state, identity, pairs), fields(user_id = %identity.id))]
pub async fn join(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
    Path(id): Path<String>,
    Form(pairs): Form<FormPairs>,
) -> Result<Response, AppError> {
    let exchange_id = parse_exchange_id(&id)?;
    let exchanges = ExchangeService::new(state.pool());
    let exchange = exchanges.get(exchange_id).await?;

    let mut form = JoinForm::from_pairs(&pairs);
    let entries = match form.to_entries(exchange_id) {
        Ok(entries) => entries,
        Err(errors) => {
            tracing::info!(fields = errors.len(), "Join form invalid");
            let corgis = ProfileService::new(state.pool()).corgis(identity.id).await?;
            form.attach_names(&corgis);
            let page = JoinTemplate::new(&exchange, form, errors);
            return Ok((StatusCode::BAD_REQUEST, page).into_response());
        }
    };

    let created = exchanges.join(identity.id, exchange_id, &entries).await?;
    tracing::info!(%exchange_id, entries = created.len(), "Joined exchange");

    Ok(found("/"))
}
