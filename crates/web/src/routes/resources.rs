//! Script-facing resource endpoints.

use axum::{
    Json,
    extract::{Multipart, State, multipart::Field},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireIdentity;
use crate::services::image;
use crate::state::AppState;

/// Multipart field holding the photo.
pub const UPLOAD_FIELD: &str = "fileUpload";

/// Response body for a successful upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub data_uri: String,
}

fn multipart_error(e: &axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Photo is too large".to_owned())
    } else {
        AppError::BadRequest(format!("Malformed upload: {}", e.body_text()))
    }
}

/// Read a field, stopping as soon as it exceeds `limit` bytes.
async fn read_capped(mut field: Field<'_>, limit: usize) -> Result<Vec<u8>, AppError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(&e))? {
        if bytes.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge(format!(
                "Photos must be under {} MB",
                limit / (1024 * 1024)
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Normalize an uploaded corgi photo into a 512x512 WebP data URI.
///
/// # Errors
///
/// Returns 400 for a missing or undecodable photo and 413 above the
/// configured size cap.
#[instrument(skip(state, identity, multipart), fields(user_id = %identity.id))]
pub async fn image_upload(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let limit = state.config().max_upload_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let bytes = read_capped(field, limit).await?;
        let data_uri = image::ingest(bytes).await?;
        return Ok(Json(UploadResponse { data_uri }));
    }

    Err(AppError::BadRequest(format!(
        "Missing {UPLOAD_FIELD} field"
    )))
}
