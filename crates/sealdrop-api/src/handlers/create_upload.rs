use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sealdrop_core::models::{validate_upload, FileRecord, MILLIS_PER_HOUR};

use crate::error::{HttpAppError, ValidatedJson};
use crate::handlers::client_ip;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUploadRequest {
    pub name: String,
    pub size: i64,
    pub expiry_time_hours: i64,
    pub bot_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUploadResponse {
    pub id: String,
    pub upload_url: String,
}

/// Register an upload: validate, bot-check, persist metadata, and mint a
/// scoped PUT credential for the ciphertext. If the caller never performs
/// the PUT, the orphaned row simply ages out through the reconciler.
#[tracing::instrument(
    skip(state, headers, request),
    fields(operation = "create_upload", size = request.size)
)]
pub async fn create_upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<CreateUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    validate_upload(
        &request.name,
        request.size,
        request.expiry_time_hours,
        state.config.max_file_size_bytes,
    )?;

    let remote_ip = client_ip(&headers);
    state
        .bot_verifier
        .verify(&request.bot_token, remote_ip.as_deref())
        .await?;

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let now_ms = now.timestamp_millis();
    let record = FileRecord {
        id: id.clone(),
        name: request.name,
        size: request.size,
        created_at: now_ms,
        expires_at: now_ms + request.expiry_time_hours * MILLIS_PER_HOUR,
    };
    state.files.insert(&record).await?;

    let upload_url =
        state
            .signer
            .presign_put(&id, request.size, state.config.presign_expiry_secs, now)?;

    tracing::info!(
        id = %id,
        expires_at = record.expires_at,
        "Upload registered"
    );

    Ok(Json(CreateUploadResponse { id, upload_url }))
}
