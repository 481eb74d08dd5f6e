use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap},
    response::IntoResponse,
};
use chrono::Utc;
use futures::TryStreamExt;
use serde::Deserialize;

use sealdrop_core::AppError;

use crate::error::{HttpAppError, ValidatedJson};
use crate::handlers::client_ip;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub bot_token: String,
}

/// Relay the ciphertext for a live file. The broker fetches with a scoped
/// GET credential and streams the store's bytes straight through; it has no
/// key material, so there is nothing here worth decrypting.
#[tracing::instrument(skip(state, headers, request), fields(operation = "download"))]
pub async fn download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<DownloadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidInput("missing id parameter".to_string()))?;

    let remote_ip = client_ip(&headers);
    state
        .bot_verifier
        .verify(&request.bot_token, remote_ip.as_deref())
        .await?;

    // Expired rows are filtered by the query itself, so an expired file is
    // indistinguishable from one that never existed.
    let now = Utc::now();
    let record = state
        .files
        .find_active(&id, now.timestamp_millis())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no live file for id {}", id)))?;

    let download_url = state
        .signer
        .presign_get(&id, state.config.presign_expiry_secs, now)?;

    let upstream = state
        .relay
        .get(&download_url)
        .send()
        .await
        .map_err(|e| AppError::Storage(format!("ciphertext fetch failed: {}", e)))?;

    let status = upstream.status();
    if !status.is_success() {
        return Err(AppError::Storage(format!(
            "object store returned {} for ciphertext fetch",
            status
        ))
        .into());
    }

    tracing::info!(id = %record.id, size = record.size, "Relaying ciphertext");

    let stream = upstream
        .bytes_stream()
        .map_err(|e| std::io::Error::other(format!("relay stream error: {}", e)));

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from_stream(stream),
    ))
}
