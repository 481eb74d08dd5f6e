use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use sealdrop_core::models::FileInfo;
use sealdrop_core::AppError;

use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FileInfoQuery {
    pub id: Option<String>,
}

/// Public metadata for a live file: display name and declared size. Same
/// liveness predicate as download, so expired ids 404 identically.
#[tracing::instrument(skip(state), fields(operation = "file_info"))]
pub async fn file_info(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FileInfoQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidInput("missing id parameter".to_string()))?;

    let record = state
        .files
        .find_active(&id, Utc::now().timestamp_millis())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no live file for id {}", id)))?;

    Ok(Json(FileInfo {
        name: record.name,
        size: record.size,
    }))
}
