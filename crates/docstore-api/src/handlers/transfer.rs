//! Token-gated upload and download endpoints.
//!
//! These are the local-disk stand-ins for object-storage presigned URLs:
//! the token in the path is the entire authorization. Any token problem
//! (absent, malformed, expired, wrong mode) surfaces as the same
//! `invalid-or-expired-token` response.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use serde::Serialize;

use docstore_core::AppError;

use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub detail: String,
    pub size_bytes: u64,
}

/// PUT /api/documents/local-upload/{token}
#[tracing::instrument(skip(state, body), fields(operation = "local_upload"))]
pub async fn local_upload(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    let outcome = state.transfers.handle_upload(&token, &body).await?;

    Ok(axum::Json(UploadResponse {
        detail: "uploaded".to_string(),
        size_bytes: outcome.size_bytes,
    }))
}

/// GET /api/documents/local-download/{token}
///
/// Streams the file; content type and filename come from the matching
/// document record when one exists.
#[tracing::instrument(skip(state), fields(operation = "local_download"))]
pub async fn local_download(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let payload = state.transfers.handle_download(&token).await?;

    let content_type = payload
        .document
        .as_ref()
        .map(|d| d.content_type.clone())
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let content_disposition = match payload.document.as_ref() {
        Some(doc) => format!("attachment; filename=\"{}\"", doc.name),
        None => "attachment".to_string(),
    };

    let body_stream = payload.stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("storage stream error: {}", e)))
    });

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, content_disposition)
        .header(header::CONTENT_LENGTH, payload.size_bytes)
        .body(Body::from_stream(body_stream))
        .map_err(|e| AppError::Internal(format!("failed to build response: {}", e)))?;

    Ok(response)
}
