//! Approval workflow action handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub actor_user_id: Uuid,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ApproveResponse {
    pub detail: &'static str,
    pub document_approved: bool,
}

#[derive(Debug, Serialize)]
pub struct RejectResponse {
    pub detail: &'static str,
}

/// POST /api/documents/{id}/approve
#[tracing::instrument(
    skip(state, payload),
    fields(document_id = %id, actor_id = %payload.actor_user_id, operation = "approve_document")
)]
pub async fn approve_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ActionRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let decision = state
        .validation
        .approve(id, payload.actor_user_id, &payload.reason)
        .await?;

    Ok(Json(ApproveResponse {
        detail: "approved",
        document_approved: decision.document_approved,
    }))
}

/// POST /api/documents/{id}/reject
#[tracing::instrument(
    skip(state, payload),
    fields(document_id = %id, actor_id = %payload.actor_user_id, operation = "reject_document")
)]
pub async fn reject_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ActionRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .validation
        .reject(id, payload.actor_user_id, &payload.reason)
        .await?;

    Ok(Json(RejectResponse { detail: "rejected" }))
}
