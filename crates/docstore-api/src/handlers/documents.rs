//! Document creation and retrieval handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use docstore_core::models::{ApprovalStep, Document, NewApprovalStep, NewDocument};
use docstore_core::AppError;

use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDocumentRequest {
    pub company_id: Uuid,
    #[validate(nested)]
    pub entity: EntityRef,
    #[validate(nested)]
    pub document: DocumentInfo,
    #[serde(default)]
    #[validate(nested)]
    pub validation_flow: Option<ValidationFlowInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EntityRef {
    #[validate(length(min = 1, max = 100))]
    pub entity_type: String,
    pub entity_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DocumentInfo {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub mime_type: String,
    pub size_bytes: Option<i64>,
    /// Logical storage key, e.g. `companies/{id}/vehicles/{id}/soat.pdf`.
    #[validate(length(min = 1, max = 500))]
    pub bucket_key: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ValidationFlowInput {
    pub enabled: bool,
    #[serde(default)]
    pub steps: Vec<StepInput>,
}

#[derive(Debug, Deserialize)]
pub struct StepInput {
    pub order: i32,
    pub approver_user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CreateDocumentResponse {
    pub document_id: Uuid,
    pub upload_url: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentDetailResponse {
    #[serde(flatten)]
    pub document: Document,
    pub steps: Vec<ApprovalStep>,
}

#[derive(Debug, Serialize)]
pub struct DownloadUrlResponse {
    pub download_url: String,
}

/// POST /api/documents
///
/// Creates the metadata record (plus approval steps when a validation flow
/// is requested) and answers with a presigned local upload URL.
#[tracing::instrument(skip(state, payload), fields(operation = "create_document"))]
pub async fn create_document(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDocumentRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let company = state
        .store
        .get_company(payload.company_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("company {}", payload.company_id)))?;
    let entity = state
        .store
        .get_entity(payload.entity.entity_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("entity {}", payload.entity.entity_id)))?;
    if entity.company_id != company.id {
        return Err(AppError::Validation(format!(
            "entity {} does not belong to company {}",
            entity.id, company.id
        ))
        .into());
    }

    let flow = payload.validation_flow.as_ref().filter(|f| f.enabled);
    let flow_enabled = flow.is_some();
    let mut steps = Vec::new();
    if let Some(flow) = flow {
        for step in &flow.steps {
            state
                .store
                .get_actor(step.approver_user_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("approver {}", step.approver_user_id))
                })?;
            steps.push(NewApprovalStep {
                order: step.order,
                approver_id: step.approver_user_id,
            });
        }
    }

    let document = state
        .store
        .create_document(
            NewDocument {
                company_id: company.id,
                entity_id: entity.id,
                name: payload.document.name,
                content_type: payload.document.mime_type,
                size_bytes: payload.document.size_bytes,
                storage_key: payload.document.bucket_key,
                validation_enabled: flow_enabled,
                creator_id: None,
            },
            steps,
        )
        .await?;

    let token = state
        .transfers
        .issue_upload_token(&document.storage_key)
        .await?;
    let upload_url = format!(
        "{}/api/documents/local-upload/{}",
        state.config.public_base_url.trim_end_matches('/'),
        token
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateDocumentResponse {
            document_id: document.id,
            upload_url,
        }),
    ))
}

/// GET /api/documents/{id}
#[tracing::instrument(skip(state), fields(document_id = %id, operation = "get_document"))]
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let document = state
        .store
        .get_document(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("document {}", id)))?;
    let steps = state.store.list_steps(id).await?;

    Ok(Json(DocumentDetailResponse { document, steps }))
}

/// GET /api/documents/{id}/download
///
/// Answers with a presigned local download URL for the document's bytes.
#[tracing::instrument(skip(state), fields(document_id = %id, operation = "document_download_url"))]
pub async fn download_url(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let document = state
        .store
        .get_document(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("document {}", id)))?;

    let token = state.transfers.issue_download_token(&document.storage_key)?;
    let download_url = format!(
        "{}/api/documents/local-download/{}",
        state.config.public_base_url.trim_end_matches('/'),
        token
    );

    Ok(Json(DownloadUrlResponse { download_url }))
}
