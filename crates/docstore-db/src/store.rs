//! The `DocumentStore` seam.

use async_trait::async_trait;
use uuid::Uuid;

use docstore_core::models::{
    Actor, ApprovalStep, BusinessEntity, Company, Document, NewApprovalStep, NewDocument,
};
use docstore_core::AppError;

/// Result of an approval action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalDecision {
    /// True when the action moved the whole document to Approved.
    pub document_approved: bool,
}

/// Atomic multi-row persistence for documents and their approval steps.
///
/// `approve_step`/`reject_step` locate the acting approver's step on the
/// document and apply the whole workflow plan as one durable unit: either
/// every cascaded step, the acted step, and the document status land
/// together, or nothing does.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document together with its approval steps, atomically.
    async fn create_document(
        &self,
        new_document: NewDocument,
        steps: Vec<NewApprovalStep>,
    ) -> Result<Document, AppError>;

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, AppError>;

    /// Steps of a document, ordered by rank (ascending `order`).
    async fn list_steps(&self, document_id: Uuid) -> Result<Vec<ApprovalStep>, AppError>;

    async fn get_actor(&self, id: Uuid) -> Result<Option<Actor>, AppError>;

    async fn get_company(&self, id: Uuid) -> Result<Option<Company>, AppError>;

    async fn get_entity(&self, id: Uuid) -> Result<Option<BusinessEntity>, AppError>;

    async fn find_by_storage_key(&self, storage_key: &str) -> Result<Option<Document>, AppError>;

    /// Reconcile upload integrity metadata onto the document with this
    /// storage key. Best-effort: returns false when no record matches.
    async fn record_upload(
        &self,
        storage_key: &str,
        size_bytes: i64,
        sha256: &str,
    ) -> Result<bool, AppError>;

    /// Approve the step held by `actor_id` on `document_id`, cascading
    /// lower-rank pending steps and finalizing the document when the rules
    /// say so. `NotFound` when the actor holds no step on the document.
    async fn approve_step(
        &self,
        document_id: Uuid,
        actor_id: Uuid,
        reason: &str,
    ) -> Result<ApprovalDecision, AppError>;

    /// Reject the step held by `actor_id` on `document_id`, terminating the
    /// document's workflow.
    async fn reject_step(
        &self,
        document_id: Uuid,
        actor_id: Uuid,
        reason: &str,
    ) -> Result<(), AppError>;
}
