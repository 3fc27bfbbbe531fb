//! In-memory `DocumentStore` backend.
//!
//! Used by tests and local development. A single mutex held across each
//! call gives the same call-level atomicity the Postgres backend gets from
//! its transaction and row lock: two concurrent approve/reject calls on the
//! same document serialize, and a failed plan applies nothing.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use docstore_core::models::{
    Actor, ApprovalStep, BusinessEntity, Company, Document, NewApprovalStep, NewDocument,
};
use docstore_core::validation::{plan_approval, plan_rejection, ValidationPlan};
use docstore_core::AppError;

use crate::store::{ApprovalDecision, DocumentStore};

#[derive(Default)]
struct Inner {
    companies: HashMap<Uuid, Company>,
    entities: HashMap<Uuid, BusinessEntity>,
    actors: HashMap<Uuid, Actor>,
    documents: HashMap<Uuid, Document>,
    steps: Vec<ApprovalStep>,
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    inner: Mutex<Inner>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Seeding helpers for the read-only collaborator tables.

    pub async fn insert_company(&self, company: Company) {
        self.inner.lock().await.companies.insert(company.id, company);
    }

    pub async fn insert_entity(&self, entity: BusinessEntity) {
        self.inner.lock().await.entities.insert(entity.id, entity);
    }

    pub async fn insert_actor(&self, actor: Actor) {
        self.inner.lock().await.actors.insert(actor.id, actor);
    }
}

impl Inner {
    fn steps_of(&self, document_id: Uuid) -> Vec<ApprovalStep> {
        let mut steps: Vec<ApprovalStep> = self
            .steps
            .iter()
            .filter(|s| s.document_id == document_id)
            .cloned()
            .collect();
        steps.sort_by_key(|s| s.order);
        steps
    }

    fn step_of_actor(&self, document_id: Uuid, actor_id: Uuid) -> Result<ApprovalStep, AppError> {
        self.steps_of(document_id)
            .into_iter()
            .find(|s| s.approver_id == actor_id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "approval step for actor {} on document {}",
                    actor_id, document_id
                ))
            })
    }

    fn apply(&mut self, plan: &ValidationPlan) {
        for update in &plan.step_updates {
            if let Some(step) = self.steps.iter_mut().find(|s| s.id == update.step_id) {
                step.status = update.status;
                step.reason = update.reason.clone();
                step.acted_at = Some(update.acted_at);
            }
        }
        if let Some(status) = plan.document_status {
            if let Some(doc) = self.documents.get_mut(&plan.document_id) {
                doc.validation_status = Some(status);
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create_document(
        &self,
        new_document: NewDocument,
        steps: Vec<NewApprovalStep>,
    ) -> Result<Document, AppError> {
        let mut inner = self.inner.lock().await;
        let document = new_document.into_document(Utc::now());
        for step in steps {
            inner.steps.push(step.into_step(document.id));
        }
        inner.documents.insert(document.id, document.clone());
        Ok(document)
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        Ok(self.inner.lock().await.documents.get(&id).cloned())
    }

    async fn list_steps(&self, document_id: Uuid) -> Result<Vec<ApprovalStep>, AppError> {
        Ok(self.inner.lock().await.steps_of(document_id))
    }

    async fn get_actor(&self, id: Uuid) -> Result<Option<Actor>, AppError> {
        Ok(self.inner.lock().await.actors.get(&id).cloned())
    }

    async fn get_company(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        Ok(self.inner.lock().await.companies.get(&id).cloned())
    }

    async fn get_entity(&self, id: Uuid) -> Result<Option<BusinessEntity>, AppError> {
        Ok(self.inner.lock().await.entities.get(&id).cloned())
    }

    async fn find_by_storage_key(&self, storage_key: &str) -> Result<Option<Document>, AppError> {
        Ok(self
            .inner
            .lock()
            .await
            .documents
            .values()
            .find(|d| d.storage_key == storage_key)
            .cloned())
    }

    async fn record_upload(
        &self,
        storage_key: &str,
        size_bytes: i64,
        sha256: &str,
    ) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().await;
        let Some(doc) = inner
            .documents
            .values_mut()
            .find(|d| d.storage_key == storage_key)
        else {
            return Ok(false);
        };
        doc.size_bytes = Some(size_bytes);
        doc.sha256 = Some(sha256.to_string());
        Ok(true)
    }

    async fn approve_step(
        &self,
        document_id: Uuid,
        actor_id: Uuid,
        reason: &str,
    ) -> Result<ApprovalDecision, AppError> {
        let mut inner = self.inner.lock().await;
        let document = inner
            .documents
            .get(&document_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("document {}", document_id)))?;
        let steps = inner.steps_of(document_id);
        let acted = inner.step_of_actor(document_id, actor_id)?;

        let plan = plan_approval(&document, &steps, acted.id, reason, Utc::now())?;
        inner.apply(&plan);

        Ok(ApprovalDecision {
            document_approved: plan.document_approved,
        })
    }

    async fn reject_step(
        &self,
        document_id: Uuid,
        actor_id: Uuid,
        reason: &str,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        let document = inner
            .documents
            .get(&document_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("document {}", document_id)))?;
        let steps = inner.steps_of(document_id);
        let acted = inner.step_of_actor(document_id, actor_id)?;

        let plan = plan_rejection(&document, &steps, acted.id, reason, Utc::now())?;
        inner.apply(&plan);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore_core::models::{StepStatus, ValidationStatus};

    async fn workflow_fixture(orders: &[i32]) -> (MemoryDocumentStore, Document, Vec<Uuid>) {
        let store = MemoryDocumentStore::new();
        let company_id = Uuid::new_v4();
        let entity_id = Uuid::new_v4();
        store
            .insert_company(Company {
                id: company_id,
                name: "Acme Logistics".into(),
            })
            .await;
        store
            .insert_entity(BusinessEntity {
                id: entity_id,
                entity_type: "vehicle".into(),
                company_id,
            })
            .await;

        let approvers: Vec<Uuid> = orders.iter().map(|_| Uuid::new_v4()).collect();
        for (i, id) in approvers.iter().enumerate() {
            store
                .insert_actor(Actor {
                    id: *id,
                    username: format!("approver{}", i),
                    is_superuser: false,
                })
                .await;
        }

        let document = store
            .create_document(
                NewDocument {
                    company_id,
                    entity_id,
                    name: "soat.pdf".into(),
                    content_type: "application/pdf".into(),
                    size_bytes: None,
                    storage_key: "companies/acme/vehicles/v1/soat.pdf".into(),
                    validation_enabled: true,
                    creator_id: None,
                },
                orders
                    .iter()
                    .zip(&approvers)
                    .map(|(&order, &approver_id)| NewApprovalStep { order, approver_id })
                    .collect(),
            )
            .await
            .unwrap();

        (store, document, approvers)
    }

    #[tokio::test]
    async fn approve_cascades_and_finalizes_through_the_store() {
        let (store, doc, approvers) = workflow_fixture(&[1, 2, 3]).await;

        // Middle approver: subordinate auto-approved, top still pending.
        let decision = store.approve_step(doc.id, approvers[1], "ok").await.unwrap();
        assert!(!decision.document_approved);

        let steps = store.list_steps(doc.id).await.unwrap();
        assert_eq!(steps[0].status, StepStatus::Approved);
        assert_eq!(steps[1].status, StepStatus::Approved);
        assert_eq!(steps[2].status, StepStatus::Pending);
        let doc_now = store.get_document(doc.id).await.unwrap().unwrap();
        assert_eq!(doc_now.validation_status, Some(ValidationStatus::Pending));

        // Top approver finalizes.
        let decision = store.approve_step(doc.id, approvers[2], "ok").await.unwrap();
        assert!(decision.document_approved);
        let doc_now = store.get_document(doc.id).await.unwrap().unwrap();
        assert_eq!(doc_now.validation_status, Some(ValidationStatus::Approved));
    }

    #[tokio::test]
    async fn reject_terminates_and_blocks_further_actions() {
        let (store, doc, approvers) = workflow_fixture(&[1, 2, 3]).await;

        store
            .reject_step(doc.id, approvers[0], "illegible scan")
            .await
            .unwrap();
        let doc_now = store.get_document(doc.id).await.unwrap().unwrap();
        assert_eq!(doc_now.validation_status, Some(ValidationStatus::Rejected));

        // A later approve on another step must not resurrect the document.
        let err = store
            .approve_step(doc.id, approvers[2], "too late")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DocumentTerminal(_)));
        let doc_now = store.get_document(doc.id).await.unwrap().unwrap();
        assert_eq!(doc_now.validation_status, Some(ValidationStatus::Rejected));
    }

    #[tokio::test]
    async fn failed_precondition_applies_nothing() {
        let (store, doc, approvers) = workflow_fixture(&[1, 2]).await;

        store.approve_step(doc.id, approvers[0], "").await.unwrap();
        let err = store.approve_step(doc.id, approvers[0], "").await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyActed(_)));

        let steps = store.list_steps(doc.id).await.unwrap();
        assert_eq!(steps[1].status, StepStatus::Pending);
    }

    #[tokio::test]
    async fn actor_without_step_is_not_found() {
        let (store, doc, _) = workflow_fixture(&[1]).await;
        let err = store
            .approve_step(doc.id, Uuid::new_v4(), "")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn record_upload_reconciles_matching_document_only() {
        let (store, doc, _) = workflow_fixture(&[1]).await;

        let updated = store
            .record_upload(&doc.storage_key, 1234, "abcd")
            .await
            .unwrap();
        assert!(updated);
        let doc_now = store.get_document(doc.id).await.unwrap().unwrap();
        assert_eq!(doc_now.size_bytes, Some(1234));
        assert_eq!(doc_now.sha256.as_deref(), Some("abcd"));

        let updated = store
            .record_upload("nobody/has/this.key", 1, "ffff")
            .await
            .unwrap();
        assert!(!updated);
    }
}
