//! Approval action orchestration.
//!
//! Resolves the document and the acting identity, runs the access policy,
//! and delegates the atomic workflow update to the store. The cascade and
//! terminal rules themselves live in docstore-core; this layer only decides
//! who may trigger them.

use std::sync::Arc;

use uuid::Uuid;

use docstore_core::AppError;
use docstore_db::{ApprovalDecision, DocumentStore};

use crate::policy::AccessPolicy;

#[derive(Clone)]
pub struct ValidationService {
    store: Arc<dyn DocumentStore>,
    policy: Arc<dyn AccessPolicy>,
}

impl ValidationService {
    pub fn new(store: Arc<dyn DocumentStore>, policy: Arc<dyn AccessPolicy>) -> Self {
        Self { store, policy }
    }

    pub async fn approve(
        &self,
        document_id: Uuid,
        actor_id: Uuid,
        reason: &str,
    ) -> Result<ApprovalDecision, AppError> {
        let company_id = self.authorize(document_id, actor_id).await?;
        let decision = self.store.approve_step(document_id, actor_id, reason).await?;

        tracing::info!(
            document_id = %document_id,
            actor_id = %actor_id,
            company_id = %company_id,
            document_approved = decision.document_approved,
            "approval recorded"
        );
        Ok(decision)
    }

    pub async fn reject(
        &self,
        document_id: Uuid,
        actor_id: Uuid,
        reason: &str,
    ) -> Result<(), AppError> {
        let company_id = self.authorize(document_id, actor_id).await?;
        self.store.reject_step(document_id, actor_id, reason).await?;

        tracing::info!(
            document_id = %document_id,
            actor_id = %actor_id,
            company_id = %company_id,
            "rejection recorded"
        );
        Ok(())
    }

    async fn authorize(&self, document_id: Uuid, actor_id: Uuid) -> Result<Uuid, AppError> {
        let document = self
            .store
            .get_document(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("document {}", document_id)))?;
        let actor = self
            .store
            .get_actor(actor_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("actor {}", actor_id)))?;

        if !self.policy.can_access(&actor, document.company_id) {
            return Err(AppError::Forbidden(format!(
                "actor {} may not act on company {}",
                actor.id, document.company_id
            )));
        }
        Ok(document.company_id)
    }
}
