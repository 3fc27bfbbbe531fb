//! Postgres `DocumentStore` backend.
//!
//! Dynamic (non-macro) queries so the crate builds without a live
//! DATABASE_URL. The approve/reject path is one transaction: the document
//! row is locked with `SELECT ... FOR UPDATE`, the steps are read under
//! that lock, the pure planner computes the three-way update, and every
//! row lands before commit. Concurrent actions on the same document
//! serialize on the row lock; any failure rolls the whole unit back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use docstore_core::models::{
    Actor, ApprovalStep, BusinessEntity, Company, Document, NewApprovalStep, NewDocument,
    StepStatus, ValidationStatus,
};
use docstore_core::validation::{plan_approval, plan_rejection, ValidationPlan};
use docstore_core::AppError;

use crate::store::{ApprovalDecision, DocumentStore};

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|e| AppError::Database(format!("migration failed: {}", e)))
    }

    async fn lock_document(
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> Result<Document, AppError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, company_id, entity_id, name, content_type, size_bytes,
                   storage_key, sha256, validation_enabled, validation_status,
                   creator_id, created_at
            FROM documents
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(document_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("document {}", document_id)))?;
        row.try_into()
    }

    async fn steps_for_update(
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> Result<Vec<ApprovalStep>, AppError> {
        let rows = sqlx::query_as::<_, StepRow>(
            r#"
            SELECT id, document_id, "order", approver_id, status, reason, acted_at
            FROM approval_steps
            WHERE document_id = $1
            ORDER BY "order"
            "#,
        )
        .bind(document_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn apply_plan(
        tx: &mut Transaction<'_, Postgres>,
        plan: &ValidationPlan,
    ) -> Result<(), AppError> {
        for update in &plan.step_updates {
            sqlx::query(
                r#"
                UPDATE approval_steps
                SET status = $2, reason = $3, acted_at = $4
                WHERE id = $1
                "#,
            )
            .bind(update.step_id)
            .bind(update.status.as_code())
            .bind(&update.reason)
            .bind(update.acted_at)
            .execute(&mut **tx)
            .await
            .map_err(db_err)?;
        }

        if let Some(status) = plan.document_status {
            sqlx::query("UPDATE documents SET validation_status = $2 WHERE id = $1")
                .bind(plan.document_id)
                .bind(status.as_code())
                .execute(&mut **tx)
                .await
                .map_err(db_err)?;
        }
        Ok(())
    }

    fn acted_step_id(steps: &[ApprovalStep], document_id: Uuid, actor_id: Uuid) -> Result<Uuid, AppError> {
        steps
            .iter()
            .find(|s| s.approver_id == actor_id)
            .map(|s| s.id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "approval step for actor {} on document {}",
                    actor_id, document_id
                ))
            })
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create_document(
        &self,
        new_document: NewDocument,
        steps: Vec<NewApprovalStep>,
    ) -> Result<Document, AppError> {
        let document = new_document.into_document(Utc::now());
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            r#"
            INSERT INTO documents (
                id, company_id, entity_id, name, content_type, size_bytes,
                storage_key, sha256, validation_enabled, validation_status,
                creator_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(document.id)
        .bind(document.company_id)
        .bind(document.entity_id)
        .bind(&document.name)
        .bind(&document.content_type)
        .bind(document.size_bytes)
        .bind(&document.storage_key)
        .bind(&document.sha256)
        .bind(document.validation_enabled)
        .bind(document.validation_status.map(|s| s.as_code()))
        .bind(document.creator_id)
        .bind(document.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        for step in steps {
            let step = step.into_step(document.id);
            sqlx::query(
                r#"
                INSERT INTO approval_steps (id, document_id, "order", approver_id, status)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(step.id)
            .bind(step.document_id)
            .bind(step.order)
            .bind(step.approver_id)
            .bind(step.status.as_code())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;

        tracing::info!(
            document_id = %document.id,
            storage_key = %document.storage_key,
            validation_enabled = document.validation_enabled,
            "Document created"
        );
        Ok(document)
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, company_id, entity_id, name, content_type, size_bytes,
                   storage_key, sha256, validation_enabled, validation_status,
                   creator_id, created_at
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(TryInto::try_into).transpose()
    }

    async fn list_steps(&self, document_id: Uuid) -> Result<Vec<ApprovalStep>, AppError> {
        let rows = sqlx::query_as::<_, StepRow>(
            r#"
            SELECT id, document_id, "order", approver_id, status, reason, acted_at
            FROM approval_steps
            WHERE document_id = $1
            ORDER BY "order"
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get_actor(&self, id: Uuid) -> Result<Option<Actor>, AppError> {
        let row = sqlx::query_as::<_, ActorRow>(
            "SELECT id, username, is_superuser FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn get_company(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let row = sqlx::query_as::<_, CompanyRow>("SELECT id, name FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn get_entity(&self, id: Uuid) -> Result<Option<BusinessEntity>, AppError> {
        let row = sqlx::query_as::<_, EntityRow>(
            "SELECT id, entity_type, company_id FROM business_entities WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn find_by_storage_key(&self, storage_key: &str) -> Result<Option<Document>, AppError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, company_id, entity_id, name, content_type, size_bytes,
                   storage_key, sha256, validation_enabled, validation_status,
                   creator_id, created_at
            FROM documents
            WHERE storage_key = $1
            "#,
        )
        .bind(storage_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(TryInto::try_into).transpose()
    }

    async fn record_upload(
        &self,
        storage_key: &str,
        size_bytes: i64,
        sha256: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE documents SET size_bytes = $2, sha256 = $3 WHERE storage_key = $1",
        )
        .bind(storage_key)
        .bind(size_bytes)
        .bind(sha256)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn approve_step(
        &self,
        document_id: Uuid,
        actor_id: Uuid,
        reason: &str,
    ) -> Result<ApprovalDecision, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let document = Self::lock_document(&mut tx, document_id).await?;
        let steps = Self::steps_for_update(&mut tx, document_id).await?;
        let acted_id = Self::acted_step_id(&steps, document_id, actor_id)?;

        let plan = plan_approval(&document, &steps, acted_id, reason, Utc::now())?;
        Self::apply_plan(&mut tx, &plan).await?;

        tx.commit().await.map_err(db_err)?;

        tracing::info!(
            document_id = %document_id,
            actor_id = %actor_id,
            cascaded_steps = plan.step_updates.len() - 1,
            document_approved = plan.document_approved,
            "Approval step applied"
        );
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
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let document = Self::lock_document(&mut tx, document_id).await?;
        let steps = Self::steps_for_update(&mut tx, document_id).await?;
        let acted_id = Self::acted_step_id(&steps, document_id, actor_id)?;

        let plan = plan_rejection(&document, &steps, acted_id, reason, Utc::now())?;
        Self::apply_plan(&mut tx, &plan).await?;

        tx.commit().await.map_err(db_err)?;

        tracing::info!(
            document_id = %document_id,
            actor_id = %actor_id,
            "Rejection applied, document workflow terminated"
        );
        Ok(())
    }
}

fn db_err(err: sqlx::Error) -> AppError {
    AppError::Database(err.to_string())
}

// ----- Row types -----
//
// Status columns are one-character codes; an unknown code is treated as a
// corrupt row, not silently defaulted.

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    company_id: Uuid,
    entity_id: Uuid,
    name: String,
    content_type: String,
    size_bytes: Option<i64>,
    storage_key: String,
    sha256: Option<String>,
    validation_enabled: bool,
    validation_status: Option<String>,
    creator_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = AppError;

    fn try_from(row: DocumentRow) -> Result<Self, AppError> {
        let validation_status = row
            .validation_status
            .as_deref()
            .map(|code| {
                ValidationStatus::from_code(code.trim()).ok_or_else(|| {
                    AppError::Database(format!(
                        "document {} has unknown validation_status {:?}",
                        row.id, code
                    ))
                })
            })
            .transpose()?;
        Ok(Document {
            id: row.id,
            company_id: row.company_id,
            entity_id: row.entity_id,
            name: row.name,
            content_type: row.content_type,
            size_bytes: row.size_bytes,
            storage_key: row.storage_key,
            sha256: row.sha256,
            validation_enabled: row.validation_enabled,
            validation_status,
            creator_id: row.creator_id,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StepRow {
    id: Uuid,
    document_id: Uuid,
    order: i32,
    approver_id: Uuid,
    status: String,
    reason: Option<String>,
    acted_at: Option<DateTime<Utc>>,
}

impl TryFrom<StepRow> for ApprovalStep {
    type Error = AppError;

    fn try_from(row: StepRow) -> Result<Self, AppError> {
        let status = StepStatus::from_code(row.status.trim()).ok_or_else(|| {
            AppError::Database(format!(
                "approval step {} has unknown status {:?}",
                row.id, row.status
            ))
        })?;
        Ok(ApprovalStep {
            id: row.id,
            document_id: row.document_id,
            order: row.order,
            approver_id: row.approver_id,
            status,
            reason: row.reason,
            acted_at: row.acted_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ActorRow {
    id: Uuid,
    username: String,
    is_superuser: bool,
}

impl From<ActorRow> for Actor {
    fn from(row: ActorRow) -> Self {
        Actor {
            id: row.id,
            username: row.username,
            is_superuser: row.is_superuser,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CompanyRow {
    id: Uuid,
    name: String,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Company {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EntityRow {
    id: Uuid,
    entity_type: String,
    company_id: Uuid,
}

impl From<EntityRow> for BusinessEntity {
    fn from(row: EntityRow) -> Self {
        BusinessEntity {
            id: row.id,
            entity_type: row.entity_type,
            company_id: row.company_id,
        }
    }
}
