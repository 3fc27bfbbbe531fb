//! End-to-end workflow tests against the in-memory store and a temporary
//! bucket: create a document, move bytes through presigned tokens, and
//! drive the approval workflow through the service layer.
//!
//! Run with: `cargo test -p docstore-api --test workflow_test`

use std::sync::Arc;

use futures::StreamExt;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use docstore_api::policy::SuperuserPolicy;
use docstore_api::services::{TransferService, ValidationService};
use docstore_core::models::{
    Actor, BusinessEntity, Company, NewApprovalStep, NewDocument, ValidationStatus,
};
use docstore_core::AppError;
use docstore_db::{DocumentStore, MemoryDocumentStore};
use docstore_storage::{BucketPaths, LocalBucket, TokenCodec, TransferMode};

const SECRET: &[u8] = b"workflow-test-secret";
const TTL: u64 = 300;

struct TestApp {
    _dir: tempfile::TempDir,
    store: Arc<MemoryDocumentStore>,
    transfers: TransferService,
    validation: ValidationService,
    codec: TokenCodec,
}

async fn setup() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryDocumentStore::new());
    let codec = TokenCodec::new(SECRET.to_vec());
    let paths = BucketPaths::new(dir.path());
    let bucket = LocalBucket::new(dir.path()).await.unwrap();

    let dyn_store: Arc<dyn DocumentStore> = store.clone();
    let transfers = TransferService::new(
        codec.clone(),
        paths,
        bucket,
        dyn_store.clone(),
        TTL,
    );
    let validation = ValidationService::new(dyn_store, Arc::new(SuperuserPolicy));

    TestApp {
        _dir: dir,
        store,
        transfers,
        validation,
        codec,
    }
}

struct Workflow {
    document_id: Uuid,
    storage_key: String,
    approvers: Vec<Uuid>,
}

/// Seed a company, an entity, superuser approvers, and a document with one
/// approval step per given order.
async fn seed_workflow(app: &TestApp, orders: &[i32]) -> Workflow {
    let company_id = Uuid::new_v4();
    let entity_id = Uuid::new_v4();
    app.store
        .insert_company(Company {
            id: company_id,
            name: "Transportes Andinos".into(),
        })
        .await;
    app.store
        .insert_entity(BusinessEntity {
            id: entity_id,
            entity_type: "vehicle".into(),
            company_id,
        })
        .await;

    let approvers: Vec<Uuid> = orders.iter().map(|_| Uuid::new_v4()).collect();
    for (i, id) in approvers.iter().enumerate() {
        app.store
            .insert_actor(Actor {
                id: *id,
                username: format!("approver{}", i),
                is_superuser: true,
            })
            .await;
    }

    let storage_key = format!("companies/{}/vehicles/{}/soat.pdf", company_id, entity_id);
    let document = app
        .store
        .create_document(
            NewDocument {
                company_id,
                entity_id,
                name: "soat.pdf".into(),
                content_type: "application/pdf".into(),
                size_bytes: None,
                storage_key: storage_key.clone(),
                validation_enabled: !orders.is_empty(),
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

    Workflow {
        document_id: document.id,
        storage_key,
        approvers,
    }
}

#[tokio::test]
async fn upload_reconciles_size_and_digest() {
    let app = setup().await;
    let wf = seed_workflow(&app, &[]).await;

    let token = app
        .transfers
        .issue_upload_token(&wf.storage_key)
        .await
        .unwrap();
    let body = b"%PDF-1.4 fake soat document";
    let outcome = app.transfers.handle_upload(&token, body).await.unwrap();
    assert_eq!(outcome.size_bytes, body.len() as u64);

    let doc = app
        .store
        .get_document(wf.document_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(doc.size_bytes, Some(body.len() as i64));
    assert_eq!(doc.sha256.as_deref(), Some(hex::encode(Sha256::digest(body)).as_str()));
}

#[tokio::test]
async fn download_streams_uploaded_bytes() {
    let app = setup().await;
    let wf = seed_workflow(&app, &[]).await;

    let upload = app
        .transfers
        .issue_upload_token(&wf.storage_key)
        .await
        .unwrap();
    let body = b"document bytes to stream back";
    app.transfers.handle_upload(&upload, body).await.unwrap();

    let download = app.transfers.issue_download_token(&wf.storage_key).unwrap();
    let payload = app.transfers.handle_download(&download).await.unwrap();
    assert_eq!(payload.size_bytes, body.len() as u64);
    assert_eq!(
        payload.document.as_ref().map(|d| d.id),
        Some(wf.document_id)
    );

    let mut stream = payload.stream;
    let mut collected = Vec::new();
    while let Some(chunk) = stream.next().await {
        collected.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(collected, body);
}

#[tokio::test]
async fn mode_mismatch_is_an_invalid_token() {
    let app = setup().await;
    let wf = seed_workflow(&app, &[]).await;

    let upload = app
        .transfers
        .issue_upload_token(&wf.storage_key)
        .await
        .unwrap();
    let download = app.transfers.issue_download_token(&wf.storage_key).unwrap();

    let err = app.transfers.handle_download(&upload).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidToken));

    let err = app.transfers.handle_upload(&download, b"x").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidToken));
}

#[tokio::test]
async fn expired_token_is_an_invalid_token() {
    let app = setup().await;
    let wf = seed_workflow(&app, &[]).await;

    // Same secret, but issued far enough in the past to be expired now.
    let stale = app.codec.issue_at(
        &format!("/irrelevant/{}", wf.storage_key),
        TransferMode::Upload,
        10,
        chrono::Utc::now().timestamp() - 1_000,
    );
    let err = app.transfers.handle_upload(&stale, b"x").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidToken));
}

#[tokio::test]
async fn download_of_missing_file_is_not_found() {
    let app = setup().await;
    let wf = seed_workflow(&app, &[]).await;

    let token = app.transfers.issue_download_token(&wf.storage_key).unwrap();
    let err = app.transfers.handle_download(&token).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn hierarchical_approval_finalizes_at_the_top() {
    let app = setup().await;
    let wf = seed_workflow(&app, &[1, 2, 3]).await;

    let decision = app
        .validation
        .approve(wf.document_id, wf.approvers[1], "checked")
        .await
        .unwrap();
    assert!(!decision.document_approved);

    let decision = app
        .validation
        .approve(wf.document_id, wf.approvers[2], "final sign-off")
        .await
        .unwrap();
    assert!(decision.document_approved);

    let doc = app
        .store
        .get_document(wf.document_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(doc.validation_status, Some(ValidationStatus::Approved));
}

#[tokio::test]
async fn rejection_terminates_the_workflow() {
    let app = setup().await;
    let wf = seed_workflow(&app, &[1, 2]).await;

    app.validation
        .reject(wf.document_id, wf.approvers[0], "wrong file")
        .await
        .unwrap();

    let doc = app
        .store
        .get_document(wf.document_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(doc.validation_status, Some(ValidationStatus::Rejected));

    let err = app
        .validation
        .approve(wf.document_id, wf.approvers[1], "")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DocumentTerminal(_)));
}

#[tokio::test]
async fn non_superuser_actor_is_forbidden() {
    let app = setup().await;
    let wf = seed_workflow(&app, &[1]).await;

    let outsider = Uuid::new_v4();
    app.store
        .insert_actor(Actor {
            id: outsider,
            username: "outsider".into(),
            is_superuser: false,
        })
        .await;

    let err = app
        .validation
        .approve(wf.document_id, outsider, "")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn unknown_document_or_actor_is_not_found() {
    let app = setup().await;
    let wf = seed_workflow(&app, &[1]).await;

    let err = app
        .validation
        .approve(Uuid::new_v4(), wf.approvers[0], "")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = app
        .validation
        .approve(wf.document_id, Uuid::new_v4(), "")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
