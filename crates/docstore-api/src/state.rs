//! Application state.
//!
//! One shared struct holding the store seam, the transfer and validation
//! services, and the startup configuration. Handlers extract it via
//! `State<Arc<AppState>>`.

use std::sync::Arc;

use anyhow::Result;

use docstore_core::Config;
use docstore_db::DocumentStore;
use docstore_storage::{BucketPaths, LocalBucket, TokenCodec};

use crate::policy::AccessPolicy;
use crate::services::{TransferService, ValidationService};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub transfers: TransferService,
    pub validation: ValidationService,
}

impl AppState {
    /// Wire services from configuration plus injected store and policy.
    /// Creates the storage root if it does not exist yet.
    pub async fn build(
        config: Config,
        store: Arc<dyn DocumentStore>,
        policy: Arc<dyn AccessPolicy>,
    ) -> Result<Arc<Self>> {
        let codec = TokenCodec::new(config.presign_secret.clone());
        let paths = BucketPaths::new(&config.storage_root);
        let bucket = LocalBucket::new(&config.storage_root).await?;

        let transfers = TransferService::new(
            codec,
            paths,
            bucket,
            store.clone(),
            config.presign_ttl_secs,
        );
        let validation = ValidationService::new(store.clone(), policy);

        Ok(Arc::new(AppState {
            config,
            store,
            transfers,
            validation,
        }))
    }
}
