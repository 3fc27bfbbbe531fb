pub mod database;
pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;

use docstore_core::Config;
use docstore_db::PgDocumentStore;

use crate::policy::SuperuserPolicy;
use crate::state::AppState;

/// Initialize the application: database, services, routes.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router)> {
    let pool = database::setup_database(&config).await?;
    let store = Arc::new(PgDocumentStore::new(pool));
    let state = AppState::build(config, store, Arc::new(SuperuserPolicy)).await?;
    let router = routes::build_router(state.clone())?;
    Ok((state, router))
}
