//! Docstore persistence layer.
//!
//! The [`DocumentStore`] trait is the single seam between the workflow core
//! and a backing store. Approve/reject are store-level operations because
//! their three-way update (cascaded steps, acted step, document status)
//! must be applied atomically; each backend runs fetch → plan (pure, in
//! docstore-core) → apply inside its own atomicity mechanism: a Postgres
//! transaction with a row lock, or a mutex held across the whole call for
//! the in-memory store.

pub mod memory;
pub mod pg;
pub mod store;

pub use memory::MemoryDocumentStore;
pub use pg::PgDocumentStore;
pub use store::{ApprovalDecision, DocumentStore};
