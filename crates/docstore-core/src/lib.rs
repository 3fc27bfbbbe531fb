//! Docstore Core Library
//!
//! Domain models, error types, configuration, and the approval workflow
//! planner shared across all docstore crates.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::AppError;
pub use models::{
    Actor, ApprovalStep, BusinessEntity, Company, Document, StepStatus, ValidationStatus,
};
pub use validation::{plan_approval, plan_rejection, StepUpdate, ValidationPlan};
