pub mod approval;
pub mod document;
pub mod party;

pub use approval::{ApprovalStep, NewApprovalStep, StepStatus};
pub use document::{Document, NewDocument, ValidationStatus};
pub use party::{Actor, BusinessEntity, Company};
