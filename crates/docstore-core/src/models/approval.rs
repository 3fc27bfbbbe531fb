use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-step approval status. Stored as a one-character code (`P`/`A`/`R`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Approved,
    Rejected,
}

impl StepStatus {
    pub fn as_code(&self) -> &'static str {
        match self {
            StepStatus::Pending => "P",
            StepStatus::Approved => "A",
            StepStatus::Rejected => "R",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "P" => Some(StepStatus::Pending),
            "A" => Some(StepStatus::Approved),
            "R" => Some(StepStatus::Rejected),
            _ => None,
        }
    }
}

/// One approver in a document's validation workflow.
///
/// `order` is hierarchical rank, not creation sequence: a higher order means
/// a higher-ranked approver. Equal orders within one document are a caller
/// configuration error; the cascade rule never auto-resolves ties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalStep {
    pub id: Uuid,
    pub document_id: Uuid,
    pub order: i32,
    pub approver_id: Uuid,
    pub status: StepStatus,
    pub reason: Option<String>,
    pub acted_at: Option<DateTime<Utc>>,
}

/// Input for step creation at document-creation time.
#[derive(Debug, Clone)]
pub struct NewApprovalStep {
    pub order: i32,
    pub approver_id: Uuid,
}

impl NewApprovalStep {
    pub fn into_step(self, document_id: Uuid) -> ApprovalStep {
        ApprovalStep {
            id: Uuid::new_v4(),
            document_id,
            order: self.order,
            approver_id: self.approver_id,
            status: StepStatus::Pending,
            reason: None,
            acted_at: None,
        }
    }
}
