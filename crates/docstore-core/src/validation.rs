//! Approval workflow planner.
//!
//! The hierarchical cascade and terminal rules live here as a pure function
//! over a snapshot of a document and its steps. The planner produces a
//! [`ValidationPlan`] — the full three-way update (cascaded steps, acted
//! step, document status) — which a store backend applies as one atomic
//! unit of work. Keeping the rules out of the backends means SQL and
//! in-memory stores cannot drift apart on workflow semantics.
//!
//! Rank model: a step's `order` is hierarchical rank (higher = higher
//! approver). Approving a step auto-approves every still-pending step of
//! strictly lower order. The document is approved when no step remains
//! pending, or when the acted step holds the maximum order. Rejection is
//! unconditional and terminal.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{ApprovalStep, Document, StepStatus, ValidationStatus};

/// Reason recorded on steps approved implicitly by a higher-ranked approver.
pub const AUTO_APPROVE_REASON: &str = "Auto-approved by higher approver";

/// A single step mutation within a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepUpdate {
    pub step_id: Uuid,
    pub status: StepStatus,
    pub reason: Option<String>,
    pub acted_at: DateTime<Utc>,
}

/// The atomic unit of work an approval or rejection produces.
///
/// `document_status` is `None` when the document stays Pending. Backends
/// must apply all step updates and the document status in one transaction,
/// or nothing at all.
#[derive(Debug, Clone)]
pub struct ValidationPlan {
    pub document_id: Uuid,
    pub step_updates: Vec<StepUpdate>,
    pub document_status: Option<ValidationStatus>,
    /// True when this plan moves the document to Approved.
    pub document_approved: bool,
}

/// Plan the approval of `acted_step_id` with the hierarchical cascade.
///
/// Fails with `WorkflowDisabled` when the document has no validation flow,
/// `DocumentTerminal` when the document already reached Approved/Rejected,
/// and `AlreadyActed` when the step is not Pending.
pub fn plan_approval(
    document: &Document,
    steps: &[ApprovalStep],
    acted_step_id: Uuid,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<ValidationPlan, AppError> {
    let acted = workflow_preconditions(document, steps, acted_step_id)?;
    if acted.status != StepStatus::Pending {
        return Err(AppError::AlreadyActed(format!(
            "step {} is not pending",
            acted.id
        )));
    }

    let mut step_updates = Vec::new();

    // Cascade: a higher-rank sign-off implicitly satisfies every pending
    // lower-rank step. Strictly lower — equal-order ties are never resolved
    // on the acting approver's behalf.
    for step in steps {
        if step.id != acted.id && step.order < acted.order && step.status == StepStatus::Pending {
            step_updates.push(StepUpdate {
                step_id: step.id,
                status: StepStatus::Approved,
                reason: Some(AUTO_APPROVE_REASON.to_string()),
                acted_at: now,
            });
        }
    }

    step_updates.push(StepUpdate {
        step_id: acted.id,
        status: StepStatus::Approved,
        reason: Some(reason.to_string()),
        acted_at: now,
    });

    let updated_ids: Vec<Uuid> = step_updates.iter().map(|u| u.step_id).collect();
    let any_pending = steps
        .iter()
        .any(|s| s.status == StepStatus::Pending && !updated_ids.contains(&s.id));
    let max_order = steps.iter().map(|s| s.order).max().unwrap_or(acted.order);

    let document_approved = !any_pending || acted.order == max_order;

    Ok(ValidationPlan {
        document_id: document.id,
        step_updates,
        document_status: document_approved.then_some(ValidationStatus::Approved),
        document_approved,
    })
}

/// Plan the rejection of `acted_step_id`. Rejection always terminates the
/// workflow: the document moves to Rejected regardless of other steps.
///
/// Re-rejecting an already-rejected step fails with `AlreadyActed`.
/// Rejecting a previously approved step is allowed while the document is
/// still Pending.
pub fn plan_rejection(
    document: &Document,
    steps: &[ApprovalStep],
    acted_step_id: Uuid,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<ValidationPlan, AppError> {
    let acted = workflow_preconditions(document, steps, acted_step_id)?;
    if acted.status == StepStatus::Rejected {
        return Err(AppError::AlreadyActed(format!(
            "step {} is already rejected",
            acted.id
        )));
    }

    Ok(ValidationPlan {
        document_id: document.id,
        step_updates: vec![StepUpdate {
            step_id: acted.id,
            status: StepStatus::Rejected,
            reason: Some(reason.to_string()),
            acted_at: now,
        }],
        document_status: Some(ValidationStatus::Rejected),
        document_approved: false,
    })
}

/// Shared preconditions: workflow enabled, document not terminal, step
/// belongs to the document. Returns the acted step.
fn workflow_preconditions<'a>(
    document: &Document,
    steps: &'a [ApprovalStep],
    acted_step_id: Uuid,
) -> Result<&'a ApprovalStep, AppError> {
    if !document.validation_enabled {
        return Err(AppError::WorkflowDisabled(document.id.to_string()));
    }
    if matches!(document.validation_status, Some(s) if s.is_terminal()) {
        return Err(AppError::DocumentTerminal(document.id.to_string()));
    }

    let acted = steps
        .iter()
        .find(|s| s.id == acted_step_id && s.document_id == document.id)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "approval step {} for document {}",
                acted_step_id, document.id
            ))
        })?;

    // Duplicate orders make the cascade ambiguous. Flag the configuration
    // hazard; the rule itself stays literal.
    let mut orders: Vec<i32> = steps.iter().map(|s| s.order).collect();
    orders.sort_unstable();
    if orders.windows(2).any(|w| w[0] == w[1]) {
        tracing::warn!(
            document_id = %document.id,
            "duplicate step orders detected; equal-order steps never auto-approve each other"
        );
    }

    Ok(acted)
}
