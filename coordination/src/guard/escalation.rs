//! Escalation guards
//!
//! `pending → resolved` and `pending → dismissed` are the only transitions.
//! Acting on an escalation that already left `pending` is a denial, never a
//! silent no-op.

use super::{GuardResult, Preconditions};
use crate::ids::EntityKind;
use crate::model::EscalationStatus;

const KIND: EntityKind = EntityKind::Escalation;

/// A referenced origin entity and whether it resolved in the store
#[derive(Debug, Clone)]
pub struct OriginRef {
    pub kind: EntityKind,
    pub id: String,
    pub exists: bool,
}

/// Context for raising an escalation
#[derive(Debug, Clone)]
pub struct CreateEscalationContext {
    /// Back-references in check order (plan, task, approval / patrol, stuck)
    pub origins: Vec<OriginRef>,
    pub reason: String,
}

/// Context for resolving or dismissing an escalation
#[derive(Debug, Clone)]
pub struct EscalationContext {
    pub escalation_id: String,
    pub status: Option<EscalationStatus>,
}

pub fn can_create(ctx: &CreateEscalationContext) -> GuardResult {
    ctx.origins
        .iter()
        .fold(Preconditions::new(), |checks, origin| {
            checks.require_found(origin.exists, origin.kind, &origin.id)
        })
        .require_text(&ctx.reason, || "escalation reason cannot be empty".to_string())
        .verdict()
}

pub fn can_resolve(ctx: &EscalationContext, resolution: &str) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), KIND, &ctx.escalation_id)
        .require_status(
            ctx.status,
            &[EscalationStatus::Pending],
            "resolve pending escalations",
        )
        .require_text(resolution, || {
            "resolution is required to resolve an escalation".to_string()
        })
        .verdict()
}

pub fn can_dismiss(ctx: &EscalationContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), KIND, &ctx.escalation_id)
        .require_status(
            ctx.status,
            &[EscalationStatus::Pending],
            "dismiss pending escalations",
        )
        .verdict()
}
