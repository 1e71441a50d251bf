//! Commission guards

use super::{GuardResult, Preconditions};
use crate::ids::EntityKind;
use crate::model::CommissionStatus;

const KIND: EntityKind = EntityKind::Commission;

/// Context for creating a commission
#[derive(Debug, Clone)]
pub struct CreateCommissionContext {
    pub title: String,
}

/// Context for status transitions on an existing commission
#[derive(Debug, Clone)]
pub struct CommissionContext {
    pub commission_id: String,
    /// `None` when the commission does not exist
    pub status: Option<CommissionStatus>,
    pub pinned: bool,
}

/// Context for deleting a commission
#[derive(Debug, Clone)]
pub struct DeleteCommissionContext {
    pub commission_id: String,
    pub exists: bool,
    pub shipment_count: usize,
    pub force: bool,
}

pub fn can_create(ctx: &CreateCommissionContext) -> GuardResult {
    Preconditions::new()
        .require_text(&ctx.title, || "commission title cannot be empty".to_string())
        .verdict()
}

pub fn can_activate(ctx: &CommissionContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), KIND, &ctx.commission_id)
        .require_status(
            ctx.status,
            &[CommissionStatus::Initial],
            "activate initial commissions",
        )
        .verdict()
}

pub fn can_pause(ctx: &CommissionContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), KIND, &ctx.commission_id)
        .require_status(
            ctx.status,
            &[CommissionStatus::Active],
            "pause active commissions",
        )
        .verdict()
}

pub fn can_resume(ctx: &CommissionContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), KIND, &ctx.commission_id)
        .require_status(
            ctx.status,
            &[CommissionStatus::Paused],
            "resume paused commissions",
        )
        .verdict()
}

pub fn can_complete(ctx: &CommissionContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), KIND, &ctx.commission_id)
        .require_unpinned(ctx.pinned, "complete", KIND, &ctx.commission_id)
        .require_status(
            ctx.status,
            &[CommissionStatus::Active, CommissionStatus::Paused],
            "complete active or paused commissions",
        )
        .verdict()
}

pub fn can_archive(ctx: &CommissionContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), KIND, &ctx.commission_id)
        .require_unpinned(ctx.pinned, "archive", KIND, &ctx.commission_id)
        .require_status(
            ctx.status,
            &[CommissionStatus::Complete],
            "archive complete commissions",
        )
        .verdict()
}

pub fn can_delete(ctx: &DeleteCommissionContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.exists, KIND, &ctx.commission_id)
        .require(ctx.force || ctx.shipment_count == 0, || {
            format!(
                "commission {} has {} shipment(s). Use --force to delete anyway",
                ctx.commission_id, ctx.shipment_count
            )
        })
        .verdict()
}
