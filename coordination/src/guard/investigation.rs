//! Investigation guards

use super::{GuardResult, Preconditions};
use crate::ids::EntityKind;
use crate::model::InvestigationStatus;

const KIND: EntityKind = EntityKind::Investigation;

#[derive(Debug, Clone)]
pub struct CreateInvestigationContext {
    pub commission_id: String,
    pub commission_exists: bool,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct InvestigationContext {
    pub investigation_id: String,
    pub status: Option<InvestigationStatus>,
    pub pinned: bool,
}

pub fn can_create(ctx: &CreateInvestigationContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.commission_exists, EntityKind::Commission, &ctx.commission_id)
        .require_text(&ctx.title, || "investigation title cannot be empty".to_string())
        .verdict()
}

pub fn can_pause(ctx: &InvestigationContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), KIND, &ctx.investigation_id)
        .require_status(
            ctx.status,
            &[InvestigationStatus::Active],
            "pause active investigations",
        )
        .verdict()
}

pub fn can_resume(ctx: &InvestigationContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), KIND, &ctx.investigation_id)
        .require_status(
            ctx.status,
            &[InvestigationStatus::Paused],
            "resume paused investigations",
        )
        .verdict()
}

pub fn can_complete(ctx: &InvestigationContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), KIND, &ctx.investigation_id)
        .require_unpinned(ctx.pinned, "complete", KIND, &ctx.investigation_id)
        .require(ctx.status != Some(InvestigationStatus::Complete), || {
            format!("investigation {} is already complete", ctx.investigation_id)
        })
        .verdict()
}
