//! Patrol, check and stuck guards

use super::{GuardResult, Preconditions};
use crate::ids::EntityKind;
use crate::model::{PatrolStatus, StuckStatus};

#[derive(Debug, Clone)]
pub struct StartPatrolContext {
    pub seat_id: String,
    pub target: String,
    /// The seat's current active patrol, if any
    pub active_patrol_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PatrolContext {
    pub patrol_id: String,
    pub status: Option<PatrolStatus>,
}

#[derive(Debug, Clone)]
pub struct OpenStuckContext {
    pub patrol_id: String,
    pub patrol_status: Option<PatrolStatus>,
    pub open_stuck_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StuckContext {
    pub stuck_id: String,
    pub status: Option<StuckStatus>,
}

pub fn can_start(ctx: &StartPatrolContext) -> GuardResult {
    Preconditions::new()
        .require_text(&ctx.target, || "patrol target cannot be empty".to_string())
        .require(ctx.active_patrol_id.is_none(), || {
            format!(
                "seat {} already has an active patrol {}",
                ctx.seat_id,
                ctx.active_patrol_id.as_deref().unwrap_or_default()
            )
        })
        .verdict()
}

pub fn can_stop(ctx: &PatrolContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), EntityKind::Patrol, &ctx.patrol_id)
        .require_status(ctx.status, &[PatrolStatus::Active], "stop active patrols")
        .verdict()
}

pub fn can_escalate(ctx: &PatrolContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), EntityKind::Patrol, &ctx.patrol_id)
        .require_status(ctx.status, &[PatrolStatus::Active], "escalate active patrols")
        .verdict()
}

/// Checks may land on a patrol that was stopped mid-tick.
pub fn can_record_check(ctx: &PatrolContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), EntityKind::Patrol, &ctx.patrol_id)
        .verdict()
}

pub fn can_open_stuck(ctx: &OpenStuckContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.patrol_status.is_some(), EntityKind::Patrol, &ctx.patrol_id)
        .require_status(
            ctx.patrol_status,
            &[PatrolStatus::Active],
            "open stucks on active patrols",
        )
        .require(ctx.open_stuck_id.is_none(), || {
            format!(
                "patrol {} already has an open stuck {}",
                ctx.patrol_id,
                ctx.open_stuck_id.as_deref().unwrap_or_default()
            )
        })
        .verdict()
}

fn require_open(ctx: &StuckContext, verb: &str) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), EntityKind::Stuck, &ctx.stuck_id)
        .require_status(ctx.status, &[StuckStatus::Open], &format!("{} open stucks", verb))
        .verdict()
}

pub fn can_increment_stuck(ctx: &StuckContext) -> GuardResult {
    require_open(ctx, "increment")
}

pub fn can_resolve_stuck(ctx: &StuckContext) -> GuardResult {
    require_open(ctx, "resolve")
}

pub fn can_escalate_stuck(ctx: &StuckContext) -> GuardResult {
    require_open(ctx, "escalate")
}
