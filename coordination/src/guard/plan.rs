//! Plan and approval guards
//!
//! A task has at most one active (draft or pending) plan. Review records
//! exactly one approval per plan, with outcome `approved` or `escalated`.

use super::{GuardResult, Preconditions};
use crate::ids::EntityKind;
use crate::model::{PlanStatus, TaskStatus};

const KIND: EntityKind = EntityKind::Plan;

/// Context for creating a plan for a task
#[derive(Debug, Clone)]
pub struct CreatePlanContext {
    pub task_id: String,
    pub task_status: Option<TaskStatus>,
    /// ID of the task's current draft/pending plan, if any
    pub active_plan_id: Option<String>,
}

/// Context for transitions on an existing plan
#[derive(Debug, Clone)]
pub struct PlanContext {
    pub plan_id: String,
    pub status: Option<PlanStatus>,
    pub has_content: bool,
    /// ID of the plan's approval, if one was recorded
    pub approval_id: Option<String>,
}

pub fn can_create(ctx: &CreatePlanContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.task_status.is_some(), EntityKind::Task, &ctx.task_id)
        .require(ctx.task_status != Some(TaskStatus::Closed), || {
            format!("cannot plan closed task {}", ctx.task_id)
        })
        .require(ctx.active_plan_id.is_none(), || {
            format!(
                "task {} already has an active plan {}",
                ctx.task_id,
                ctx.active_plan_id.as_deref().unwrap_or_default()
            )
        })
        .verdict()
}

pub fn can_submit(ctx: &PlanContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), KIND, &ctx.plan_id)
        .require_status(ctx.status, &[PlanStatus::Draft], "submit draft plans")
        .require(ctx.has_content, || format!("plan {} has no content", ctx.plan_id))
        .verdict()
}

/// Approve or escalate; both record the plan's single approval.
pub fn can_review(ctx: &PlanContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), KIND, &ctx.plan_id)
        .require_status(
            ctx.status,
            &[PlanStatus::PendingReview],
            "review plans pending review",
        )
        .require(ctx.approval_id.is_none(), || {
            format!(
                "plan {} already has an {}",
                ctx.plan_id,
                EntityKind::Approval.prefix()
            )
        })
        .verdict()
}

pub fn can_delete(ctx: &PlanContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), KIND, &ctx.plan_id)
        .require_status(ctx.status, &[PlanStatus::Draft], "delete draft plans")
        .verdict()
}
