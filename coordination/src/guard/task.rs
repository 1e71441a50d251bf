//! Task guards

use super::{GuardResult, Preconditions};
use crate::ids::EntityKind;
use crate::model::{ShipmentStatus, TaskStatus};

const KIND: EntityKind = EntityKind::Task;

/// Context for creating a task, optionally under a shipment and investigation
#[derive(Debug, Clone)]
pub struct CreateTaskContext {
    pub shipment_id: Option<String>,
    /// Status of the parent shipment; `None` when absent or missing
    pub shipment_status: Option<ShipmentStatus>,
    pub investigation_id: Option<String>,
    pub investigation_exists: bool,
    pub title: String,
}

/// Context for transitions on an existing task
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub task_id: String,
    /// `None` when the task does not exist
    pub status: Option<TaskStatus>,
    pub pinned: bool,
}

/// Context for moving a task to another shipment
#[derive(Debug, Clone)]
pub struct MoveTaskContext {
    pub task_id: String,
    pub task_exists: bool,
    pub shipment_id: String,
    pub shipment_status: Option<ShipmentStatus>,
}

pub fn can_create(ctx: &CreateTaskContext) -> GuardResult {
    let mut checks = Preconditions::new();
    if let Some(shipment_id) = &ctx.shipment_id {
        checks = checks
            .require_found(ctx.shipment_status.is_some(), EntityKind::Shipment, shipment_id)
            .require(ctx.shipment_status != Some(ShipmentStatus::Closed), || {
                format!("cannot add tasks to closed shipment {}", shipment_id)
            });
    }
    if let Some(investigation_id) = &ctx.investigation_id {
        checks = checks.require_found(
            ctx.investigation_exists,
            EntityKind::Investigation,
            investigation_id,
        );
    }
    checks
        .require_text(&ctx.title, || "task title cannot be empty".to_string())
        .verdict()
}

pub fn can_start(ctx: &TaskContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), KIND, &ctx.task_id)
        .require_status(ctx.status, &[TaskStatus::Open], "start open tasks")
        .verdict()
}

pub fn can_block(ctx: &TaskContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), KIND, &ctx.task_id)
        .require_status(
            ctx.status,
            &[TaskStatus::Open, TaskStatus::InProgress],
            "block open or in-progress tasks",
        )
        .verdict()
}

pub fn can_unblock(ctx: &TaskContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), KIND, &ctx.task_id)
        .require_status(ctx.status, &[TaskStatus::Blocked], "unblock blocked tasks")
        .verdict()
}

pub fn can_complete(ctx: &TaskContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), KIND, &ctx.task_id)
        .require_unpinned(ctx.pinned, "complete", KIND, &ctx.task_id)
        .require(ctx.status != Some(TaskStatus::Closed), || {
            format!("task {} is already closed", ctx.task_id)
        })
        .verdict()
}

pub fn can_move(ctx: &MoveTaskContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.task_exists, KIND, &ctx.task_id)
        .require_found(
            ctx.shipment_status.is_some(),
            EntityKind::Shipment,
            &ctx.shipment_id,
        )
        .require(ctx.shipment_status != Some(ShipmentStatus::Closed), || {
            format!("cannot move tasks to closed shipment {}", ctx.shipment_id)
        })
        .verdict()
}

pub fn can_delete(ctx: &TaskContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), KIND, &ctx.task_id)
        .require_unpinned(ctx.pinned, "delete", KIND, &ctx.task_id)
        .verdict()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(shipment: Option<(&str, Option<ShipmentStatus>)>) -> CreateTaskContext {
        CreateTaskContext {
            shipment_id: shipment.map(|(id, _)| id.to_string()),
            shipment_status: shipment.and_then(|(_, s)| s),
            investigation_id: None,
            investigation_exists: false,
            title: "write the lexer".into(),
        }
    }

    fn ctx(status: Option<TaskStatus>, pinned: bool) -> TaskContext {
        TaskContext {
            task_id: "TASK-007".into(),
            status,
            pinned,
        }
    }

    #[test]
    fn test_create_under_missing_shipment() {
        let verdict = can_create(&create(Some(("SHIP-999", None))));
        assert_eq!(verdict.reason, "shipment SHIP-999 not found");
    }

    #[test]
    fn test_create_without_shipment() {
        assert!(can_create(&create(None)).allowed);
    }

    #[test]
    fn test_create_under_closed_shipment() {
        let verdict = can_create(&create(Some(("SHIP-002", Some(ShipmentStatus::Closed)))));
        assert_eq!(verdict.reason, "cannot add tasks to closed shipment SHIP-002");
    }

    #[test]
    fn test_create_with_missing_investigation() {
        let mut c = create(None);
        c.investigation_id = Some("INV-003".into());
        assert_eq!(can_create(&c).reason, "investigation INV-003 not found");
    }

    #[test]
    fn test_pinned_task_cannot_complete() {
        let verdict = can_complete(&ctx(Some(TaskStatus::InProgress), true));
        assert_eq!(
            verdict.reason,
            "cannot complete pinned task TASK-007. Unpin first with: orc task unpin TASK-007"
        );
    }

    #[test]
    fn test_block_unblock_cycle() {
        assert!(can_block(&ctx(Some(TaskStatus::InProgress), false)).allowed);
        assert_eq!(
            can_block(&ctx(Some(TaskStatus::Closed), false)).reason,
            "can only block open or in-progress tasks (current status: closed)"
        );
        assert!(can_unblock(&ctx(Some(TaskStatus::Blocked), false)).allowed);
        assert_eq!(
            can_unblock(&ctx(Some(TaskStatus::Open), false)).reason,
            "can only unblock blocked tasks (current status: open)"
        );
    }

    #[test]
    fn test_complete_closed_task() {
        assert_eq!(
            can_complete(&ctx(Some(TaskStatus::Closed), false)).reason,
            "task TASK-007 is already closed"
        );
    }

    #[test]
    fn test_move_checks_task_then_shipment() {
        let verdict = can_move(&MoveTaskContext {
            task_id: "TASK-404".into(),
            task_exists: false,
            shipment_id: "SHIP-404".into(),
            shipment_status: None,
        });
        assert_eq!(verdict.reason, "task TASK-404 not found");
    }
}
