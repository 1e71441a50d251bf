//! Table and unique-key definitions
//!
//! Each entity kind has its own table. Unique keys are namespaced strings
//! built here so every adapter enforces the same constraints.

use crate::ids::EntityKind;

/// Table holding commissions
pub const TABLE_COMMISSIONS: &str = "commissions";
/// Table holding shipments
pub const TABLE_SHIPMENTS: &str = "shipments";
/// Table holding tasks
pub const TABLE_TASKS: &str = "tasks";
/// Table holding investigations
pub const TABLE_INVESTIGATIONS: &str = "investigations";
/// Table holding plans
pub const TABLE_PLANS: &str = "plans";
/// Table holding approvals
pub const TABLE_APPROVALS: &str = "approvals";
/// Table holding escalations
pub const TABLE_ESCALATIONS: &str = "escalations";
/// Table holding work orders
pub const TABLE_WORK_ORDERS: &str = "work_orders";
/// Table holding cycles
pub const TABLE_CYCLES: &str = "cycles";
/// Table holding cycle receipts
pub const TABLE_CYCLE_RECEIPTS: &str = "cycle_receipts";
/// Table holding receipts
pub const TABLE_RECEIPTS: &str = "receipts";
/// Table holding patrols
pub const TABLE_PATROLS: &str = "patrols";
/// Table holding checks
pub const TABLE_CHECKS: &str = "checks";
/// Table holding stucks
pub const TABLE_STUCKS: &str = "stucks";

/// Table name for a kind.
pub fn table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Commission => TABLE_COMMISSIONS,
        EntityKind::Shipment => TABLE_SHIPMENTS,
        EntityKind::Task => TABLE_TASKS,
        EntityKind::Investigation => TABLE_INVESTIGATIONS,
        EntityKind::Plan => TABLE_PLANS,
        EntityKind::Approval => TABLE_APPROVALS,
        EntityKind::Escalation => TABLE_ESCALATIONS,
        EntityKind::WorkOrder => TABLE_WORK_ORDERS,
        EntityKind::Cycle => TABLE_CYCLES,
        EntityKind::CycleReceipt => TABLE_CYCLE_RECEIPTS,
        EntityKind::Receipt => TABLE_RECEIPTS,
        EntityKind::Patrol => TABLE_PATROLS,
        EntityKind::Check => TABLE_CHECKS,
        EntityKind::Stuck => TABLE_STUCKS,
    }
}

/// Unique-key builders
pub mod keys {
    /// One child per parent (receipt per shipment, approval per plan, ...).
    pub fn one_per_parent(parent_id: &str) -> String {
        format!("parent:{}", parent_id)
    }

    /// One active plan per task.
    pub fn active_plan(task_id: &str) -> String {
        format!("active-plan:{}", task_id)
    }

    /// One active patrol per seat.
    pub fn active_patrol(seat_id: &str) -> String {
        format!("active-seat:{}", seat_id)
    }

    /// One open stuck per patrol.
    pub fn open_stuck(patrol_id: &str) -> String {
        format!("open-stuck:{}", patrol_id)
    }

    /// One escalation per stuck.
    pub fn stuck_escalation(stuck_id: &str) -> String {
        format!("stuck:{}", stuck_id)
    }

    /// Cycle numbers are unique within a shipment.
    pub fn cycle_number(shipment_id: &str, sequence: u32) -> String {
        format!("cycle:{}:{}", shipment_id, sequence)
    }
}

/// Sort key giving natural ID order (`TASK-999` before `TASK-1000`).
pub fn id_order(id: &str) -> (usize, &str) {
    (id.len(), id)
}
