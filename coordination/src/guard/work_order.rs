//! Work order and cycle guards

use super::{GuardResult, Preconditions};
use crate::ids::EntityKind;
use crate::model::{CycleStatus, ReceiptStatus, ShipmentStatus, WorkOrderStatus};

/// Context for creating a shipment's work order
#[derive(Debug, Clone)]
pub struct CreateWorkOrderContext {
    pub shipment_id: String,
    pub shipment_exists: bool,
    pub existing_work_order: Option<String>,
    pub outcome: String,
}

/// Context for work order transitions
#[derive(Debug, Clone)]
pub struct WorkOrderContext {
    pub work_order_id: String,
    pub status: Option<WorkOrderStatus>,
}

/// Context for adding a cycle to a shipment
#[derive(Debug, Clone)]
pub struct CreateCycleContext {
    pub shipment_id: String,
    pub shipment_status: Option<ShipmentStatus>,
    pub has_work_order: bool,
}

/// Context for cycle transitions
#[derive(Debug, Clone)]
pub struct CycleContext {
    pub cycle_id: String,
    pub status: Option<CycleStatus>,
    /// Status of the cycle's receipt, if one exists
    pub receipt_status: Option<ReceiptStatus>,
}

pub fn can_create_work_order(ctx: &CreateWorkOrderContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.shipment_exists, EntityKind::Shipment, &ctx.shipment_id)
        .require(ctx.existing_work_order.is_none(), || {
            format!(
                "shipment {} already has a {}",
                ctx.shipment_id,
                EntityKind::WorkOrder.prefix()
            )
        })
        .require_text(&ctx.outcome, || "work order outcome cannot be empty".to_string())
        .verdict()
}

pub fn can_activate_work_order(ctx: &WorkOrderContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), EntityKind::WorkOrder, &ctx.work_order_id)
        .require_status(
            ctx.status,
            &[WorkOrderStatus::Draft],
            "activate draft work orders",
        )
        .verdict()
}

pub fn can_complete_work_order(ctx: &WorkOrderContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), EntityKind::WorkOrder, &ctx.work_order_id)
        .require_status(
            ctx.status,
            &[WorkOrderStatus::Active],
            "complete active work orders",
        )
        .verdict()
}

pub fn can_create_cycle(ctx: &CreateCycleContext) -> GuardResult {
    Preconditions::new()
        .require_found(
            ctx.shipment_status.is_some(),
            EntityKind::Shipment,
            &ctx.shipment_id,
        )
        .require(ctx.has_work_order, || {
            format!(
                "shipment {} has no {}",
                ctx.shipment_id,
                EntityKind::WorkOrder.prefix()
            )
        })
        .require(ctx.shipment_status != Some(ShipmentStatus::Closed), || {
            format!("cannot add cycles to closed shipment {}", ctx.shipment_id)
        })
        .verdict()
}

pub fn can_approve_cycle(ctx: &CycleContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), EntityKind::Cycle, &ctx.cycle_id)
        .require_status(ctx.status, &[CycleStatus::Draft], "approve draft cycles")
        .verdict()
}

pub fn can_start_cycle(ctx: &CycleContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), EntityKind::Cycle, &ctx.cycle_id)
        .require_status(ctx.status, &[CycleStatus::Approved], "start approved cycles")
        .verdict()
}

pub fn can_complete_cycle(ctx: &CycleContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), EntityKind::Cycle, &ctx.cycle_id)
        .require_status(
            ctx.status,
            &[CycleStatus::Implementing],
            "complete implementing cycles",
        )
        .require(ctx.receipt_status == Some(ReceiptStatus::Verified), || {
            format!(
                "cycle {} has no verified {}",
                ctx.cycle_id,
                EntityKind::CycleReceipt.prefix()
            )
        })
        .verdict()
}
