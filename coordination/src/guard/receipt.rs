//! Receipt and cycle receipt guards
//!
//! A shipment's receipt can only be submitted once its work order is
//! complete and every cycle receipt under it has been verified.

use super::{GuardResult, Preconditions};
use crate::ids::EntityKind;
use crate::model::{ReceiptStatus, WorkOrderStatus};

/// Context for creating a receipt (parent = shipment) or a cycle receipt (parent = cycle)
#[derive(Debug, Clone)]
pub struct CreateReceiptContext {
    pub parent_kind: EntityKind,
    pub parent_id: String,
    pub parent_exists: bool,
    /// Receipt already recorded for the parent
    pub existing_receipt: Option<String>,
    pub delivered_outcome: String,
}

/// Context for submitting or verifying a shipment receipt
#[derive(Debug, Clone)]
pub struct ReceiptContext {
    pub receipt_id: String,
    pub status: Option<ReceiptStatus>,
    pub shipment_id: String,
    pub work_order_id: Option<String>,
    pub work_order_status: Option<WorkOrderStatus>,
    /// Cycle receipts under the shipment that are not yet verified
    pub unverified_cycle_receipts: usize,
}

/// Context for submitting or verifying a cycle receipt
#[derive(Debug, Clone)]
pub struct CycleReceiptContext {
    pub receipt_id: String,
    pub status: Option<ReceiptStatus>,
    pub cycle_id: String,
    pub cycle_exists: bool,
}

fn receipt_kind(parent: EntityKind) -> EntityKind {
    match parent {
        EntityKind::Cycle => EntityKind::CycleReceipt,
        _ => EntityKind::Receipt,
    }
}

pub fn can_create(ctx: &CreateReceiptContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.parent_exists, ctx.parent_kind, &ctx.parent_id)
        .require(ctx.existing_receipt.is_none(), || {
            format!(
                "{} {} already has a {}",
                ctx.parent_kind.noun(),
                ctx.parent_id,
                receipt_kind(ctx.parent_kind).prefix()
            )
        })
        .require_text(&ctx.delivered_outcome, || {
            "delivered outcome cannot be empty".to_string()
        })
        .verdict()
}

pub fn can_submit(ctx: &ReceiptContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), EntityKind::Receipt, &ctx.receipt_id)
        .require_status(ctx.status, &[ReceiptStatus::Draft], "submit draft receipts")
        .require(ctx.work_order_id.is_some(), || {
            format!(
                "shipment {} has no {}",
                ctx.shipment_id,
                EntityKind::WorkOrder.prefix()
            )
        })
        .require(ctx.work_order_status == Some(WorkOrderStatus::Complete), || {
            format!(
                "work order {} is not complete (current status: {})",
                ctx.work_order_id.as_deref().unwrap_or_default(),
                ctx.work_order_status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            )
        })
        .require(ctx.unverified_cycle_receipts == 0, || {
            format!(
                "{} cycle receipt(s) not yet verified",
                ctx.unverified_cycle_receipts
            )
        })
        .verdict()
}

pub fn can_verify(ctx: &ReceiptContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), EntityKind::Receipt, &ctx.receipt_id)
        .require_status(
            ctx.status,
            &[ReceiptStatus::Submitted],
            "verify submitted receipts",
        )
        .verdict()
}

pub fn can_submit_cycle_receipt(ctx: &CycleReceiptContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), EntityKind::CycleReceipt, &ctx.receipt_id)
        .require_status(
            ctx.status,
            &[ReceiptStatus::Draft],
            "submit draft cycle receipts",
        )
        .require_found(ctx.cycle_exists, EntityKind::Cycle, &ctx.cycle_id)
        .verdict()
}

pub fn can_verify_cycle_receipt(ctx: &CycleReceiptContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.status.is_some(), EntityKind::CycleReceipt, &ctx.receipt_id)
        .require_status(
            ctx.status,
            &[ReceiptStatus::Submitted],
            "verify submitted cycle receipts",
        )
        .verdict()
}
