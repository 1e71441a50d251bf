//! Shipment guards

use super::{GuardResult, Preconditions};
use crate::ids::EntityKind;
use crate::model::{CommissionStatus, ShipmentStatus};

const KIND: EntityKind = EntityKind::Shipment;

/// Context for creating a shipment under a commission
#[derive(Debug, Clone)]
pub struct CreateShipmentContext {
    pub commission_id: String,
    /// `None` when the commission does not exist
    pub commission_status: Option<CommissionStatus>,
    pub title: String,
}

/// Context for status transitions on an existing shipment
#[derive(Debug, Clone)]
pub struct ShipmentContext {
    pub shipment_id: String,
    /// `None` when the shipment does not exist
    pub status: Option<ShipmentStatus>,
    pub pinned: bool,
    pub task_count: usize,
    pub open_task_count: usize,
    pub force: bool,
}

impl ShipmentContext {
    fn exists(&self) -> bool {
        self.status.is_some()
    }
}

pub fn can_create(ctx: &CreateShipmentContext) -> GuardResult {
    Preconditions::new()
        .require_found(
            ctx.commission_status.is_some(),
            EntityKind::Commission,
            &ctx.commission_id,
        )
        .require(
            ctx.commission_status.is_some_and(|s| s.accepts_work()),
            || {
                format!(
                    "cannot create shipment under {} commission {}",
                    ctx.commission_status
                        .map(|s| s.as_str())
                        .unwrap_or("unknown"),
                    ctx.commission_id
                )
            },
        )
        .require_text(&ctx.title, || "shipment title cannot be empty".to_string())
        .verdict()
}

pub fn can_mark_ready(ctx: &ShipmentContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.exists(), KIND, &ctx.shipment_id)
        .require_status(
            ctx.status,
            &[ShipmentStatus::Draft],
            "mark draft shipments as ready",
        )
        .require(ctx.task_count > 0, || {
            format!("shipment {} has no tasks", ctx.shipment_id)
        })
        .verdict()
}

pub fn can_start(ctx: &ShipmentContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.exists(), KIND, &ctx.shipment_id)
        .require_status(ctx.status, &[ShipmentStatus::Ready], "start ready shipments")
        .verdict()
}

pub fn can_complete(ctx: &ShipmentContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.exists(), KIND, &ctx.shipment_id)
        .require_unpinned(ctx.pinned, "complete", KIND, &ctx.shipment_id)
        .require_status(
            ctx.status,
            &[ShipmentStatus::InProgress],
            "complete in-progress shipments",
        )
        .require(ctx.force || ctx.open_task_count == 0, || {
            format!(
                "shipment {} has {} open task(s). Use --force to complete anyway",
                ctx.shipment_id, ctx.open_task_count
            )
        })
        .verdict()
}

/// Close without completing (abandon, duplicate, ...). `reason` is the close reason.
pub fn can_close(ctx: &ShipmentContext, reason: &str) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.exists(), KIND, &ctx.shipment_id)
        .require_unpinned(ctx.pinned, "close", KIND, &ctx.shipment_id)
        .require(ctx.status != Some(ShipmentStatus::Closed), || {
            format!("shipment {} is already closed", ctx.shipment_id)
        })
        .require_text(reason, || "close reason cannot be empty".to_string())
        .verdict()
}

pub fn can_delete(ctx: &ShipmentContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.exists(), KIND, &ctx.shipment_id)
        .require_unpinned(ctx.pinned, "delete", KIND, &ctx.shipment_id)
        .verdict()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(status: Option<ShipmentStatus>, pinned: bool) -> ShipmentContext {
        ShipmentContext {
            shipment_id: "SHIP-014".into(),
            status,
            pinned,
            task_count: 2,
            open_task_count: 0,
            force: false,
        }
    }

    #[test]
    fn test_create_under_missing_commission() {
        let verdict = can_create(&CreateShipmentContext {
            commission_id: "COMM-404".into(),
            commission_status: None,
            title: String::new(),
        });
        assert_eq!(verdict.reason, "commission COMM-404 not found");
    }

    #[test]
    fn test_create_under_archived_commission() {
        let verdict = can_create(&CreateShipmentContext {
            commission_id: "COMM-001".into(),
            commission_status: Some(CommissionStatus::Archived),
            title: "ship it".into(),
        });
        assert_eq!(
            verdict.reason,
            "cannot create shipment under archived commission COMM-001"
        );
    }

    #[test]
    fn test_ready_requires_tasks() {
        let mut c = ctx(Some(ShipmentStatus::Draft), false);
        assert!(can_mark_ready(&c).allowed);
        c.task_count = 0;
        assert_eq!(can_mark_ready(&c).reason, "shipment SHIP-014 has no tasks");
    }

    #[test]
    fn test_pinned_wins_over_status_on_complete() {
        let verdict = can_complete(&ctx(Some(ShipmentStatus::Closed), true));
        assert_eq!(
            verdict.reason,
            "cannot complete pinned shipment SHIP-014. Unpin first with: orc shipment unpin SHIP-014"
        );
    }

    #[test]
    fn test_complete_status_and_open_tasks() {
        assert_eq!(
            can_complete(&ctx(Some(ShipmentStatus::Ready), false)).reason,
            "can only complete in-progress shipments (current status: ready)"
        );
        let mut c = ctx(Some(ShipmentStatus::InProgress), false);
        c.open_task_count = 3;
        assert_eq!(
            can_complete(&c).reason,
            "shipment SHIP-014 has 3 open task(s). Use --force to complete anyway"
        );
        c.force = true;
        assert!(can_complete(&c).allowed);
    }

    #[test]
    fn test_close() {
        assert!(can_close(&ctx(Some(ShipmentStatus::Draft), false), "duplicate").allowed);
        assert_eq!(
            can_close(&ctx(Some(ShipmentStatus::Closed), false), "duplicate").reason,
            "shipment SHIP-014 is already closed"
        );
        assert_eq!(
            can_close(&ctx(Some(ShipmentStatus::Draft), false), " ").reason,
            "close reason cannot be empty"
        );
    }
}
