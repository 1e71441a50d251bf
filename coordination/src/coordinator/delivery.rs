//! Work orders, cycles and receipts

use chrono::Utc;
use tracing::info;

use super::{found, Coordinator};
use crate::error::OrcResult;
use crate::guard::{receipt, work_order};
use crate::ids::EntityKind;
use crate::model::{
    Cycle, CycleReceipt, CycleStatus, Receipt, ReceiptStatus, Shipment, WorkOrder, WorkOrderStatus,
};
use crate::store::EntityStore;

impl<S: EntityStore> Coordinator<S> {
    // ------------------------------------------------------------------
    // Work orders
    // ------------------------------------------------------------------

    pub fn create_work_order(&self, shipment_id: &str, outcome: &str) -> OrcResult<WorkOrder> {
        let ctx = work_order::CreateWorkOrderContext {
            shipment_id: shipment_id.to_string(),
            shipment_exists: self.store.exists::<Shipment>(shipment_id)?,
            existing_work_order: self.work_order_for(shipment_id)?.map(|w| w.id),
            outcome: outcome.to_string(),
        };
        self.guard("create work order", shipment_id, work_order::can_create_work_order(&ctx))?;

        let now = Utc::now();
        let row = WorkOrder {
            id: self.store.next_id(EntityKind::WorkOrder)?,
            shipment_id: shipment_id.to_string(),
            outcome: outcome.trim().to_string(),
            status: WorkOrderStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(&row)?;
        info!(work_order_id = %row.id, shipment_id, "Work order created");
        Ok(row)
    }

    pub fn work_order_for(&self, shipment_id: &str) -> OrcResult<Option<WorkOrder>> {
        Ok(self.store.find::<WorkOrder>(|w| w.shipment_id == shipment_id)?)
    }

    fn transition_work_order(
        &self,
        id: &str,
        op: &'static str,
        check: fn(&work_order::WorkOrderContext) -> crate::guard::GuardResult,
        to: WorkOrderStatus,
    ) -> OrcResult<WorkOrder> {
        let row = self.store.get::<WorkOrder>(id)?;
        let ctx = work_order::WorkOrderContext {
            work_order_id: id.to_string(),
            status: row.as_ref().map(|w| w.status),
        };
        self.guard(op, id, check(&ctx))?;

        let mut row = found(row, id)?;
        let from = row.status;
        row.status = to;
        row.updated_at = Utc::now();
        self.store.update(&row)?;
        info!(work_order_id = id, %from, to = %to, "Work order transitioned");
        Ok(row)
    }

    pub fn activate_work_order(&self, id: &str) -> OrcResult<WorkOrder> {
        self.transition_work_order(
            id,
            "activate work order",
            work_order::can_activate_work_order,
            WorkOrderStatus::Active,
        )
    }

    pub fn complete_work_order(&self, id: &str) -> OrcResult<WorkOrder> {
        self.transition_work_order(
            id,
            "complete work order",
            work_order::can_complete_work_order,
            WorkOrderStatus::Complete,
        )
    }

    // ------------------------------------------------------------------
    // Cycles
    // ------------------------------------------------------------------

    /// Add the next numbered cycle to a shipment.
    pub fn create_cycle(&self, shipment_id: &str) -> OrcResult<Cycle> {
        let ctx = work_order::CreateCycleContext {
            shipment_id: shipment_id.to_string(),
            shipment_status: self.store.get::<Shipment>(shipment_id)?.map(|s| s.status),
            has_work_order: self.work_order_for(shipment_id)?.is_some(),
        };
        self.guard("create cycle", shipment_id, work_order::can_create_cycle(&ctx))?;

        let sequence = self
            .store
            .list::<Cycle>(|c| c.shipment_id == shipment_id)?
            .iter()
            .map(|c| c.sequence)
            .max()
            .unwrap_or(0)
            + 1;
        let now = Utc::now();
        let row = Cycle {
            id: self.store.next_id(EntityKind::Cycle)?,
            shipment_id: shipment_id.to_string(),
            sequence,
            status: CycleStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(&row)?;
        info!(cycle_id = %row.id, shipment_id, sequence, "Cycle created");
        Ok(row)
    }

    fn transition_cycle(
        &self,
        id: &str,
        op: &'static str,
        check: fn(&work_order::CycleContext) -> crate::guard::GuardResult,
        to: CycleStatus,
    ) -> OrcResult<Cycle> {
        let row = self.store.get::<Cycle>(id)?;
        let ctx = work_order::CycleContext {
            cycle_id: id.to_string(),
            status: row.as_ref().map(|c| c.status),
            receipt_status: self
                .store
                .find::<CycleReceipt>(|r| r.cycle_id == id)?
                .map(|r| r.status),
        };
        self.guard(op, id, check(&ctx))?;

        let mut row = found(row, id)?;
        let from = row.status;
        row.status = to;
        row.updated_at = Utc::now();
        self.store.update(&row)?;
        info!(cycle_id = id, %from, to = %to, "Cycle transitioned");
        Ok(row)
    }

    pub fn approve_cycle(&self, id: &str) -> OrcResult<Cycle> {
        self.transition_cycle(id, "approve cycle", work_order::can_approve_cycle, CycleStatus::Approved)
    }

    pub fn start_cycle(&self, id: &str) -> OrcResult<Cycle> {
        self.transition_cycle(id, "start cycle", work_order::can_start_cycle, CycleStatus::Implementing)
    }

    pub fn complete_cycle(&self, id: &str) -> OrcResult<Cycle> {
        self.transition_cycle(id, "complete cycle", work_order::can_complete_cycle, CycleStatus::Complete)
    }

    // ------------------------------------------------------------------
    // Cycle receipts
    // ------------------------------------------------------------------

    pub fn create_cycle_receipt(
        &self,
        cycle_id: &str,
        delivered_outcome: &str,
        evidence: Option<String>,
    ) -> OrcResult<CycleReceipt> {
        let ctx = receipt::CreateReceiptContext {
            parent_kind: EntityKind::Cycle,
            parent_id: cycle_id.to_string(),
            parent_exists: self.store.exists::<Cycle>(cycle_id)?,
            existing_receipt: self
                .store
                .find::<CycleReceipt>(|r| r.cycle_id == cycle_id)?
                .map(|r| r.id),
            delivered_outcome: delivered_outcome.to_string(),
        };
        self.guard("create cycle receipt", cycle_id, receipt::can_create(&ctx))?;

        let now = Utc::now();
        let row = CycleReceipt {
            id: self.store.next_id(EntityKind::CycleReceipt)?,
            cycle_id: cycle_id.to_string(),
            delivered_outcome: delivered_outcome.trim().to_string(),
            evidence,
            status: ReceiptStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(&row)?;
        info!(cycle_receipt_id = %row.id, cycle_id, "Cycle receipt created");
        Ok(row)
    }

    fn transition_cycle_receipt(
        &self,
        id: &str,
        op: &'static str,
        check: fn(&receipt::CycleReceiptContext) -> crate::guard::GuardResult,
        to: ReceiptStatus,
    ) -> OrcResult<CycleReceipt> {
        let row = self.store.get::<CycleReceipt>(id)?;
        let cycle_id = row.as_ref().map(|r| r.cycle_id.clone()).unwrap_or_default();
        let ctx = receipt::CycleReceiptContext {
            receipt_id: id.to_string(),
            status: row.as_ref().map(|r| r.status),
            cycle_exists: self.store.exists::<Cycle>(&cycle_id)?,
            cycle_id,
        };
        self.guard(op, id, check(&ctx))?;

        let mut row = found(row, id)?;
        let from = row.status;
        row.status = to;
        row.updated_at = Utc::now();
        self.store.update(&row)?;
        info!(cycle_receipt_id = id, %from, to = %to, "Cycle receipt transitioned");
        Ok(row)
    }

    pub fn submit_cycle_receipt(&self, id: &str) -> OrcResult<CycleReceipt> {
        self.transition_cycle_receipt(
            id,
            "submit cycle receipt",
            receipt::can_submit_cycle_receipt,
            ReceiptStatus::Submitted,
        )
    }

    pub fn verify_cycle_receipt(&self, id: &str) -> OrcResult<CycleReceipt> {
        self.transition_cycle_receipt(
            id,
            "verify cycle receipt",
            receipt::can_verify_cycle_receipt,
            ReceiptStatus::Verified,
        )
    }

    // ------------------------------------------------------------------
    // Shipment receipts
    // ------------------------------------------------------------------

    pub fn create_receipt(
        &self,
        shipment_id: &str,
        delivered_outcome: &str,
        evidence: Option<String>,
    ) -> OrcResult<Receipt> {
        let ctx = receipt::CreateReceiptContext {
            parent_kind: EntityKind::Shipment,
            parent_id: shipment_id.to_string(),
            parent_exists: self.store.exists::<Shipment>(shipment_id)?,
            existing_receipt: self
                .store
                .find::<Receipt>(|r| r.shipment_id == shipment_id)?
                .map(|r| r.id),
            delivered_outcome: delivered_outcome.to_string(),
        };
        self.guard("create receipt", shipment_id, receipt::can_create(&ctx))?;

        let row = Receipt::new(
            self.store.next_id(EntityKind::Receipt)?,
            shipment_id,
            delivered_outcome.trim(),
            evidence,
        );
        self.store.insert(&row)?;
        info!(receipt_id = %row.id, shipment_id, "Receipt created");
        Ok(row)
    }

    fn receipt_context(&self, id: &str) -> OrcResult<(Option<Receipt>, receipt::ReceiptContext)> {
        let row = self.store.get::<Receipt>(id)?;
        let shipment_id = row.as_ref().map(|r| r.shipment_id.clone()).unwrap_or_default();
        let work_order = self.work_order_for(&shipment_id)?;
        let cycle_ids: Vec<String> = self
            .store
            .list::<Cycle>(|c| c.shipment_id == shipment_id)?
            .into_iter()
            .map(|c| c.id)
            .collect();
        let unverified_cycle_receipts = self.store.count::<CycleReceipt>(|r| {
            cycle_ids.contains(&r.cycle_id) && r.status != ReceiptStatus::Verified
        })?;
        let ctx = receipt::ReceiptContext {
            receipt_id: id.to_string(),
            status: row.as_ref().map(|r| r.status),
            shipment_id,
            work_order_id: work_order.as_ref().map(|w| w.id.clone()),
            work_order_status: work_order.map(|w| w.status),
            unverified_cycle_receipts,
        };
        Ok((row, ctx))
    }

    fn write_receipt_status(&self, mut row: Receipt, to: ReceiptStatus) -> OrcResult<Receipt> {
        let from = row.status;
        row.status = to;
        row.updated_at = Utc::now();
        self.store.update(&row)?;
        info!(receipt_id = %row.id, shipment_id = %row.shipment_id, %from, to = %to, "Receipt transitioned");
        Ok(row)
    }

    /// Submit once the work order is complete and every cycle receipt is verified.
    pub fn submit_receipt(&self, id: &str) -> OrcResult<Receipt> {
        let (row, ctx) = self.receipt_context(id)?;
        self.guard("submit receipt", id, receipt::can_submit(&ctx))?;
        self.write_receipt_status(found(row, id)?, ReceiptStatus::Submitted)
    }

    pub fn verify_receipt(&self, id: &str) -> OrcResult<Receipt> {
        let (row, ctx) = self.receipt_context(id)?;
        self.guard("verify receipt", id, receipt::can_verify(&ctx))?;
        self.write_receipt_status(found(row, id)?, ReceiptStatus::Verified)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::escalation::EscalationRouter;
    use crate::store::MemoryStore;

    fn setup() -> (Coordinator<MemoryStore>, Shipment) {
        let orc = Coordinator::new(Arc::new(MemoryStore::new()), EscalationRouter::default());
        let comm = orc.create_commission("Storage").unwrap();
        let ship = orc.create_shipment(&comm.id, "WAL").unwrap();
        (orc, ship)
    }

    #[test]
    fn test_work_order_is_one_per_shipment() {
        let (orc, ship) = setup();
        orc.create_work_order(&ship.id, "durable writes").unwrap();
        assert_eq!(
            orc.create_work_order(&ship.id, "again").unwrap_err().to_string(),
            "shipment SHIP-001 already has a WO"
        );
    }

    #[test]
    fn test_cycles_are_numbered() {
        let (orc, ship) = setup();
        assert_eq!(
            orc.create_cycle(&ship.id).unwrap_err().to_string(),
            "shipment SHIP-001 has no WO"
        );
        orc.create_work_order(&ship.id, "durable writes").unwrap();
        assert_eq!(orc.create_cycle(&ship.id).unwrap().sequence, 1);
        assert_eq!(orc.create_cycle(&ship.id).unwrap().sequence, 2);
    }

    #[test]
    fn test_cycle_needs_verified_receipt_to_complete() {
        let (orc, ship) = setup();
        orc.create_work_order(&ship.id, "durable writes").unwrap();
        let cycle = orc.create_cycle(&ship.id).unwrap();
        orc.approve_cycle(&cycle.id).unwrap();
        orc.start_cycle(&cycle.id).unwrap();
        assert_eq!(
            orc.complete_cycle(&cycle.id).unwrap_err().to_string(),
            "cycle CYC-001 has no verified CREC"
        );
        let crec = orc
            .create_cycle_receipt(&cycle.id, "fsync on commit", None)
            .unwrap();
        orc.submit_cycle_receipt(&crec.id).unwrap();
        orc.verify_cycle_receipt(&crec.id).unwrap();
        assert_eq!(orc.complete_cycle(&cycle.id).unwrap().status, CycleStatus::Complete);
    }

    #[test]
    fn test_receipt_submission_order() {
        let (orc, ship) = setup();
        let rec = orc.create_receipt(&ship.id, "WAL shipped", None).unwrap();
        assert_eq!(
            orc.submit_receipt(&rec.id).unwrap_err().to_string(),
            "shipment SHIP-001 has no WO"
        );

        let wo = orc.create_work_order(&ship.id, "durable writes").unwrap();
        assert_eq!(
            orc.submit_receipt(&rec.id).unwrap_err().to_string(),
            "work order WO-001 is not complete (current status: draft)"
        );
        orc.activate_work_order(&wo.id).unwrap();
        orc.complete_work_order(&wo.id).unwrap();

        let cycle = orc.create_cycle(&ship.id).unwrap();
        let crec = orc.create_cycle_receipt(&cycle.id, "fsync", None).unwrap();
        assert_eq!(
            orc.submit_receipt(&rec.id).unwrap_err().to_string(),
            "1 cycle receipt(s) not yet verified"
        );
        orc.submit_cycle_receipt(&crec.id).unwrap();
        orc.verify_cycle_receipt(&crec.id).unwrap();

        orc.submit_receipt(&rec.id).unwrap();
        let verified = orc.verify_receipt(&rec.id).unwrap();
        assert_eq!(verified.status, ReceiptStatus::Verified);
    }
}
