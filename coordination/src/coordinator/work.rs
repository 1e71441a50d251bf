//! Commissions, shipments, tasks, investigations and pinning

use chrono::Utc;
use tracing::info;

use super::{found, Coordinator};
use crate::error::OrcResult;
use crate::guard::{commission, investigation, pin, shipment, task};
use crate::ids::EntityKind;
use crate::model::{
    Approval, Commission, CommissionStatus, Cycle, CycleReceipt, Investigation,
    InvestigationStatus, Plan, Receipt, Shipment, ShipmentStatus, Task, TaskStatus, WorkOrder,
};
use crate::store::{Entity, EntityStore};

/// Entities an operator can pin against completion, archival and deletion.
pub trait Pinnable: Entity {
    fn pinned(&self) -> bool;
    fn set_pinned(&mut self, pinned: bool);
}

macro_rules! pinnable {
    ($($ty:ty),+) => {
        $(impl Pinnable for $ty {
            fn pinned(&self) -> bool {
                self.pinned
            }

            fn set_pinned(&mut self, pinned: bool) {
                self.pinned = pinned;
                self.updated_at = Utc::now();
            }
        })+
    };
}

pinnable!(Commission, Shipment, Task, Investigation);

/// Input for [`Coordinator::create_task`]
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub shipment_id: Option<String>,
    pub investigation_id: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn in_shipment(mut self, shipment_id: impl Into<String>) -> Self {
        self.shipment_id = Some(shipment_id.into());
        self
    }

    pub fn in_investigation(mut self, investigation_id: impl Into<String>) -> Self {
        self.investigation_id = Some(investigation_id.into());
        self
    }
}

impl<S: EntityStore> Coordinator<S> {
    // ------------------------------------------------------------------
    // Pinning
    // ------------------------------------------------------------------

    pub fn pin<E: Pinnable>(&self, id: &str) -> OrcResult<E> {
        self.set_pin::<E>(id, true)
    }

    pub fn unpin<E: Pinnable>(&self, id: &str) -> OrcResult<E> {
        self.set_pin::<E>(id, false)
    }

    fn set_pin<E: Pinnable>(&self, id: &str, pinned: bool) -> OrcResult<E> {
        let row = self.store.get::<E>(id)?;
        let ctx = pin::PinContext {
            kind: E::KIND,
            id: id.to_string(),
            exists: row.is_some(),
            pinned: row.as_ref().is_some_and(|r| r.pinned()),
        };
        let (op, verdict) = if pinned {
            ("pin", pin::can_pin(&ctx))
        } else {
            ("unpin", pin::can_unpin(&ctx))
        };
        self.guard(op, id, verdict)?;

        let mut row = found(row, id)?;
        row.set_pinned(pinned);
        self.store.update(&row)?;
        info!(kind = %E::KIND, id, pinned, "Pin changed");
        Ok(row)
    }

    // ------------------------------------------------------------------
    // Commissions
    // ------------------------------------------------------------------

    pub fn create_commission(&self, title: &str) -> OrcResult<Commission> {
        let ctx = commission::CreateCommissionContext {
            title: title.to_string(),
        };
        self.guard("create commission", "", commission::can_create(&ctx))?;

        let row = Commission::new(self.store.next_id(EntityKind::Commission)?, title.trim());
        self.store.insert(&row)?;
        info!(commission_id = %row.id, "Commission created");
        Ok(row)
    }

    fn commission_context(&self, id: &str) -> OrcResult<(Option<Commission>, commission::CommissionContext)> {
        let row = self.store.get::<Commission>(id)?;
        let ctx = commission::CommissionContext {
            commission_id: id.to_string(),
            status: row.as_ref().map(|c| c.status),
            pinned: row.as_ref().is_some_and(|c| c.pinned),
        };
        Ok((row, ctx))
    }

    fn transition_commission(
        &self,
        id: &str,
        op: &'static str,
        check: fn(&commission::CommissionContext) -> crate::guard::GuardResult,
        to: CommissionStatus,
    ) -> OrcResult<Commission> {
        let (row, ctx) = self.commission_context(id)?;
        self.guard(op, id, check(&ctx))?;

        let mut row = found(row, id)?;
        let from = row.status;
        row.status = to;
        row.updated_at = Utc::now();
        self.store.update(&row)?;
        info!(commission_id = id, %from, to = %to, "Commission {}", op);
        Ok(row)
    }

    pub fn activate_commission(&self, id: &str) -> OrcResult<Commission> {
        self.transition_commission(id, "activate", commission::can_activate, CommissionStatus::Active)
    }

    pub fn pause_commission(&self, id: &str) -> OrcResult<Commission> {
        self.transition_commission(id, "pause", commission::can_pause, CommissionStatus::Paused)
    }

    pub fn resume_commission(&self, id: &str) -> OrcResult<Commission> {
        self.transition_commission(id, "resume", commission::can_resume, CommissionStatus::Active)
    }

    pub fn complete_commission(&self, id: &str) -> OrcResult<Commission> {
        self.transition_commission(id, "complete", commission::can_complete, CommissionStatus::Complete)
    }

    pub fn archive_commission(&self, id: &str) -> OrcResult<Commission> {
        self.transition_commission(id, "archive", commission::can_archive, CommissionStatus::Archived)
    }

    /// Soft delete: the commission moves to `deleted` and stops accepting work.
    pub fn delete_commission(&self, id: &str, force: bool) -> OrcResult<Commission> {
        let row = self.store.get::<Commission>(id)?;
        let shipment_count = self.store.count::<Shipment>(|s| s.commission_id == id)?;
        let ctx = commission::DeleteCommissionContext {
            commission_id: id.to_string(),
            exists: row.is_some(),
            shipment_count,
            force,
        };
        self.guard("delete commission", id, commission::can_delete(&ctx))?;

        let mut row = found(row, id)?;
        row.status = CommissionStatus::Deleted;
        row.updated_at = Utc::now();
        self.store.update(&row)?;
        info!(commission_id = id, shipment_count, force, "Commission deleted");
        Ok(row)
    }

    // ------------------------------------------------------------------
    // Shipments
    // ------------------------------------------------------------------

    pub fn create_shipment(&self, commission_id: &str, title: &str) -> OrcResult<Shipment> {
        let commission = self.store.get::<Commission>(commission_id)?;
        let ctx = shipment::CreateShipmentContext {
            commission_id: commission_id.to_string(),
            commission_status: commission.map(|c| c.status),
            title: title.to_string(),
        };
        self.guard("create shipment", commission_id, shipment::can_create(&ctx))?;

        let row = Shipment::new(
            self.store.next_id(EntityKind::Shipment)?,
            commission_id,
            title.trim(),
        );
        self.store.insert(&row)?;
        info!(shipment_id = %row.id, commission_id, "Shipment created");
        Ok(row)
    }

    fn shipment_context(
        &self,
        id: &str,
        force: bool,
    ) -> OrcResult<(Option<Shipment>, shipment::ShipmentContext)> {
        let row = self.store.get::<Shipment>(id)?;
        let tasks = self
            .store
            .list::<Task>(|t| t.shipment_id.as_deref() == Some(id))?;
        let ctx = shipment::ShipmentContext {
            shipment_id: id.to_string(),
            status: row.as_ref().map(|s| s.status),
            pinned: row.as_ref().is_some_and(|s| s.pinned),
            task_count: tasks.len(),
            open_task_count: tasks.iter().filter(|t| t.status != TaskStatus::Closed).count(),
            force,
        };
        Ok((row, ctx))
    }

    fn write_shipment_status(&self, mut row: Shipment, to: ShipmentStatus, op: &str) -> OrcResult<Shipment> {
        let from = row.status;
        row.status = to;
        row.updated_at = Utc::now();
        if to == ShipmentStatus::Closed {
            row.closed_at = Some(row.updated_at);
        }
        self.store.update(&row)?;
        info!(shipment_id = %row.id, %from, to = %to, "Shipment {}", op);
        Ok(row)
    }

    pub fn mark_shipment_ready(&self, id: &str) -> OrcResult<Shipment> {
        let (row, ctx) = self.shipment_context(id, false)?;
        self.guard("ready shipment", id, shipment::can_mark_ready(&ctx))?;
        self.write_shipment_status(found(row, id)?, ShipmentStatus::Ready, "ready")
    }

    pub fn start_shipment(&self, id: &str) -> OrcResult<Shipment> {
        let (row, ctx) = self.shipment_context(id, false)?;
        self.guard("start shipment", id, shipment::can_start(&ctx))?;
        self.write_shipment_status(found(row, id)?, ShipmentStatus::InProgress, "started")
    }

    pub fn complete_shipment(&self, id: &str, force: bool) -> OrcResult<Shipment> {
        let (row, ctx) = self.shipment_context(id, force)?;
        self.guard("complete shipment", id, shipment::can_complete(&ctx))?;
        self.write_shipment_status(found(row, id)?, ShipmentStatus::Closed, "completed")
    }

    /// Close without completing, recording why.
    pub fn close_shipment(&self, id: &str, reason: &str) -> OrcResult<Shipment> {
        let (row, ctx) = self.shipment_context(id, false)?;
        self.guard("close shipment", id, shipment::can_close(&ctx, reason))?;
        let mut row = found(row, id)?;
        row.closed_reason = Some(reason.trim().to_string());
        self.write_shipment_status(row, ShipmentStatus::Closed, "closed")
    }

    /// Delete a shipment together with everything it owns.
    pub fn delete_shipment(&self, id: &str) -> OrcResult<()> {
        let (_, ctx) = self.shipment_context(id, false)?;
        self.guard("delete shipment", id, shipment::can_delete(&ctx))?;

        for task in self.store.list::<Task>(|t| t.shipment_id.as_deref() == Some(id))? {
            self.delete_task_tree(&task.id)?;
        }
        for cycle in self.store.list::<Cycle>(|c| c.shipment_id == id)? {
            for crec in self.store.list::<CycleReceipt>(|r| r.cycle_id == cycle.id)? {
                self.store.delete::<CycleReceipt>(&crec.id)?;
            }
            self.store.delete::<Cycle>(&cycle.id)?;
        }
        for wo in self.store.list::<WorkOrder>(|w| w.shipment_id == id)? {
            self.store.delete::<WorkOrder>(&wo.id)?;
        }
        for rec in self.store.list::<Receipt>(|r| r.shipment_id == id)? {
            self.store.delete::<Receipt>(&rec.id)?;
        }
        self.store.delete::<Shipment>(id)?;
        info!(shipment_id = id, tasks = ctx.task_count, "Shipment deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    pub fn create_task(&self, new: NewTask) -> OrcResult<Task> {
        let shipment_status = match &new.shipment_id {
            Some(sid) => self.store.get::<Shipment>(sid)?.map(|s| s.status),
            None => None,
        };
        let investigation_exists = match &new.investigation_id {
            Some(iid) => self.store.exists::<Investigation>(iid)?,
            None => false,
        };
        let ctx = task::CreateTaskContext {
            shipment_id: new.shipment_id.clone(),
            shipment_status,
            investigation_id: new.investigation_id.clone(),
            investigation_exists,
            title: new.title.clone(),
        };
        let parent = new.shipment_id.as_deref().unwrap_or_default();
        self.guard("create task", parent, task::can_create(&ctx))?;

        let mut row = Task::new(self.store.next_id(EntityKind::Task)?, new.title.trim());
        row.description = new.description;
        row.shipment_id = new.shipment_id;
        row.investigation_id = new.investigation_id;
        self.store.insert(&row)?;
        info!(task_id = %row.id, shipment_id = ?row.shipment_id, "Task created");
        Ok(row)
    }

    fn task_context(&self, id: &str) -> OrcResult<(Option<Task>, task::TaskContext)> {
        let row = self.store.get::<Task>(id)?;
        let ctx = task::TaskContext {
            task_id: id.to_string(),
            status: row.as_ref().map(|t| t.status),
            pinned: row.as_ref().is_some_and(|t| t.pinned),
        };
        Ok((row, ctx))
    }

    fn write_task_status(&self, mut row: Task, to: TaskStatus) -> OrcResult<Task> {
        let from = row.status;
        let now = Utc::now();
        row.status = to;
        row.updated_at = now;
        match to {
            TaskStatus::InProgress if row.claimed_at.is_none() => row.claimed_at = Some(now),
            TaskStatus::Closed => row.completed_at = Some(now),
            _ => {}
        }
        self.store.update(&row)?;
        info!(task_id = %row.id, %from, to = %to, "Task transitioned");
        Ok(row)
    }

    pub fn start_task(&self, id: &str) -> OrcResult<Task> {
        let (row, ctx) = self.task_context(id)?;
        self.guard("start task", id, task::can_start(&ctx))?;
        self.write_task_status(found(row, id)?, TaskStatus::InProgress)
    }

    pub fn block_task(&self, id: &str) -> OrcResult<Task> {
        let (row, ctx) = self.task_context(id)?;
        self.guard("block task", id, task::can_block(&ctx))?;
        self.write_task_status(found(row, id)?, TaskStatus::Blocked)
    }

    /// Unblocked tasks return to `in-progress` if they were ever claimed, else `open`.
    pub fn unblock_task(&self, id: &str) -> OrcResult<Task> {
        let (row, ctx) = self.task_context(id)?;
        self.guard("unblock task", id, task::can_unblock(&ctx))?;
        let row = found(row, id)?;
        let to = if row.claimed_at.is_some() {
            TaskStatus::InProgress
        } else {
            TaskStatus::Open
        };
        self.write_task_status(row, to)
    }

    pub fn complete_task(&self, id: &str) -> OrcResult<Task> {
        let (row, ctx) = self.task_context(id)?;
        self.guard("complete task", id, task::can_complete(&ctx))?;
        self.write_task_status(found(row, id)?, TaskStatus::Closed)
    }

    pub fn move_task(&self, id: &str, shipment_id: &str) -> OrcResult<Task> {
        let row = self.store.get::<Task>(id)?;
        let ctx = task::MoveTaskContext {
            task_id: id.to_string(),
            task_exists: row.is_some(),
            shipment_id: shipment_id.to_string(),
            shipment_status: self.store.get::<Shipment>(shipment_id)?.map(|s| s.status),
        };
        self.guard("move task", id, task::can_move(&ctx))?;

        let mut row = found(row, id)?;
        let from = row.shipment_id.replace(shipment_id.to_string());
        row.updated_at = Utc::now();
        self.store.update(&row)?;
        info!(task_id = id, from = ?from, to = shipment_id, "Task moved");
        Ok(row)
    }

    pub fn delete_task(&self, id: &str) -> OrcResult<()> {
        let (_, ctx) = self.task_context(id)?;
        self.guard("delete task", id, task::can_delete(&ctx))?;
        self.delete_task_tree(id)?;
        info!(task_id = id, "Task deleted");
        Ok(())
    }

    /// Remove a task with its plans and their approvals.
    fn delete_task_tree(&self, id: &str) -> OrcResult<()> {
        for plan in self.store.list::<Plan>(|p| p.task_id == id)? {
            for approval in self.store.list::<Approval>(|a| a.plan_id == plan.id)? {
                self.store.delete::<Approval>(&approval.id)?;
            }
            self.store.delete::<Plan>(&plan.id)?;
        }
        self.store.delete::<Task>(id)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Investigations
    // ------------------------------------------------------------------

    pub fn create_investigation(&self, commission_id: &str, title: &str) -> OrcResult<Investigation> {
        let ctx = investigation::CreateInvestigationContext {
            commission_id: commission_id.to_string(),
            commission_exists: self.store.exists::<Commission>(commission_id)?,
            title: title.to_string(),
        };
        self.guard("create investigation", commission_id, investigation::can_create(&ctx))?;

        let row = Investigation::new(
            self.store.next_id(EntityKind::Investigation)?,
            commission_id,
            title.trim(),
        );
        self.store.insert(&row)?;
        info!(investigation_id = %row.id, commission_id, "Investigation created");
        Ok(row)
    }

    fn transition_investigation(
        &self,
        id: &str,
        op: &'static str,
        check: fn(&investigation::InvestigationContext) -> crate::guard::GuardResult,
        to: InvestigationStatus,
    ) -> OrcResult<Investigation> {
        let row = self.store.get::<Investigation>(id)?;
        let ctx = investigation::InvestigationContext {
            investigation_id: id.to_string(),
            status: row.as_ref().map(|i| i.status),
            pinned: row.as_ref().is_some_and(|i| i.pinned),
        };
        self.guard(op, id, check(&ctx))?;

        let mut row = found(row, id)?;
        let from = row.status;
        row.status = to;
        row.updated_at = Utc::now();
        if to == InvestigationStatus::Complete {
            row.completed_at = Some(row.updated_at);
        }
        self.store.update(&row)?;
        info!(investigation_id = id, %from, to = %to, "Investigation {}", op);
        Ok(row)
    }

    pub fn pause_investigation(&self, id: &str) -> OrcResult<Investigation> {
        self.transition_investigation(id, "pause", investigation::can_pause, InvestigationStatus::Paused)
    }

    pub fn resume_investigation(&self, id: &str) -> OrcResult<Investigation> {
        self.transition_investigation(id, "resume", investigation::can_resume, InvestigationStatus::Active)
    }

    pub fn complete_investigation(&self, id: &str) -> OrcResult<Investigation> {
        self.transition_investigation(
            id,
            "complete",
            investigation::can_complete,
            InvestigationStatus::Complete,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::escalation::EscalationRouter;
    use crate::store::MemoryStore;

    fn coordinator() -> Coordinator<MemoryStore> {
        Coordinator::new(Arc::new(MemoryStore::new()), EscalationRouter::default())
    }

    #[test]
    fn test_commission_lifecycle() {
        let orc = coordinator();
        let comm = orc.create_commission("Parser rewrite").unwrap();
        assert_eq!(comm.id, "COMM-001");
        orc.activate_commission(&comm.id).unwrap();
        orc.pause_commission(&comm.id).unwrap();
        let err = orc.pause_commission(&comm.id).unwrap_err();
        assert_eq!(
            err.to_string(),
            "can only pause active commissions (current status: paused)"
        );
        orc.resume_commission(&comm.id).unwrap();
        orc.complete_commission(&comm.id).unwrap();
        let archived = orc.archive_commission(&comm.id).unwrap();
        assert_eq!(archived.status, CommissionStatus::Archived);
    }

    #[test]
    fn test_denied_transition_writes_nothing() {
        let orc = coordinator();
        let comm = orc.create_commission("Docs").unwrap();
        orc.pin::<Commission>(&comm.id).unwrap();
        orc.activate_commission(&comm.id).unwrap();
        assert!(orc.complete_commission(&comm.id).is_err());
        let stored: Commission = orc.load(&comm.id).unwrap();
        assert_eq!(stored.status, CommissionStatus::Active);
    }

    #[test]
    fn test_delete_commission_with_shipments_needs_force() {
        let orc = coordinator();
        let comm = orc.create_commission("Infra").unwrap();
        orc.create_shipment(&comm.id, "CI").unwrap();
        let err = orc.delete_commission(&comm.id, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "commission COMM-001 has 1 shipment(s). Use --force to delete anyway"
        );
        let deleted = orc.delete_commission(&comm.id, true).unwrap();
        assert_eq!(deleted.status, CommissionStatus::Deleted);
        let err = orc.create_shipment(&comm.id, "More CI").unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot create shipment under deleted commission COMM-001"
        );
    }

    #[test]
    fn test_shipment_flow() {
        let orc = coordinator();
        let comm = orc.create_commission("Search").unwrap();
        let ship = orc.create_shipment(&comm.id, "Indexer").unwrap();
        let err = orc.mark_shipment_ready(&ship.id).unwrap_err();
        assert_eq!(err.to_string(), "shipment SHIP-001 has no tasks");

        let task = orc
            .create_task(NewTask::new("tokenize").in_shipment(&ship.id))
            .unwrap();
        orc.mark_shipment_ready(&ship.id).unwrap();
        orc.start_shipment(&ship.id).unwrap();
        let err = orc.complete_shipment(&ship.id, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "shipment SHIP-001 has 1 open task(s). Use --force to complete anyway"
        );
        orc.start_task(&task.id).unwrap();
        orc.complete_task(&task.id).unwrap();
        let closed = orc.complete_shipment(&ship.id, false).unwrap();
        assert_eq!(closed.status, ShipmentStatus::Closed);
        assert!(closed.closed_at.is_some());
    }

    #[test]
    fn test_close_with_reason() {
        let orc = coordinator();
        let comm = orc.create_commission("Search").unwrap();
        let ship = orc.create_shipment(&comm.id, "Ranker").unwrap();
        assert_eq!(
            orc.close_shipment(&ship.id, "").unwrap_err().to_string(),
            "close reason cannot be empty"
        );
        let closed = orc.close_shipment(&ship.id, "superseded by SHIP-9").unwrap();
        assert_eq!(closed.closed_reason.as_deref(), Some("superseded by SHIP-9"));
        assert_eq!(
            orc.close_shipment(&ship.id, "again").unwrap_err().to_string(),
            "shipment SHIP-001 is already closed"
        );
    }

    #[test]
    fn test_delete_shipment_cascades_tasks() {
        let orc = coordinator();
        let comm = orc.create_commission("Search").unwrap();
        let ship = orc.create_shipment(&comm.id, "Ranker").unwrap();
        let task = orc
            .create_task(NewTask::new("score").in_shipment(&ship.id))
            .unwrap();
        orc.create_plan(&task.id, "do it").unwrap();
        orc.delete_shipment(&ship.id).unwrap();
        assert!(!orc.store().exists::<Task>(&task.id).unwrap());
        assert_eq!(orc.store().count::<Plan>(|_| true).unwrap(), 0);
    }

    #[test]
    fn test_pinned_shipment_cannot_be_deleted() {
        let orc = coordinator();
        let comm = orc.create_commission("Search").unwrap();
        let ship = orc.create_shipment(&comm.id, "Ranker").unwrap();
        orc.pin::<Shipment>(&ship.id).unwrap();
        assert_eq!(
            orc.delete_shipment(&ship.id).unwrap_err().to_string(),
            "cannot delete pinned shipment SHIP-001. Unpin first with: orc shipment unpin SHIP-001"
        );
        orc.unpin::<Shipment>(&ship.id).unwrap();
        orc.delete_shipment(&ship.id).unwrap();
    }

    #[test]
    fn test_pin_twice() {
        let orc = coordinator();
        let task = orc.create_task(NewTask::new("loose task")).unwrap();
        orc.pin::<Task>(&task.id).unwrap();
        assert_eq!(
            orc.pin::<Task>(&task.id).unwrap_err().to_string(),
            "task TASK-001 is already pinned"
        );
        assert_eq!(
            orc.unpin::<Task>("TASK-404").unwrap_err().to_string(),
            "task TASK-404 not found"
        );
    }

    #[test]
    fn test_unblock_restores_claimed_state() {
        let orc = coordinator();
        let fresh = orc.create_task(NewTask::new("a")).unwrap();
        orc.block_task(&fresh.id).unwrap();
        assert_eq!(orc.unblock_task(&fresh.id).unwrap().status, TaskStatus::Open);

        let claimed = orc.create_task(NewTask::new("b")).unwrap();
        orc.start_task(&claimed.id).unwrap();
        orc.block_task(&claimed.id).unwrap();
        assert_eq!(
            orc.unblock_task(&claimed.id).unwrap().status,
            TaskStatus::InProgress
        );
    }

    #[test]
    fn test_move_task() {
        let orc = coordinator();
        let comm = orc.create_commission("Search").unwrap();
        let a = orc.create_shipment(&comm.id, "A").unwrap();
        let b = orc.create_shipment(&comm.id, "B").unwrap();
        let task = orc.create_task(NewTask::new("t").in_shipment(&a.id)).unwrap();
        orc.close_shipment(&b.id, "dropped").unwrap();
        assert_eq!(
            orc.move_task(&task.id, &b.id).unwrap_err().to_string(),
            "cannot move tasks to closed shipment SHIP-002"
        );
        let c = orc.create_shipment(&comm.id, "C").unwrap();
        let moved = orc.move_task(&task.id, &c.id).unwrap();
        assert_eq!(moved.shipment_id.as_deref(), Some("SHIP-003"));
    }

    #[test]
    fn test_investigation_groups_tasks() {
        let orc = coordinator();
        let comm = orc.create_commission("Perf").unwrap();
        let inv = orc.create_investigation(&comm.id, "slow builds").unwrap();
        let task = orc
            .create_task(NewTask::new("profile linker").in_investigation(&inv.id))
            .unwrap();
        assert_eq!(task.investigation_id.as_deref(), Some("INV-001"));
        orc.pause_investigation(&inv.id).unwrap();
        orc.resume_investigation(&inv.id).unwrap();
        let done = orc.complete_investigation(&inv.id).unwrap();
        assert!(done.completed_at.is_some());
    }
}
