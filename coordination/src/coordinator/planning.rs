//! Plans, approvals and escalations

use chrono::Utc;
use tracing::info;

use super::{found, Coordinator};
use crate::error::OrcResult;
use crate::guard::escalation::{self as esc_guard, OriginRef};
use crate::guard::plan;
use crate::ids::EntityKind;
use crate::model::{
    Approval, ApprovalOutcome, Escalation, EscalationOrigin, EscalationStatus, Plan, PlanStatus,
    ReviewMechanism, RoutingRule, Task,
};
use crate::store::EntityStore;

/// Who reviewed a plan and how
#[derive(Debug, Clone)]
pub struct Review {
    pub mechanism: ReviewMechanism,
    pub reviewer: String,
    pub notes: Option<String>,
}

impl Review {
    pub fn manual(reviewer: impl Into<String>) -> Self {
        Self {
            mechanism: ReviewMechanism::Manual,
            reviewer: reviewer.into(),
            notes: None,
        }
    }

    pub fn subreview(reviewer: impl Into<String>) -> Self {
        Self {
            mechanism: ReviewMechanism::Subreview,
            reviewer: reviewer.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Routing request for a new escalation
#[derive(Debug, Clone, PartialEq)]
pub struct EscalationRoute {
    pub rule: RoutingRule,
    pub seat_id: Option<String>,
    pub target: Option<String>,
}

impl EscalationRoute {
    pub fn operator() -> Self {
        Self {
            rule: RoutingRule::Operator,
            seat_id: None,
            target: None,
        }
    }

    pub fn seat_supervisor(seat_id: impl Into<String>) -> Self {
        Self {
            rule: RoutingRule::SeatSupervisor,
            seat_id: Some(seat_id.into()),
            target: None,
        }
    }

    pub fn explicit(target: impl Into<String>) -> Self {
        Self {
            rule: RoutingRule::Explicit,
            seat_id: None,
            target: Some(target.into()),
        }
    }
}

impl<S: EntityStore> Coordinator<S> {
    // ------------------------------------------------------------------
    // Plans
    // ------------------------------------------------------------------

    pub fn create_plan(&self, task_id: &str, content: &str) -> OrcResult<Plan> {
        let task = self.store.get::<Task>(task_id)?;
        let active = self
            .store
            .find::<Plan>(|p| p.task_id == task_id && p.status.is_active())?;
        let ctx = plan::CreatePlanContext {
            task_id: task_id.to_string(),
            task_status: task.map(|t| t.status),
            active_plan_id: active.map(|p| p.id),
        };
        self.guard("create plan", task_id, plan::can_create(&ctx))?;

        let row = Plan::new(self.store.next_id(EntityKind::Plan)?, task_id, content);
        self.store.insert(&row)?;
        info!(plan_id = %row.id, task_id, "Plan created");
        Ok(row)
    }

    fn plan_context(&self, id: &str) -> OrcResult<(Option<Plan>, plan::PlanContext)> {
        let row = self.store.get::<Plan>(id)?;
        let approval = self.store.find::<Approval>(|a| a.plan_id == id)?;
        let ctx = plan::PlanContext {
            plan_id: id.to_string(),
            status: row.as_ref().map(|p| p.status),
            has_content: row.as_ref().is_some_and(|p| !p.content.trim().is_empty()),
            approval_id: approval.map(|a| a.id),
        };
        Ok((row, ctx))
    }

    fn write_plan_status(&self, mut row: Plan, to: PlanStatus) -> OrcResult<Plan> {
        let from = row.status;
        row.status = to;
        row.updated_at = Utc::now();
        self.store.update(&row)?;
        info!(plan_id = %row.id, task_id = %row.task_id, %from, to = %to, "Plan transitioned");
        Ok(row)
    }

    pub fn submit_plan(&self, id: &str) -> OrcResult<Plan> {
        let (row, ctx) = self.plan_context(id)?;
        self.guard("submit plan", id, plan::can_submit(&ctx))?;
        self.write_plan_status(found(row, id)?, PlanStatus::PendingReview)
    }

    fn record_approval(&self, plan: &Plan, review: &Review, outcome: ApprovalOutcome) -> OrcResult<Approval> {
        let approval = Approval {
            id: self.store.next_id(EntityKind::Approval)?,
            plan_id: plan.id.clone(),
            task_id: plan.task_id.clone(),
            mechanism: review.mechanism,
            outcome,
            reviewer: review.reviewer.clone(),
            notes: review.notes.clone(),
            created_at: Utc::now(),
        };
        // Claims the plan's one-approval key before any status changes.
        self.store.insert(&approval)?;
        Ok(approval)
    }

    /// Approve a pending plan, superseding the task's previously approved one.
    pub fn approve_plan(&self, id: &str, review: Review) -> OrcResult<(Plan, Approval)> {
        let (row, ctx) = self.plan_context(id)?;
        self.guard("approve plan", id, plan::can_review(&ctx))?;
        let mut row = found(row, id)?;

        let approval = self.record_approval(&row, &review, ApprovalOutcome::Approved)?;
        let previous = self.store.find::<Plan>(|p| {
            p.task_id == row.task_id && p.id != row.id && p.status == PlanStatus::Approved
        })?;
        if let Some(previous) = previous {
            row.supersedes = Some(previous.id.clone());
            self.write_plan_status(previous, PlanStatus::Superseded)?;
        }
        let row = self.write_plan_status(row, PlanStatus::Approved)?;
        info!(plan_id = id, approval_id = %approval.id, reviewer = %approval.reviewer, "Plan approved");
        Ok((row, approval))
    }

    /// Refuse a pending plan and hand it to an actor.
    pub fn escalate_plan(
        &self,
        id: &str,
        review: Review,
        reason: &str,
        route: EscalationRoute,
    ) -> OrcResult<(Plan, Approval, Escalation)> {
        let (row, ctx) = self.plan_context(id)?;
        self.guard("escalate plan", id, plan::can_review(&ctx))?;
        let row = found(row, id)?;

        let origin_ctx = esc_guard::CreateEscalationContext {
            origins: vec![
                OriginRef {
                    kind: EntityKind::Plan,
                    id: row.id.clone(),
                    exists: true,
                },
                OriginRef {
                    kind: EntityKind::Task,
                    id: row.task_id.clone(),
                    exists: self.store.exists::<Task>(&row.task_id)?,
                },
            ],
            reason: reason.to_string(),
        };
        self.guard("escalate plan", id, esc_guard::can_create(&origin_ctx))?;
        let target = self
            .router
            .route(route.rule, route.seat_id.as_deref(), route.target.as_deref())?;

        let approval = self.record_approval(&row, &review, ApprovalOutcome::Escalated)?;
        let escalation = Escalation {
            id: self.store.next_id(EntityKind::Escalation)?,
            origin: EscalationOrigin::Approval,
            plan_id: Some(row.id.clone()),
            task_id: Some(row.task_id.clone()),
            approval_id: Some(approval.id.clone()),
            patrol_id: None,
            stuck_id: None,
            reason: reason.trim().to_string(),
            routing_rule: route.rule,
            target_actor: target,
            status: EscalationStatus::Pending,
            resolution: None,
            resolved_by: None,
            created_at: Utc::now(),
            resolved_at: None,
        };
        self.store.insert(&escalation)?;
        let row = self.write_plan_status(row, PlanStatus::Escalated)?;
        info!(
            plan_id = id,
            escalation_id = %escalation.id,
            target_actor = %escalation.target_actor,
            routing_rule = %escalation.routing_rule,
            "Plan escalated"
        );
        Ok((row, approval, escalation))
    }

    pub fn delete_plan(&self, id: &str) -> OrcResult<()> {
        let (_, ctx) = self.plan_context(id)?;
        self.guard("delete plan", id, plan::can_delete(&ctx))?;
        self.store.delete::<Plan>(id)?;
        info!(plan_id = id, "Plan deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Escalations
    // ------------------------------------------------------------------

    fn escalation_context(&self, id: &str) -> OrcResult<(Option<Escalation>, esc_guard::EscalationContext)> {
        let row = self.store.get::<Escalation>(id)?;
        let ctx = esc_guard::EscalationContext {
            escalation_id: id.to_string(),
            status: row.as_ref().map(|e| e.status),
        };
        Ok((row, ctx))
    }

    pub fn resolve_escalation(&self, id: &str, resolution: &str, actor: &str) -> OrcResult<Escalation> {
        let (row, ctx) = self.escalation_context(id)?;
        self.guard("resolve escalation", id, esc_guard::can_resolve(&ctx, resolution))?;

        let mut row = found(row, id)?;
        row.status = EscalationStatus::Resolved;
        row.resolution = Some(resolution.trim().to_string());
        row.resolved_by = Some(actor.to_string());
        row.resolved_at = Some(Utc::now());
        self.store.update(&row)?;
        info!(escalation_id = id, actor, "Escalation resolved");
        Ok(row)
    }

    pub fn dismiss_escalation(&self, id: &str, actor: &str) -> OrcResult<Escalation> {
        let (row, ctx) = self.escalation_context(id)?;
        self.guard("dismiss escalation", id, esc_guard::can_dismiss(&ctx))?;

        let mut row = found(row, id)?;
        row.status = EscalationStatus::Dismissed;
        row.resolved_by = Some(actor.to_string());
        row.resolved_at = Some(Utc::now());
        self.store.update(&row)?;
        info!(escalation_id = id, actor, "Escalation dismissed");
        Ok(row)
    }

    /// Escalations waiting on an actor, optionally only one actor's.
    pub fn pending_escalations(&self, target_actor: Option<&str>) -> OrcResult<Vec<Escalation>> {
        Ok(self.store.list::<Escalation>(|e| {
            e.status == EscalationStatus::Pending
                && target_actor.map_or(true, |actor| e.target_actor == actor)
        })?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::coordinator::NewTask;
    use crate::error::OrcError;
    use crate::escalation::EscalationRouter;
    use crate::store::{MemoryStore, StoreError};

    fn setup() -> (Coordinator<MemoryStore>, Task) {
        let orc = Coordinator::new(
            Arc::new(MemoryStore::new()),
            EscalationRouter::new("ops").with_supervisor("seat-a", "alice"),
        );
        let task = orc.create_task(NewTask::new("wire the lexer")).unwrap();
        (orc, task)
    }

    fn pending_plan(orc: &Coordinator<MemoryStore>, task_id: &str, content: &str) -> Plan {
        let plan = orc.create_plan(task_id, content).unwrap();
        orc.submit_plan(&plan.id).unwrap()
    }

    #[test]
    fn test_one_active_plan() {
        let (orc, task) = setup();
        orc.create_plan(&task.id, "v1").unwrap();
        assert_eq!(
            orc.create_plan(&task.id, "v2").unwrap_err().to_string(),
            "task TASK-001 already has an active plan PLAN-001"
        );
    }

    #[test]
    fn test_store_backstops_active_plan() {
        let (orc, task) = setup();
        orc.create_plan(&task.id, "v1").unwrap();
        let racer = Plan::new("PLAN-050", &task.id, "racing");
        let err = orc.store().insert(&racer).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[test]
    fn test_approval_supersedes_previous() {
        let (orc, task) = setup();
        let first = pending_plan(&orc, &task.id, "v1");
        orc.approve_plan(&first.id, Review::manual("lead")).unwrap();

        let second = pending_plan(&orc, &task.id, "v2");
        let (approved, approval) = orc
            .approve_plan(&second.id, Review::subreview("reviewer-bot"))
            .unwrap();
        assert_eq!(approved.supersedes.as_deref(), Some("PLAN-001"));
        assert_eq!(approval.outcome, ApprovalOutcome::Approved);
        let first: Plan = orc.load(&first.id).unwrap();
        assert_eq!(first.status, PlanStatus::Superseded);
    }

    #[test]
    fn test_review_is_once_only() {
        let (orc, task) = setup();
        let plan = pending_plan(&orc, &task.id, "v1");
        orc.approve_plan(&plan.id, Review::manual("lead")).unwrap();
        let err = orc.approve_plan(&plan.id, Review::manual("lead")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "can only review plans pending review (current status: approved)"
        );
    }

    #[test]
    fn test_escalate_plan_routes_and_links() {
        let (orc, task) = setup();
        let plan = pending_plan(&orc, &task.id, "rewrite everything");
        let (plan, approval, escalation) = orc
            .escalate_plan(
                &plan.id,
                Review::subreview("reviewer-bot").with_notes("too broad"),
                "scope exceeds the task",
                EscalationRoute::seat_supervisor("seat-a"),
            )
            .unwrap();
        assert_eq!(plan.status, PlanStatus::Escalated);
        assert_eq!(approval.outcome, ApprovalOutcome::Escalated);
        assert_eq!(escalation.origin, EscalationOrigin::Approval);
        assert_eq!(escalation.approval_id.as_deref(), Some(approval.id.as_str()));
        assert_eq!(escalation.target_actor, "alice");

        // An escalated plan is terminal; the task can be planned again.
        orc.create_plan(&task.id, "smaller").unwrap();
    }

    #[test]
    fn test_escalate_requires_reason_before_writing() {
        let (orc, task) = setup();
        let plan = pending_plan(&orc, &task.id, "v1");
        let err = orc
            .escalate_plan(&plan.id, Review::manual("lead"), " ", EscalationRoute::operator())
            .unwrap_err();
        assert_eq!(err.to_string(), "escalation reason cannot be empty");
        assert_eq!(orc.store().count::<Approval>(|_| true).unwrap(), 0);
    }

    #[test]
    fn test_explicit_route_needs_target() {
        let (orc, task) = setup();
        let plan = pending_plan(&orc, &task.id, "v1");
        let route = EscalationRoute {
            rule: RoutingRule::Explicit,
            seat_id: None,
            target: None,
        };
        let err = orc
            .escalate_plan(&plan.id, Review::manual("lead"), "unclear", route)
            .unwrap_err();
        assert!(matches!(err, OrcError::Denied { .. }));
        let plan: Plan = orc.load(&plan.id).unwrap();
        assert_eq!(plan.status, PlanStatus::PendingReview);
    }

    #[test]
    fn test_resolve_and_dismiss_are_terminal() {
        let (orc, task) = setup();
        let plan = pending_plan(&orc, &task.id, "v1");
        let (_, _, esc) = orc
            .escalate_plan(&plan.id, Review::manual("lead"), "unclear", EscalationRoute::operator())
            .unwrap();
        assert_eq!(orc.pending_escalations(Some("ops")).unwrap().len(), 1);

        let resolved = orc.resolve_escalation(&esc.id, "clarified scope", "ops").unwrap();
        assert_eq!(resolved.resolved_by.as_deref(), Some("ops"));
        assert_eq!(
            orc.resolve_escalation(&esc.id, "again", "ops").unwrap_err().to_string(),
            "can only resolve pending escalations (current status: resolved)"
        );
        assert_eq!(
            orc.dismiss_escalation(&esc.id, "ops").unwrap_err().to_string(),
            "can only dismiss pending escalations (current status: resolved)"
        );
        assert!(orc.pending_escalations(None).unwrap().is_empty());
    }

    #[test]
    fn test_only_draft_plans_delete() {
        let (orc, task) = setup();
        let plan = pending_plan(&orc, &task.id, "v1");
        assert_eq!(
            orc.delete_plan(&plan.id).unwrap_err().to_string(),
            "can only delete draft plans (current status: pending_review)"
        );
    }
}
