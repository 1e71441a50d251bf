//! Patrols, checks, stucks and the roll-up they drive

use chrono::Utc;
use tracing::{info, warn};

use super::{found, Coordinator};
use crate::error::OrcResult;
use crate::events::PatrolEvent;
use crate::guard::escalation::{self as esc_guard, OriginRef};
use crate::guard::patrol as guard;
use crate::ids::EntityKind;
use crate::model::{
    Check, Escalation, EscalationOrigin, EscalationStatus, Outcome, Patrol, PatrolStatus,
    RoutingRule, Stuck, StuckStatus,
};
use crate::patrol::stuck::{rollup, Assessment, RollupAction};
use crate::store::EntityStore;

/// What [`Coordinator::apply_rollup`] did
#[derive(Debug, Clone, PartialEq)]
pub enum RollupOutcome {
    /// The patrol is no longer active; stucks were not touched
    Inactive(PatrolStatus),
    Unchanged,
    Opened(Stuck),
    Incremented(Stuck),
    Resolved(Stuck),
    Escalated {
        stuck: Stuck,
        escalation: Escalation,
    },
}

impl<S: EntityStore> Coordinator<S> {
    // ------------------------------------------------------------------
    // Patrols
    // ------------------------------------------------------------------

    pub fn start_patrol(&self, seat_id: &str, target: &str) -> OrcResult<Patrol> {
        let ctx = guard::StartPatrolContext {
            seat_id: seat_id.to_string(),
            target: target.to_string(),
            active_patrol_id: self.active_patrol(seat_id)?.map(|p| p.id),
        };
        self.guard("start patrol", seat_id, guard::can_start(&ctx))?;

        let row = Patrol::new(self.store.next_id(EntityKind::Patrol)?, seat_id, target);
        self.store.insert(&row)?;
        info!(patrol_id = %row.id, seat_id, target, "Patrol started");
        self.publish(PatrolEvent::PatrolStarted {
            patrol_id: row.id.clone(),
            seat_id: seat_id.to_string(),
            target: target.to_string(),
            timestamp: row.created_at,
        });
        Ok(row)
    }

    pub fn active_patrol(&self, seat_id: &str) -> OrcResult<Option<Patrol>> {
        Ok(self
            .store
            .find::<Patrol>(|p| p.seat_id == seat_id && p.status == PatrolStatus::Active)?)
    }

    fn patrol_context(&self, id: &str) -> OrcResult<(Option<Patrol>, guard::PatrolContext)> {
        let row = self.store.get::<Patrol>(id)?;
        let ctx = guard::PatrolContext {
            patrol_id: id.to_string(),
            status: row.as_ref().map(|p| p.status),
        };
        Ok((row, ctx))
    }

    /// Stop a patrol (`active → completed`). Any open stuck is left as is.
    pub fn stop_patrol(&self, id: &str) -> OrcResult<Patrol> {
        let (row, ctx) = self.patrol_context(id)?;
        self.guard("stop patrol", id, guard::can_stop(&ctx))?;

        let mut row = found(row, id)?;
        row.status = PatrolStatus::Completed;
        row.ended_at = Some(Utc::now());
        self.store.update(&row)?;
        info!(patrol_id = id, seat_id = %row.seat_id, "Patrol stopped");
        Ok(row)
    }

    // ------------------------------------------------------------------
    // Checks
    // ------------------------------------------------------------------

    /// Persist one classified observation. Allowed on inactive patrols so an
    /// in-flight tick can land after a stop.
    pub fn record_check(&self, patrol_id: &str, outcome: Outcome, pane_text: &str) -> OrcResult<Check> {
        let (_, ctx) = self.patrol_context(patrol_id)?;
        self.guard("record check", patrol_id, guard::can_record_check(&ctx))?;

        let row = Check {
            id: self.store.next_id(EntityKind::Check)?,
            patrol_id: patrol_id.to_string(),
            outcome,
            pane_text: pane_text.to_string(),
            captured_at: Utc::now(),
        };
        self.store.insert(&row)?;
        self.publish(PatrolEvent::CheckRecorded {
            patrol_id: patrol_id.to_string(),
            check_id: row.id.clone(),
            outcome,
            timestamp: row.captured_at,
        });
        Ok(row)
    }

    /// Most recent check of a patrol.
    pub fn latest_check(&self, patrol_id: &str) -> OrcResult<Option<Check>> {
        Ok(self
            .store
            .list::<Check>(|c| c.patrol_id == patrol_id)?
            .pop())
    }

    // ------------------------------------------------------------------
    // Stucks
    // ------------------------------------------------------------------

    pub fn open_stuck_for(&self, patrol_id: &str) -> OrcResult<Option<Stuck>> {
        Ok(self
            .store
            .find::<Stuck>(|s| s.patrol_id == patrol_id && s.status == StuckStatus::Open)?)
    }

    pub fn open_stuck(&self, patrol_id: &str, check_id: &str) -> OrcResult<Stuck> {
        let ctx = guard::OpenStuckContext {
            patrol_id: patrol_id.to_string(),
            patrol_status: self.store.get::<Patrol>(patrol_id)?.map(|p| p.status),
            open_stuck_id: self.open_stuck_for(patrol_id)?.map(|s| s.id),
        };
        self.guard("open stuck", patrol_id, guard::can_open_stuck(&ctx))?;

        let row = Stuck::open(self.store.next_id(EntityKind::Stuck)?, patrol_id, check_id);
        self.store.insert(&row)?;
        info!(stuck_id = %row.id, patrol_id, check_id, "Stuck opened");
        self.publish(PatrolEvent::StuckOpened {
            patrol_id: patrol_id.to_string(),
            stuck_id: row.id.clone(),
            check_id: check_id.to_string(),
            timestamp: row.created_at,
        });
        Ok(row)
    }

    fn stuck_context(&self, id: &str) -> OrcResult<(Option<Stuck>, guard::StuckContext)> {
        let row = self.store.get::<Stuck>(id)?;
        let ctx = guard::StuckContext {
            stuck_id: id.to_string(),
            status: row.as_ref().map(|s| s.status),
        };
        Ok((row, ctx))
    }

    /// Count one more failing check into an open stuck.
    pub fn increment_stuck(&self, id: &str, check_id: &str) -> OrcResult<Stuck> {
        let (row, ctx) = self.stuck_context(id)?;
        self.guard("increment stuck", id, guard::can_increment_stuck(&ctx))?;

        let mut row = found(row, id)?;
        row.count += 1;
        row.last_check_id = check_id.to_string();
        row.updated_at = Utc::now();
        self.store.update(&row)?;
        info!(stuck_id = id, patrol_id = %row.patrol_id, count = row.count, "Stuck incremented");
        self.publish(PatrolEvent::StuckIncremented {
            patrol_id: row.patrol_id.clone(),
            stuck_id: row.id.clone(),
            count: row.count,
            timestamp: row.updated_at,
        });
        Ok(row)
    }

    /// Close an open stuck after a recovering check; its count is frozen.
    pub fn resolve_stuck(&self, id: &str) -> OrcResult<Stuck> {
        let (row, ctx) = self.stuck_context(id)?;
        self.guard("resolve stuck", id, guard::can_resolve_stuck(&ctx))?;

        let mut row = found(row, id)?;
        row.status = StuckStatus::Resolved;
        row.updated_at = Utc::now();
        row.closed_at = Some(row.updated_at);
        self.store.update(&row)?;
        info!(stuck_id = id, patrol_id = %row.patrol_id, count = row.count, "Stuck resolved");
        self.publish(PatrolEvent::StuckResolved {
            patrol_id: row.patrol_id.clone(),
            stuck_id: row.id.clone(),
            count: row.count,
            timestamp: row.updated_at,
        });
        Ok(row)
    }

    /// Escalate an open stuck: stuck and patrol move to `escalated` and one
    /// escalation is routed to the seat's supervisor.
    ///
    /// Resumable: when an earlier attempt already created the stuck's
    /// escalation, only the remaining patrol and stuck writes are made.
    pub fn escalate_stuck(&self, id: &str) -> OrcResult<(Stuck, Escalation)> {
        let (stuck, stuck_ctx) = self.stuck_context(id)?;
        self.guard("escalate stuck", id, guard::can_escalate_stuck(&stuck_ctx))?;
        let mut stuck = found(stuck, id)?;

        let (patrol, patrol_ctx) = self.patrol_context(&stuck.patrol_id)?;
        let escalation = match self.stuck_escalation(id)? {
            Some(existing) => {
                info!(stuck_id = id, escalation_id = %existing.id, "Resuming interrupted escalation");
                existing
            }
            None => {
                self.guard("escalate patrol", &stuck.patrol_id, guard::can_escalate(&patrol_ctx))?;
                let patrol = found(patrol.clone(), &stuck.patrol_id)?;
                let escalation = self.new_stuck_escalation(&patrol, &stuck)?;
                // The stuck's escalation key makes a second insert fail.
                self.store.insert(&escalation)?;
                escalation
            }
        };
        let mut patrol = found(patrol, &stuck.patrol_id)?;
        let now = Utc::now();

        // Patrol before stuck: while the stuck is still open a retry can
        // find it and finish the job.
        if patrol.status == PatrolStatus::Active {
            patrol.status = PatrolStatus::Escalated;
            patrol.ended_at = Some(now);
            self.store.update(&patrol)?;
        }

        stuck.status = StuckStatus::Escalated;
        stuck.updated_at = now;
        stuck.closed_at = Some(now);
        self.store.update(&stuck)?;

        warn!(
            patrol_id = %patrol.id,
            stuck_id = id,
            escalation_id = %escalation.id,
            target_actor = %escalation.target_actor,
            count = stuck.count,
            "Patrol escalated"
        );
        self.publish(PatrolEvent::StuckEscalated {
            patrol_id: patrol.id.clone(),
            stuck_id: stuck.id.clone(),
            escalation_id: escalation.id.clone(),
            target_actor: escalation.target_actor.clone(),
            timestamp: now,
        });
        Ok((stuck, escalation))
    }

    /// Escalation already raised for a stuck, if any.
    fn stuck_escalation(&self, stuck_id: &str) -> OrcResult<Option<Escalation>> {
        Ok(self
            .store
            .find::<Escalation>(|e| e.stuck_id.as_deref() == Some(stuck_id))?)
    }

    fn new_stuck_escalation(&self, patrol: &Patrol, stuck: &Stuck) -> OrcResult<Escalation> {
        let reason = format!(
            "seat {} stuck for {} consecutive checks since {}",
            patrol.seat_id, stuck.count, stuck.first_check_id
        );
        let origin_ctx = esc_guard::CreateEscalationContext {
            origins: vec![
                OriginRef {
                    kind: EntityKind::Patrol,
                    id: patrol.id.clone(),
                    exists: true,
                },
                OriginRef {
                    kind: EntityKind::Stuck,
                    id: stuck.id.clone(),
                    exists: true,
                },
            ],
            reason: reason.clone(),
        };
        self.guard("escalate stuck", &stuck.id, esc_guard::can_create(&origin_ctx))?;
        let target = self
            .router
            .route(RoutingRule::SeatSupervisor, Some(&patrol.seat_id), None)?;

        Ok(Escalation {
            id: self.store.next_id(EntityKind::Escalation)?,
            origin: EscalationOrigin::Stuck,
            plan_id: None,
            task_id: None,
            approval_id: None,
            patrol_id: Some(patrol.id.clone()),
            stuck_id: Some(stuck.id.clone()),
            reason,
            routing_rule: RoutingRule::SeatSupervisor,
            target_actor: target,
            status: EscalationStatus::Pending,
            resolution: None,
            resolved_by: None,
            created_at: Utc::now(),
            resolved_at: None,
        })
    }

    /// Feed one assessed check into the patrol's stuck roll-up.
    ///
    /// The patrol status is re-read first; once it has left `active` the
    /// roll-up is skipped entirely. Applying the same check twice counts it
    /// once, so a failed attempt can simply be repeated.
    pub fn apply_rollup(
        &self,
        patrol_id: &str,
        check_id: &str,
        assessment: Assessment,
        threshold: u32,
    ) -> OrcResult<RollupOutcome> {
        let patrol: Patrol = self.load(patrol_id)?;
        let open = self.open_stuck_for(patrol_id)?;

        if patrol.status != PatrolStatus::Active {
            // An escalation that stopped between its patrol and stuck writes.
            if let Some(stuck) = &open {
                if patrol.status == PatrolStatus::Escalated && self.stuck_escalation(&stuck.id)?.is_some() {
                    return self.escalated(&stuck.id);
                }
            }
            return Ok(RollupOutcome::Inactive(patrol.status));
        }

        if let Some(stuck) = open.as_ref().filter(|s| s.last_check_id == check_id) {
            if assessment == Assessment::Failure && stuck.count >= threshold {
                return self.escalated(&stuck.id);
            }
            return Ok(RollupOutcome::Unchanged);
        }

        let action = rollup(assessment, open.as_ref().map(|s| s.count), threshold);
        let outcome = match (action, open) {
            (RollupAction::Nothing, _) => RollupOutcome::Unchanged,
            (RollupAction::Open { escalate }, _) => {
                let stuck = self.open_stuck(patrol_id, check_id)?;
                if escalate {
                    self.escalated(&stuck.id)?
                } else {
                    RollupOutcome::Opened(stuck)
                }
            }
            (RollupAction::Increment { escalate, .. }, Some(open)) => {
                let stuck = self.increment_stuck(&open.id, check_id)?;
                if escalate {
                    self.escalated(&stuck.id)?
                } else {
                    RollupOutcome::Incremented(stuck)
                }
            }
            (RollupAction::Resolve, Some(open)) => RollupOutcome::Resolved(self.resolve_stuck(&open.id)?),
            (RollupAction::Increment { .. } | RollupAction::Resolve, None) => RollupOutcome::Unchanged,
        };
        Ok(outcome)
    }

    fn escalated(&self, stuck_id: &str) -> OrcResult<RollupOutcome> {
        let (stuck, escalation) = self.escalate_stuck(stuck_id)?;
        Ok(RollupOutcome::Escalated { stuck, escalation })
    }
}
