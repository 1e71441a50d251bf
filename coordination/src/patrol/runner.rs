//! One patrol loop
//!
//! Each tick captures the seat's pane, classifies it against the previous
//! check, persists the check and feeds the stuck roll-up. The loop ends when
//! the stop signal fires, when the roll-up escalates, or when the patrol row
//! leaves `active` under it.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::capture::{CaptureError, PaneCapture};
use super::classifier::{classify_normalized, normalize};
use super::stuck::{assess, should_nudge, CheckHistory};
use crate::config::PatrolConfig;
use crate::coordinator::{Coordinator, RollupOutcome};
use crate::error::OrcError;
use crate::events::{PatrolEvent, StopReason};
use crate::model::Patrol;
use crate::retry::RetryPolicy;
use crate::store::EntityStore;

pub struct PatrolRunner<S> {
    coordinator: Arc<Coordinator<S>>,
    capture: Arc<dyn PaneCapture>,
    config: PatrolConfig,
    retry: RetryPolicy,
}

impl<S: EntityStore + 'static> PatrolRunner<S> {
    pub fn new(
        coordinator: Arc<Coordinator<S>>,
        capture: Arc<dyn PaneCapture>,
        config: PatrolConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            coordinator,
            capture,
            config,
            retry,
        }
    }

    /// Drive `patrol` until it stops. The first check is taken immediately.
    pub async fn run(self, patrol: Patrol, mut stop: watch::Receiver<bool>) -> StopReason {
        let mut history = self.resume_history(&patrol.id);
        let mut ticker = tokio::time::interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            patrol_id = %patrol.id,
            seat_id = %patrol.seat_id,
            target = %patrol.target,
            interval_secs = self.config.tick_interval_secs,
            "Patrol loop running"
        );

        let reason = loop {
            if *stop.borrow_and_update() {
                break StopReason::Requested;
            }
            tokio::select! {
                biased;
                changed = stop.changed() => {
                    if changed.is_err() {
                        break StopReason::Requested;
                    }
                }
                _ = ticker.tick() => {
                    if let Some(reason) = self.tick(&patrol, &mut history).await {
                        break reason;
                    }
                }
            }
        };

        if reason == StopReason::Requested {
            self.mark_stopped(&patrol.id);
        }
        info!(patrol_id = %patrol.id, seat_id = %patrol.seat_id, ?reason, "Patrol loop exited");
        self.coordinator.publish(PatrolEvent::PatrolStopped {
            patrol_id: patrol.id.clone(),
            reason,
            timestamp: Utc::now(),
        });
        reason
    }

    fn resume_history(&self, patrol_id: &str) -> CheckHistory {
        match self.coordinator.latest_check(patrol_id) {
            Ok(Some(check)) => CheckHistory::resume(check.outcome, check.pane_text),
            Ok(None) => CheckHistory::new(),
            Err(e) => {
                warn!(patrol_id, error = %e, "Could not load previous check, starting fresh");
                CheckHistory::new()
            }
        }
    }

    /// Move the patrol to `completed` after a requested stop, unless something
    /// else already ended it.
    fn mark_stopped(&self, patrol_id: &str) {
        match self.coordinator.stop_patrol(patrol_id) {
            Ok(_) => {}
            Err(OrcError::Denied { reason }) => debug!(patrol_id, %reason, "Patrol already ended"),
            Err(e) => warn!(patrol_id, error = %e, "Failed to mark patrol stopped"),
        }
    }

    async fn capture(&self, target: &str) -> Result<String, CaptureError> {
        match tokio::time::timeout(self.config.capture_timeout(), self.capture.capture_pane(target)).await {
            Ok(result) => result,
            Err(_) => Err(CaptureError::Timeout {
                target: target.to_string(),
                timeout_ms: self.config.capture_timeout_ms,
            }),
        }
    }

    fn skipped(&self, patrol_id: &str, reason: String) {
        self.coordinator.publish(PatrolEvent::TickSkipped {
            patrol_id: patrol_id.to_string(),
            reason,
            timestamp: Utc::now(),
        });
    }

    /// One capture → classify → persist → roll-up pass. Returns the reason
    /// to exit, if any.
    async fn tick(&self, patrol: &Patrol, history: &mut CheckHistory) -> Option<StopReason> {
        let patrol_id = patrol.id.as_str();
        let raw = match self.capture(&patrol.target).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(patrol_id, target = %patrol.target, error = %e, "Capture failed, skipping tick");
                self.skipped(patrol_id, e.to_string());
                return None;
            }
        };

        let text = normalize(&raw);
        let outcome = classify_normalized(&text, history.previous_text(), history.previous_outcome());

        let coordinator = &self.coordinator;
        let pane = text.as_str();
        let recorded = self
            .retry
            .run("record check", move || async move {
                coordinator.record_check(patrol_id, outcome, pane)
            })
            .await;
        let check = match recorded {
            Ok(check) => check,
            Err(OrcError::NotFound { .. }) => {
                warn!(patrol_id, "Patrol row vanished, exiting loop");
                return Some(StopReason::Inactive);
            }
            Err(e) => {
                warn!(patrol_id, error = %e, "Check not recorded, skipping tick");
                self.skipped(patrol_id, e.to_string());
                return None;
            }
        };

        let observation = history.observe(outcome, &text);
        let assessment = assess(&observation, self.config.grace_checks);
        debug!(
            patrol_id,
            check_id = %check.id,
            ?outcome,
            ?assessment,
            unchanged_run = observation.unchanged_run,
            "Check assessed"
        );

        let check_id = check.id.as_str();
        let threshold = self.config.stuck_threshold;
        let rolled = self
            .retry
            .run("apply rollup", move || async move {
                coordinator.apply_rollup(patrol_id, check_id, assessment, threshold)
            })
            .await;
        match rolled {
            Ok(RollupOutcome::Inactive(status)) => {
                debug!(patrol_id, %status, "Patrol no longer active");
                return Some(StopReason::Inactive);
            }
            Ok(RollupOutcome::Escalated { .. }) => return Some(StopReason::Escalated),
            Ok(_) => {}
            Err(e) => {
                warn!(patrol_id, check_id, error = %e, "Roll-up failed, skipping tick");
                self.skipped(patrol_id, e.to_string());
                return None;
            }
        }

        if self.config.nudge_typed && should_nudge(&observation, self.config.grace_checks) {
            self.nudge(patrol).await;
        }
        None
    }

    async fn nudge(&self, patrol: &Patrol) {
        match self.capture.send_keys(&patrol.target, "Enter").await {
            Ok(()) => {
                info!(patrol_id = %patrol.id, target = %patrol.target, "Nudged seat with Enter");
                self.coordinator.publish(PatrolEvent::SeatNudged {
                    patrol_id: patrol.id.clone(),
                    target: patrol.target.clone(),
                    timestamp: Utc::now(),
                });
            }
            Err(e) => warn!(patrol_id = %patrol.id, error = %e, "Nudge failed"),
        }
    }
}
