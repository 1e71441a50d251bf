//! Owns the running patrol loops, one per seat

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::capture::PaneCapture;
use super::runner::PatrolRunner;
use crate::config::{OrcConfig, PatrolConfig};
use crate::coordinator::Coordinator;
use crate::error::{OrcError, OrcResult};
use crate::events::StopReason;
use crate::model::Patrol;
use crate::retry::RetryPolicy;
use crate::store::EntityStore;

/// A spawned patrol loop and its stop channel.
pub struct PatrolHandle {
    pub patrol_id: String,
    pub seat_id: String,
    stop: watch::Sender<bool>,
    task: JoinHandle<StopReason>,
}

impl PatrolHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Signal the loop and wait for it to exit.
    pub async fn stop(self) -> OrcResult<StopReason> {
        // A send error only means the loop already exited.
        let _ = self.stop.send(true);
        self.join().await
    }

    async fn join(self) -> OrcResult<StopReason> {
        self.task
            .await
            .map_err(|e| OrcError::invariant(format!("patrol loop {} panicked: {}", self.patrol_id, e)))
    }
}

pub struct PatrolSupervisor<S> {
    coordinator: Arc<Coordinator<S>>,
    capture: Arc<dyn PaneCapture>,
    config: PatrolConfig,
    retry: RetryPolicy,
    handles: HashMap<String, PatrolHandle>,
}

impl<S: EntityStore + 'static> PatrolSupervisor<S> {
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
            handles: HashMap::new(),
        }
    }

    pub fn from_config(
        coordinator: Arc<Coordinator<S>>,
        capture: Arc<dyn PaneCapture>,
        config: &OrcConfig,
    ) -> Self {
        Self::new(coordinator, capture, config.patrol.clone(), config.retry.clone())
    }

    /// Start a loop for `seat_id`.
    ///
    /// An active patrol already stored for the seat with the same target is
    /// resumed rather than replaced. A second loop for a seat is refused.
    pub fn start(&mut self, seat_id: &str, target: &str) -> OrcResult<Patrol> {
        if let Some(handle) = self.handles.get(seat_id) {
            if handle.is_running() {
                return Err(OrcError::denied(format!(
                    "seat {} already has a running patrol loop for {}",
                    seat_id, handle.patrol_id
                )));
            }
        }

        let patrol = match self.coordinator.active_patrol(seat_id)? {
            Some(existing) if existing.target == target => {
                info!(patrol_id = %existing.id, seat_id, "Resuming active patrol");
                existing
            }
            _ => self.coordinator.start_patrol(seat_id, target)?,
        };

        let (stop, stop_rx) = watch::channel(false);
        let runner = PatrolRunner::new(
            self.coordinator.clone(),
            self.capture.clone(),
            self.config.clone(),
            self.retry.clone(),
        );
        let task = tokio::spawn(runner.run(patrol.clone(), stop_rx));
        self.handles.insert(
            seat_id.to_string(),
            PatrolHandle {
                patrol_id: patrol.id.clone(),
                seat_id: seat_id.to_string(),
                stop,
                task,
            },
        );
        Ok(patrol)
    }

    /// Stop the seat's loop and wait for it. The patrol moves to `completed`
    /// unless it had already ended.
    pub async fn stop(&mut self, seat_id: &str) -> OrcResult<StopReason> {
        let handle = self
            .handles
            .remove(seat_id)
            .ok_or_else(|| OrcError::denied(format!("seat {} has no patrol loop", seat_id)))?;
        handle.stop().await
    }

    /// Stop every loop, returning each seat's exit reason.
    pub async fn stop_all(&mut self) -> Vec<(String, StopReason)> {
        let mut stopped = Vec::new();
        for (seat_id, handle) in self.handles.drain() {
            match handle.stop().await {
                Ok(reason) => stopped.push((seat_id, reason)),
                Err(e) => warn!(seat_id = %seat_id, error = %e, "Patrol loop did not stop cleanly"),
            }
        }
        stopped.sort_by(|a, b| a.0.cmp(&b.0));
        stopped
    }

    /// Collect loops that exited on their own (escalated or ended elsewhere).
    pub async fn reap(&mut self) -> Vec<(String, StopReason)> {
        let finished: Vec<String> = self
            .handles
            .iter()
            .filter(|(_, h)| !h.is_running())
            .map(|(seat, _)| seat.clone())
            .collect();

        let mut reaped = Vec::new();
        for seat_id in finished {
            if let Some(handle) = self.handles.remove(&seat_id) {
                match handle.join().await {
                    Ok(reason) => reaped.push((seat_id, reason)),
                    Err(e) => warn!(seat_id = %seat_id, error = %e, "Patrol loop failed"),
                }
            }
        }
        reaped.sort_by(|a, b| a.0.cmp(&b.0));
        reaped
    }

    /// Seats whose loop is still running, sorted.
    pub fn running(&self) -> Vec<&str> {
        let mut seats: Vec<&str> = self
            .handles
            .values()
            .filter(|h| h.is_running())
            .map(|h| h.seat_id.as_str())
            .collect();
        seats.sort_unstable();
        seats
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
