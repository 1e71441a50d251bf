//! Guarded operations
//!
//! Every mutation follows the same three steps:
//!
//! 1. resolve a flat guard context from the store,
//! 2. evaluate the guard, returning [`OrcError::Denied`] with no write on denial,
//! 3. write, then log the transition.
//!
//! The coordinator is constructed with its store and router passed in; it
//! holds no other shared state and is safe to share across patrol tasks.

mod delivery;
mod patrol;
mod planning;
mod work;

use std::sync::Arc;

use tracing::debug;

pub use patrol::RollupOutcome;
pub use planning::{EscalationRoute, Review};
pub use work::{NewTask, Pinnable};

use crate::error::{OrcError, OrcResult};
use crate::escalation::EscalationRouter;
use crate::events::{PatrolEvent, SharedEventBus};
use crate::guard::GuardResult;
use crate::store::{Entity, EntityStore};

pub struct Coordinator<S> {
    store: Arc<S>,
    router: EscalationRouter,
    events: Option<SharedEventBus>,
}

impl<S: EntityStore> Coordinator<S> {
    pub fn new(store: Arc<S>, router: EscalationRouter) -> Self {
        Self {
            store,
            router,
            events: None,
        }
    }

    /// Publish patrol events on `bus`.
    pub fn with_events(mut self, bus: SharedEventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn router(&self) -> &EscalationRouter {
        &self.router
    }

    pub fn events(&self) -> Option<&SharedEventBus> {
        self.events.as_ref()
    }

    pub(crate) fn publish(&self, event: PatrolEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }

    /// Turn a verdict into a result, logging denials.
    fn guard(&self, op: &'static str, id: &str, verdict: GuardResult) -> OrcResult<()> {
        if !verdict.allowed {
            debug!(op, id, reason = %verdict.reason, "Transition denied");
        }
        verdict.into_result()
    }

    /// Fetch a row the caller requires to exist.
    pub fn load<E: Entity>(&self, id: &str) -> OrcResult<E> {
        self.store
            .get::<E>(id)?
            .ok_or_else(|| OrcError::not_found(E::KIND, id))
    }
}

/// Unwrap a row a passing guard has already proven to exist.
fn found<E: Entity>(row: Option<E>, id: &str) -> OrcResult<E> {
    row.ok_or_else(|| OrcError::not_found(E::KIND, id))
}
