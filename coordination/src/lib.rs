//! Orc Coordination Library
//!
//! This library provides:
//! - A guard engine: pure precondition checks for every entity lifecycle transition
//! - Guarded operations over a pluggable entity store
//! - A patrol subsystem that watches coding-agent seats in tmux panes and
//!   escalates seats that stay stuck
//!
//! # Entities
//!
//! ## Work
//! - Commissions, shipments, tasks and investigations
//! - Plans and their approvals
//! - Work orders, cycles, cycle receipts and receipts
//!
//! ## Patrol
//! - Patrols (one active per seat), checks, stucks
//! - Escalations routed to a seat supervisor, the operator or an explicit actor
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use coordination::model::Shipment;
//! use coordination::{Coordinator, EscalationRouter, MemoryStore, NewTask};
//!
//! # fn main() -> coordination::OrcResult<()> {
//! let orc = Coordinator::new(Arc::new(MemoryStore::new()), EscalationRouter::new("operator"));
//! let commission = orc.create_commission("Ship the parser")?;
//! let shipment = orc.create_shipment(&commission.id, "Tokenizer")?;
//! let task = orc.create_task(NewTask::new("Lex identifiers").in_shipment(&shipment.id))?;
//! orc.mark_shipment_ready(&shipment.id)?;
//! orc.start_shipment(&shipment.id)?;
//! orc.complete_task(&task.id)?;
//! orc.pin::<Shipment>(&shipment.id)?;
//!
//! // Pinned shipments cannot be completed.
//! let err = orc.complete_shipment(&shipment.id, false).unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     format!(
//!         "cannot complete pinned shipment {id}. Unpin first with: orc shipment unpin {id}",
//!         id = shipment.id
//!     )
//! );
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod escalation;
pub mod events;
pub mod guard;
pub mod ids;
pub mod model;
pub mod patrol;
pub mod retry;
pub mod store;

pub use config::{OrcConfig, PatrolConfig, RoutingConfig, SeatConfig};
pub use coordinator::{Coordinator, EscalationRoute, NewTask, Review, RollupOutcome};
pub use error::{OrcError, OrcResult};
pub use escalation::EscalationRouter;
pub use events::{EventBus, EventFilter, PatrolEvent, SharedEventBus, StopReason};
pub use guard::GuardResult;
pub use ids::EntityKind;
pub use patrol::{PaneCapture, PatrolSupervisor, TmuxPane};
pub use retry::RetryPolicy;
pub use store::{Entity, EntityStore, FileStore, MemoryStore, StoreError};
