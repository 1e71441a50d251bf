//! Patrol event stream
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Patrol loops │────▶│  Event Bus   │────▶│  Subscribers │
//! │  (publish)   │     │  (broadcast) │     │   (recv)     │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Events are a side channel: the store stays the source of truth, so a
//! dropped or lagged event never changes patrol behaviour.

pub mod bus;
pub mod types;

pub use bus::{EventBus, EventFilter, SharedEventBus};
pub use types::{PatrolEvent, StopReason};
