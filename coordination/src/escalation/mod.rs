//! Escalation routing
//!
//! An escalation is raised either by plan review (origin `approval`) or by the
//! patrol subsystem when a stuck crosses its threshold (origin `stuck`). The
//! router decides which actor receives it:
//!
//! ```text
//! seat-supervisor ──▶ supervisor configured for the seat ──▶ default actor
//! operator        ──▶ default actor
//! explicit        ──▶ caller-supplied target
//! ```
//!
//! Resolution and dismissal are guarded terminal transitions handled by the
//! [`Coordinator`](crate::coordinator::Coordinator).

pub mod router;

pub use router::EscalationRouter;
