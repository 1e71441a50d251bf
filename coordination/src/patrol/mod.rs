//! Patrol subsystem
//!
//! A patrol watches one seat's tmux pane. Every tick the pane is captured
//! ([`capture`]), reduced to an [`Outcome`](crate::model::Outcome)
//! ([`classifier`]), persisted as a check and assessed against the checks
//! before it ([`stuck`]). Runs of failing checks roll up into one stuck; a
//! stuck that reaches the configured threshold escalates the patrol.
//!
//! [`PatrolSupervisor`] runs one [`PatrolRunner`] task per seat.

pub mod capture;
pub mod classifier;
pub mod runner;
pub mod stuck;
pub mod supervisor;

pub use capture::{validate_target, CaptureError, PaneCapture, TmuxPane};
pub use classifier::{classify, normalize, strip_ansi};
pub use runner::PatrolRunner;
pub use stuck::{assess, rollup, Assessment, CheckHistory, RollupAction};
pub use supervisor::{PatrolHandle, PatrolSupervisor};
