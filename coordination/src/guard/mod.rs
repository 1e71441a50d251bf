//! Guard engine: pure precondition checks for every lifecycle transition
//!
//! Each guard takes a flat context (already resolved from the store by the
//! caller) and returns a [`GuardResult`]. Guards perform no I/O, never retry
//! and never mutate; the caller writes only when the verdict allows it.
//!
//! All guards are built from a [`Preconditions`] pipeline: an ordered list of
//! `(predicate, reason)` pairs evaluated short-circuit. Only the first failing
//! pair builds its reason, so the check order is the contract:
//!
//! ```text
//! existence ──▶ pinned ──▶ status ──▶ relational invariant ──▶ content
//! ```

pub mod commission;
pub mod escalation;
pub mod investigation;
pub mod patrol;
pub mod pin;
pub mod plan;
pub mod receipt;
pub mod shipment;
pub mod task;
pub mod work_order;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{OrcError, OrcResult};
use crate::ids::EntityKind;

/// Verdict of a guard.
///
/// `reason` is empty when allowed; when denied it is a complete sentence shown
/// verbatim to operators and agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardResult {
    pub allowed: bool,
    pub reason: String,
}

impl GuardResult {
    /// An allowing verdict
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: String::new(),
        }
    }

    /// A denying verdict with its reason
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// Convert into a result so callers can `?` a denial.
    pub fn into_result(self) -> OrcResult<()> {
        if self.allowed {
            Ok(())
        } else {
            Err(OrcError::Denied {
                reason: self.reason,
            })
        }
    }
}

impl fmt::Display for GuardResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.allowed {
            write!(f, "allowed")
        } else {
            write!(f, "denied: {}", self.reason)
        }
    }
}

/// Ordered, short-circuiting precondition pipeline.
#[derive(Debug, Default)]
#[must_use = "call .verdict() to obtain the guard result"]
pub struct Preconditions {
    denied: Option<String>,
}

impl Preconditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `ok`; `reason` is built only if this is the first failure.
    pub fn require(mut self, ok: bool, reason: impl FnOnce() -> String) -> Self {
        if self.denied.is_none() && !ok {
            self.denied = Some(reason());
        }
        self
    }

    /// Require that a referenced entity exists.
    pub fn require_found(self, found: bool, kind: EntityKind, id: &str) -> Self {
        self.require(found, || not_found(kind, id))
    }

    /// Require that an entity is not pinned before `action` ("complete", "archive").
    pub fn require_unpinned(self, pinned: bool, action: &str, kind: EntityKind, id: &str) -> Self {
        self.require(!pinned, || pinned_reason(action, kind, id))
    }

    /// Require the current status to be one of `allowed`.
    ///
    /// `action` completes "can only ..." e.g. `"pause active commissions"`.
    pub fn require_status<S>(self, current: Option<S>, allowed: &[S], action: &str) -> Self
    where
        S: Copy + PartialEq + fmt::Display,
    {
        let ok = current.is_some_and(|s| allowed.contains(&s));
        self.require(ok, || status_reason(action, current))
    }

    /// Require non-blank text.
    pub fn require_text(self, text: &str, reason: impl FnOnce() -> String) -> Self {
        self.require(!text.trim().is_empty(), reason)
    }

    /// Final verdict.
    pub fn verdict(self) -> GuardResult {
        match self.denied {
            Some(reason) => GuardResult::deny(reason),
            None => GuardResult::allow(),
        }
    }
}

/// `"<noun> <id> not found"`
pub fn not_found(kind: EntityKind, id: &str) -> String {
    format!("{} {} not found", kind.noun(), id)
}

/// `"cannot <action> pinned <noun> <id>. Unpin first with: orc <noun> unpin <id>"`
pub fn pinned_reason(action: &str, kind: EntityKind, id: &str) -> String {
    format!(
        "cannot {} pinned {} {}. Unpin first with: orc {} unpin {}",
        action,
        kind.noun(),
        id,
        kind.noun(),
        id
    )
}

/// `"can only <action> (current status: <status>)"`
pub fn status_reason<S: fmt::Display>(action: &str, current: Option<S>) -> String {
    match current {
        Some(status) => format!("can only {} (current status: {})", action, status),
        None => format!("can only {} (current status: unknown)", action),
    }
}
