//! Coordination error types

use thiserror::Error;

use crate::ids::EntityKind;
use crate::patrol::capture::CaptureError;
use crate::store::StoreError;

/// Result type alias for coordination operations
pub type OrcResult<T> = Result<T, OrcError>;

/// Errors surfaced by guarded operations and the patrol subsystem
#[derive(Debug, Error)]
pub enum OrcError {
    /// A guard refused the transition; `reason` is shown verbatim
    #[error("{reason}")]
    Denied { reason: String },

    /// A record the operation acts on is missing
    #[error("{} {id} not found", .kind.noun())]
    NotFound { kind: EntityKind, id: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// State the guards should have made impossible
    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl OrcError {
    pub fn denied(reason: impl Into<String>) -> Self {
        Self::Denied {
            reason: reason.into(),
        }
    }

    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(e) => e.is_transient(),
            Self::Capture(e) => e.is_transient(),
            _ => false,
        }
    }

    /// The denial reason, if a guard refused
    pub fn denial_reason(&self) -> Option<&str> {
        match self {
            Self::Denied { reason } => Some(reason),
            _ => None,
        }
    }
}
