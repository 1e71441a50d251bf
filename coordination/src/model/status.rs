//! Closed status enumerations for every entity
//!
//! Statuses are stored as strings; the mapping lives here so that the store
//! boundary is the only place a loosely-typed status can appear. Each enum
//! round-trips through `as_str` / `FromStr` and serializes to the same text.

use serde::{Deserialize, Serialize};

/// A status string that does not name a variant of the expected enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {type_name} value '{value}'")]
pub struct UnknownStatus {
    pub type_name: &'static str,
    pub value: String,
}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            /// Storage representation.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $text ),+
                }
            }

            /// Every variant, in declaration order.
            pub fn all() -> &'static [$name] {
                &[ $( Self::$variant ),+ ]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok(Self::$variant), )+
                    other => Err(UnknownStatus {
                        type_name: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// Lifecycle of a commission.
    pub enum CommissionStatus {
        Initial => "initial",
        Active => "active",
        Paused => "paused",
        Complete => "complete",
        Archived => "archived",
        Deleted => "deleted",
    }
}

impl CommissionStatus {
    /// Whether new shipments may still be added.
    pub fn accepts_work(self) -> bool {
        matches!(self, Self::Initial | Self::Active | Self::Paused)
    }
}

string_enum! {
    /// Lifecycle of a shipment.
    pub enum ShipmentStatus {
        Draft => "draft",
        Ready => "ready",
        InProgress => "in-progress",
        Closed => "closed",
    }
}

string_enum! {
    /// Lifecycle of a task.
    pub enum TaskStatus {
        Open => "open",
        InProgress => "in-progress",
        Blocked => "blocked",
        Closed => "closed",
    }
}

string_enum! {
    /// Lifecycle of an investigation.
    pub enum InvestigationStatus {
        Active => "active",
        Paused => "paused",
        Complete => "complete",
    }
}

string_enum! {
    /// Lifecycle of a plan.
    pub enum PlanStatus {
        Draft => "draft",
        PendingReview => "pending_review",
        Approved => "approved",
        Escalated => "escalated",
        Superseded => "superseded",
    }
}

impl PlanStatus {
    /// Draft and pending plans block a second plan on the same task.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Draft | Self::PendingReview)
    }
}

string_enum! {
    /// Result recorded on an approval.
    pub enum ApprovalOutcome {
        Approved => "approved",
        Escalated => "escalated",
    }
}

string_enum! {
    /// How a plan was reviewed.
    pub enum ReviewMechanism {
        /// Reviewed by a supervisory agent.
        Subreview => "subreview",
        /// Reviewed by a human operator.
        Manual => "manual",
    }
}

string_enum! {
    /// Lifecycle of an escalation. Both non-pending states are terminal.
    pub enum EscalationStatus {
        Pending => "pending",
        Resolved => "resolved",
        Dismissed => "dismissed",
    }
}

string_enum! {
    /// Where an escalation came from.
    pub enum EscalationOrigin {
        /// An approval recorded with outcome `escalated`.
        Approval => "approval",
        /// A stuck roll-up crossing its threshold.
        Stuck => "stuck",
    }
}

string_enum! {
    /// How the target actor of an escalation is chosen.
    pub enum RoutingRule {
        /// The supervisory actor of the seat that raised it.
        SeatSupervisor => "seat-supervisor",
        /// The configured human operator.
        Operator => "operator",
        /// A target named by the caller.
        Explicit => "explicit",
    }
}

string_enum! {
    /// Lifecycle of a work order.
    pub enum WorkOrderStatus {
        Draft => "draft",
        Active => "active",
        Complete => "complete",
    }
}

string_enum! {
    /// Lifecycle of an implementation cycle.
    pub enum CycleStatus {
        Draft => "draft",
        Approved => "approved",
        Implementing => "implementing",
        Complete => "complete",
    }
}

string_enum! {
    /// Lifecycle shared by receipts and cycle receipts.
    pub enum ReceiptStatus {
        Draft => "draft",
        Submitted => "submitted",
        Verified => "verified",
    }
}

string_enum! {
    /// Lifecycle of a patrol.
    pub enum PatrolStatus {
        Active => "active",
        Completed => "completed",
        Escalated => "escalated",
    }
}

string_enum! {
    /// Semantic label the classifier assigns to captured pane text.
    pub enum Outcome {
        /// The agent is computing (spinner, progress gerund, interrupt hint).
        Working => "working",
        /// The agent is sitting at an empty prompt.
        Idle => "idle",
        /// The agent is blocked on an interactive selection.
        Menu => "menu",
        /// Text has been typed at a prompt but not submitted.
        Typed => "typed",
        /// A crash, error line, traceback or failing test run is visible.
        Error => "error",
    }
}

string_enum! {
    /// Lifecycle of a stuck roll-up.
    pub enum StuckStatus {
        Open => "open",
        Resolved => "resolved",
        Escalated => "escalated",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings_round_trip() {
        for status in ShipmentStatus::all() {
            assert_eq!(status.as_str().parse::<ShipmentStatus>(), Ok(*status));
        }
        for status in PlanStatus::all() {
            assert_eq!(status.as_str().parse::<PlanStatus>(), Ok(*status));
        }
    }

    #[test]
    fn test_serde_matches_storage_text() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let parsed: PlanStatus = serde_json::from_str("\"pending_review\"").unwrap();
        assert_eq!(parsed, PlanStatus::PendingReview);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let err = "shipped".parse::<ShipmentStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown ShipmentStatus value 'shipped'");
    }

    #[test]
    fn test_active_plan_states() {
        assert!(PlanStatus::Draft.is_active());
        assert!(PlanStatus::PendingReview.is_active());
        assert!(!PlanStatus::Escalated.is_active());
        assert!(!PlanStatus::Superseded.is_active());
    }
}
