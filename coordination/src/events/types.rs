//! Patrol event types
//!
//! Published on the [`EventBus`](super::EventBus) as the patrol subsystem
//! records checks and moves stucks through their lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Outcome;

/// Why a patrol loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Stop signal or operator stop
    Requested,
    /// The patrol raised an escalation
    Escalated,
    /// The patrol row left `active` under the loop
    Inactive,
}

/// All patrol subsystem events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PatrolEvent {
    PatrolStarted {
        patrol_id: String,
        seat_id: String,
        target: String,
        timestamp: DateTime<Utc>,
    },

    CheckRecorded {
        patrol_id: String,
        check_id: String,
        outcome: Outcome,
        timestamp: DateTime<Utc>,
    },

    /// A tick produced no check (capture or store failure)
    TickSkipped {
        patrol_id: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    StuckOpened {
        patrol_id: String,
        stuck_id: String,
        check_id: String,
        timestamp: DateTime<Utc>,
    },

    StuckIncremented {
        patrol_id: String,
        stuck_id: String,
        count: u32,
        timestamp: DateTime<Utc>,
    },

    StuckResolved {
        patrol_id: String,
        stuck_id: String,
        count: u32,
        timestamp: DateTime<Utc>,
    },

    StuckEscalated {
        patrol_id: String,
        stuck_id: String,
        escalation_id: String,
        target_actor: String,
        timestamp: DateTime<Utc>,
    },

    /// Enter was sent to a seat with an unsubmitted command
    SeatNudged {
        patrol_id: String,
        target: String,
        timestamp: DateTime<Utc>,
    },

    PatrolStopped {
        patrol_id: String,
        reason: StopReason,
        timestamp: DateTime<Utc>,
    },
}

impl PatrolEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PatrolStarted { .. } => "patrol_started",
            Self::CheckRecorded { .. } => "check_recorded",
            Self::TickSkipped { .. } => "tick_skipped",
            Self::StuckOpened { .. } => "stuck_opened",
            Self::StuckIncremented { .. } => "stuck_incremented",
            Self::StuckResolved { .. } => "stuck_resolved",
            Self::StuckEscalated { .. } => "stuck_escalated",
            Self::SeatNudged { .. } => "seat_nudged",
            Self::PatrolStopped { .. } => "patrol_stopped",
        }
    }

    pub fn patrol_id(&self) -> &str {
        match self {
            Self::PatrolStarted { patrol_id, .. }
            | Self::CheckRecorded { patrol_id, .. }
            | Self::TickSkipped { patrol_id, .. }
            | Self::StuckOpened { patrol_id, .. }
            | Self::StuckIncremented { patrol_id, .. }
            | Self::StuckResolved { patrol_id, .. }
            | Self::StuckEscalated { patrol_id, .. }
            | Self::SeatNudged { patrol_id, .. }
            | Self::PatrolStopped { patrol_id, .. } => patrol_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::PatrolStarted { timestamp, .. }
            | Self::CheckRecorded { timestamp, .. }
            | Self::TickSkipped { timestamp, .. }
            | Self::StuckOpened { timestamp, .. }
            | Self::StuckIncremented { timestamp, .. }
            | Self::StuckResolved { timestamp, .. }
            | Self::StuckEscalated { timestamp, .. }
            | Self::SeatNudged { timestamp, .. }
            | Self::PatrolStopped { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_tag() {
        let event = PatrolEvent::StuckOpened {
            patrol_id: "PAT-001".into(),
            stuck_id: "STUCK-001".into(),
            check_id: "CHK-003".into(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "stuck_opened");
        assert_eq!(event.event_type(), "stuck_opened");
        assert_eq!(event.patrol_id(), "PAT-001");
    }
}
