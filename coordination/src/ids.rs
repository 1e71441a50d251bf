//! Entity kinds and human-readable identifiers
//!
//! Every entity is addressed by `PREFIX-NNN`, a per-kind prefix followed by a
//! zero-padded sequence number (`SHIP-014`, `TASK-007`). Sequences are
//! allocated by the store; this module only formats and parses them.

use serde::{Deserialize, Serialize};

/// Minimum width of the numeric part of an ID.
const SEQUENCE_WIDTH: usize = 3;

/// The entity types known to the coordination core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Commission,
    Shipment,
    Task,
    Investigation,
    Plan,
    Approval,
    Escalation,
    WorkOrder,
    Cycle,
    CycleReceipt,
    Receipt,
    Patrol,
    Check,
    Stuck,
}

impl EntityKind {
    /// ID prefix for this kind.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Commission => "COMM",
            Self::Shipment => "SHIP",
            Self::Task => "TASK",
            Self::Investigation => "INV",
            Self::Plan => "PLAN",
            Self::Approval => "APPR",
            Self::Escalation => "ESC",
            Self::WorkOrder => "WO",
            Self::Cycle => "CYC",
            Self::CycleReceipt => "CREC",
            Self::Receipt => "REC",
            Self::Patrol => "PAT",
            Self::Check => "CHK",
            Self::Stuck => "STUCK",
        }
    }

    /// Noun used in user-facing guard reasons ("shipment SHIP-001 not found").
    pub fn noun(self) -> &'static str {
        match self {
            Self::Commission => "commission",
            Self::Shipment => "shipment",
            Self::Task => "task",
            Self::Investigation => "investigation",
            Self::Plan => "plan",
            Self::Approval => "approval",
            Self::Escalation => "escalation",
            Self::WorkOrder => "work order",
            Self::Cycle => "cycle",
            Self::CycleReceipt => "cycle receipt",
            Self::Receipt => "receipt",
            Self::Patrol => "patrol",
            Self::Check => "check",
            Self::Stuck => "stuck",
        }
    }

    /// Every kind, in declaration order.
    pub fn all() -> &'static [EntityKind] {
        &[
            Self::Commission,
            Self::Shipment,
            Self::Task,
            Self::Investigation,
            Self::Plan,
            Self::Approval,
            Self::Escalation,
            Self::WorkOrder,
            Self::Cycle,
            Self::CycleReceipt,
            Self::Receipt,
            Self::Patrol,
            Self::Check,
            Self::Stuck,
        ]
    }

    /// Look up a kind by its ID prefix.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.prefix() == prefix)
    }

    /// Format an ID for this kind from a sequence number.
    pub fn format_id(self, sequence: u64) -> String {
        format!(
            "{}-{:0width$}",
            self.prefix(),
            sequence,
            width = SEQUENCE_WIDTH
        )
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.noun())
    }
}

/// Split an ID into its kind and sequence number.
///
/// Returns `None` for unknown prefixes or a non-numeric sequence.
pub fn parse_id(id: &str) -> Option<(EntityKind, u64)> {
    let (prefix, sequence) = id.rsplit_once('-')?;
    let kind = EntityKind::from_prefix(prefix)?;
    let sequence = sequence.parse().ok()?;
    Some((kind, sequence))
}
