//! Entity records
//!
//! Plain data held by the store. Records are created by guarded operations and
//! changed only through status transitions; none of these methods check
//! preconditions themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::*;
use crate::ids::EntityKind;
use crate::store::schema::keys;
use crate::store::Entity;

/// Top-level unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commission {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: CommissionStatus,
    #[serde(default)]
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Commission {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            status: CommissionStatus::Initial,
            pinned: false,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Commission {
    const KIND: EntityKind = EntityKind::Commission;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Deliverable container under a commission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: String,
    pub commission_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ShipmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_reason: Option<String>,
    #[serde(default)]
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Shipment {
    pub fn new(
        id: impl Into<String>,
        commission_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            commission_id: commission_id.into(),
            title: title.into(),
            description: None,
            status: ShipmentStatus::Draft,
            closed_reason: None,
            pinned: false,
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }
}

impl Entity for Shipment {
    const KIND: EntityKind = EntityKind::Shipment;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Atomic unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investigation_id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            shipment_id: None,
            investigation_id: None,
            title: title.into(),
            description: None,
            status: TaskStatus::Open,
            pinned: false,
            created_at: now,
            updated_at: now,
            claimed_at: None,
            completed_at: None,
        }
    }
}

impl Entity for Task {
    const KIND: EntityKind = EntityKind::Task;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Exploratory work under a commission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investigation {
    pub id: String,
    pub commission_id: String,
    pub title: String,
    pub status: InvestigationStatus,
    #[serde(default)]
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Investigation {
    pub fn new(
        id: impl Into<String>,
        commission_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            commission_id: commission_id.into(),
            title: title.into(),
            status: InvestigationStatus::Active,
            pinned: false,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

impl Entity for Investigation {
    const KIND: EntityKind = EntityKind::Investigation;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Proposed implementation strategy for a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub task_id: String,
    pub content: String,
    pub status: PlanStatus,
    /// Previously approved plan this one replaced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    pub fn new(id: impl Into<String>, task_id: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            task_id: task_id.into(),
            content: content.into(),
            status: PlanStatus::Draft,
            supersedes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Plan {
    const KIND: EntityKind = EntityKind::Plan;

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_key(&self) -> Option<String> {
        self.status
            .is_active()
            .then(|| keys::active_plan(&self.task_id))
    }
}

/// Review outcome of a plan (immutable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approval {
    pub id: String,
    pub plan_id: String,
    pub task_id: String,
    pub mechanism: ReviewMechanism,
    pub outcome: ApprovalOutcome,
    pub reviewer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Approval {
    const KIND: EntityKind = EntityKind::Approval;

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(keys::one_per_parent(&self.plan_id))
    }
}

/// Routed request for human or supervisory attention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Escalation {
    pub id: String,
    pub origin: EscalationOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patrol_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stuck_id: Option<String>,
    pub reason: String,
    pub routing_rule: RoutingRule,
    pub target_actor: String,
    pub status: EscalationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Entity for Escalation {
    const KIND: EntityKind = EntityKind::Escalation;

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_key(&self) -> Option<String> {
        self.stuck_id.as_deref().map(keys::stuck_escalation)
    }
}

/// What a shipment has to deliver (1:1 with its shipment)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: String,
    pub shipment_id: String,
    pub outcome: String,
    pub status: WorkOrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for WorkOrder {
    const KIND: EntityKind = EntityKind::WorkOrder;

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(keys::one_per_parent(&self.shipment_id))
    }
}

/// One implementation iteration of a shipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub id: String,
    pub shipment_id: String,
    /// 1-based position within the shipment
    pub sequence: u32,
    pub status: CycleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Cycle {
    const KIND: EntityKind = EntityKind::Cycle;

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(keys::cycle_number(&self.shipment_id, self.sequence))
    }
}

/// Delivered-outcome record for one cycle (1:1 with its cycle)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReceipt {
    pub id: String,
    pub cycle_id: String,
    pub delivered_outcome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    pub status: ReceiptStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for CycleReceipt {
    const KIND: EntityKind = EntityKind::CycleReceipt;

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(keys::one_per_parent(&self.cycle_id))
    }
}

/// Delivered-outcome record closing out a shipment (1:1 with its shipment)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: String,
    pub shipment_id: String,
    pub delivered_outcome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    pub status: ReceiptStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Receipt {
    pub fn new(
        id: impl Into<String>,
        shipment_id: impl Into<String>,
        delivered_outcome: impl Into<String>,
        evidence: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            shipment_id: shipment_id.into(),
            delivered_outcome: delivered_outcome.into(),
            evidence,
            status: ReceiptStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Receipt {
    const KIND: EntityKind = EntityKind::Receipt;

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(keys::one_per_parent(&self.shipment_id))
    }
}

/// Monitoring session bound to one seat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patrol {
    pub id: String,
    pub seat_id: String,
    /// Pane address (`session:window.pane`)
    pub target: String,
    pub status: PatrolStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl Patrol {
    pub fn new(id: impl Into<String>, seat_id: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            seat_id: seat_id.into(),
            target: target.into(),
            status: PatrolStatus::Active,
            created_at: Utc::now(),
            ended_at: None,
        }
    }
}

impl Entity for Patrol {
    const KIND: EntityKind = EntityKind::Patrol;

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_key(&self) -> Option<String> {
        (self.status == PatrolStatus::Active).then(|| keys::active_patrol(&self.seat_id))
    }
}

/// One classified observation (immutable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub id: String,
    pub patrol_id: String,
    pub outcome: Outcome,
    /// Pane text with escape sequences stripped
    pub pane_text: String,
    pub captured_at: DateTime<Utc>,
}

impl Entity for Check {
    const KIND: EntityKind = EntityKind::Check;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Roll-up of consecutive non-recovering checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stuck {
    pub id: String,
    pub patrol_id: String,
    pub first_check_id: String,
    /// Most recent check counted into `count`
    #[serde(default)]
    pub last_check_id: String,
    pub count: u32,
    pub status: StuckStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Stuck {
    /// A fresh open stuck whose run starts at `first_check_id`.
    pub fn open(
        id: impl Into<String>,
        patrol_id: impl Into<String>,
        first_check_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        let first_check_id = first_check_id.into();
        Self {
            id: id.into(),
            patrol_id: patrol_id.into(),
            last_check_id: first_check_id.clone(),
            first_check_id,
            count: 1,
            status: StuckStatus::Open,
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }
}

impl Entity for Stuck {
    const KIND: EntityKind = EntityKind::Stuck;

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_key(&self) -> Option<String> {
        (self.status == StuckStatus::Open).then(|| keys::open_stuck(&self.patrol_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patrol_unique_key_only_while_active() {
        let mut patrol = Patrol::new("PAT-001", "SEAT-001", "orc:1.0");
        assert_eq!(patrol.unique_key().as_deref(), Some("active-seat:SEAT-001"));
        patrol.status = PatrolStatus::Completed;
        assert_eq!(patrol.unique_key(), None);
    }

    #[test]
    fn test_plan_unique_key_only_while_active() {
        let mut plan = Plan::new("PLAN-001", "TASK-001", "do the thing");
        assert!(plan.unique_key().is_some());
        plan.status = PlanStatus::Approved;
        assert!(plan.unique_key().is_none());
    }

    #[test]
    fn test_task_serializes_without_empty_optionals() {
        let task = Task::new("TASK-001", "write parser");
        let json = serde_json::to_value(&task).unwrap();
        assert!(json.get("shipment_id").is_none());
        assert_eq!(json["status"], "open");
    }
}
