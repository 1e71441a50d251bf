//! Entity model: records and their closed status enumerations

pub mod records;
pub mod status;

pub use records::{
    Approval, Check, Commission, Cycle, CycleReceipt, Escalation, Investigation, Patrol, Plan,
    Receipt, Shipment, Stuck, Task, WorkOrder,
};
pub use status::{
    ApprovalOutcome, CommissionStatus, CycleStatus, EscalationOrigin, EscalationStatus,
    InvestigationStatus, Outcome, PatrolStatus, PlanStatus, ReceiptStatus, ReviewMechanism,
    RoutingRule, ShipmentStatus, StuckStatus, TaskStatus, UnknownStatus, WorkOrderStatus,
};
