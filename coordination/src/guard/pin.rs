//! Pin / unpin guards shared by every pinnable kind

use super::{GuardResult, Preconditions};
use crate::ids::EntityKind;

/// Context for pinning or unpinning an entity
#[derive(Debug, Clone)]
pub struct PinContext {
    pub kind: EntityKind,
    pub id: String,
    pub exists: bool,
    pub pinned: bool,
}

/// Whether the entity can be pinned
pub fn can_pin(ctx: &PinContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.exists, ctx.kind, &ctx.id)
        .require(!ctx.pinned, || {
            format!("{} {} is already pinned", ctx.kind.noun(), ctx.id)
        })
        .verdict()
}

/// Whether the entity can be unpinned
pub fn can_unpin(ctx: &PinContext) -> GuardResult {
    Preconditions::new()
        .require_found(ctx.exists, ctx.kind, &ctx.id)
        .require(ctx.pinned, || {
            format!("{} {} is not pinned", ctx.kind.noun(), ctx.id)
        })
        .verdict()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(exists: bool, pinned: bool) -> PinContext {
        PinContext {
            kind: EntityKind::Shipment,
            id: "SHIP-003".into(),
            exists,
            pinned,
        }
    }

    #[test]
    fn test_pin() {
        assert!(can_pin(&ctx(true, false)).allowed);
        assert_eq!(
            can_pin(&ctx(true, true)).reason,
            "shipment SHIP-003 is already pinned"
        );
        assert_eq!(
            can_pin(&ctx(false, false)).reason,
            "shipment SHIP-003 not found"
        );
    }

    #[test]
    fn test_unpin() {
        assert!(can_unpin(&ctx(true, true)).allowed);
        assert_eq!(
            can_unpin(&ctx(true, false)).reason,
            "shipment SHIP-003 is not pinned"
        );
    }
}
