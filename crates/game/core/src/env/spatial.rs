use crate::geometry::{AttackRegion, Point};
use crate::state::{EntityId, Region};

/// Polygon query over a region.
///
/// Results are a snapshot: the caller resolves exactly these entities even if
/// they move afterwards. Order must be stable for a fixed region state.
pub trait SpatialQuery: Send + Sync {
    fn entities_in_polygon(&self, region: &Region, polygon: &AttackRegion) -> Vec<EntityId>;
}

/// Linear scan in entity id order.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegionScan;

impl SpatialQuery for RegionScan {
    fn entities_in_polygon(&self, region: &Region, polygon: &AttackRegion) -> Vec<EntityId> {
        region
            .combatants()
            .filter(|c| polygon.contains(Point::from(c.position)))
            .map(|c| c.id)
            .collect()
    }
}
