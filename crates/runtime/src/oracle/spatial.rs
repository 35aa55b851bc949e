//! Uniform grid over combatant positions.

use std::collections::HashMap;

use skill_core::geometry::{AttackRegion, Point};
use skill_core::{EntityId, Position, Region, SpatialQuery};

/// Buckets combatants into square cells so a polygon query only tests the
/// cells under the polygon's bounds.
///
/// The grid is a cache of positions; [`rebuild`](Self::rebuild) it from the
/// region before querying. Hits are confirmed against live positions, so a
/// stale cell can only cost a miss for something that moved in since.
#[derive(Clone, Debug)]
pub struct GridSpatialIndex {
    cell_size: i32,
    cells: HashMap<(i32, i32), Vec<EntityId>>,
}

impl GridSpatialIndex {
    pub const DEFAULT_CELL_SIZE: i32 = 500;

    pub fn new(cell_size: i32) -> Self {
        Self {
            cell_size: cell_size.max(1),
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> i32 {
        self.cell_size
    }

    pub fn rebuild(&mut self, region: &Region) {
        self.cells.clear();
        for combatant in region.combatants() {
            self.insert(combatant.id, combatant.position);
        }
    }

    pub fn insert(&mut self, entity: EntityId, position: Position) {
        self.cells
            .entry(self.cell_of(position.x, position.y))
            .or_default()
            .push(entity);
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn cell_of(&self, x: i32, y: i32) -> (i32, i32) {
        (x.div_euclid(self.cell_size), y.div_euclid(self.cell_size))
    }

    fn cell_of_point(&self, point: Point) -> (i32, i32) {
        self.cell_of(saturate(point.x), saturate(point.y))
    }
}

impl Default for GridSpatialIndex {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CELL_SIZE)
    }
}

impl SpatialQuery for GridSpatialIndex {
    /// Entities inside `polygon`, in ascending id order.
    fn entities_in_polygon(&self, region: &Region, polygon: &AttackRegion) -> Vec<EntityId> {
        let (min, max) = polygon.bounds();
        let (min_x, min_y) = self.cell_of_point(min);
        let (max_x, max_y) = self.cell_of_point(max);

        let mut found = Vec::new();
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                let Some(bucket) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                found.extend(bucket.iter().copied().filter(|id| {
                    region
                        .get(*id)
                        .is_some_and(|c| polygon.contains(Point::from(c.position)))
                }));
            }
        }
        found.sort_unstable();
        found.dedup();
        found
    }
}

fn saturate(value: f64) -> i32 {
    value.floor().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use skill_core::geometry::{Facing, build_attack_region};
    use skill_core::{Combatant, RegionId, RegionScan};

    fn region_with(positions: &[(u64, i32, i32)]) -> Region {
        let mut region = Region::new(RegionId(1));
        for &(id, x, y) in positions {
            region
                .spawn(Combatant::new(EntityId(id), RegionId(1), Position::new(x, y), 10.0))
                .unwrap();
        }
        region
    }

    #[test]
    fn matches_linear_scan() {
        let region = region_with(&[
            (1, 0, 0),
            (2, 450, 20),
            (3, 900, -80),
            (4, 1_499, 0),
            (5, 1_600, 0),
            (6, 800, 300),
            (7, -200, 0),
        ]);
        let mut grid = GridSpatialIndex::new(250);
        grid.rebuild(&region);
        assert_eq!(grid.len(), 7);

        for facing in [0.0, 0.7, 3.1, 4.5] {
            let polygon = build_attack_region(
                Point::new(0.0, 0.0),
                Facing::from_radians(facing),
                800.0,
                1_400.0,
                200.0,
            )
            .unwrap();
            assert_eq!(
                grid.entities_in_polygon(&region, &polygon),
                RegionScan.entities_in_polygon(&region, &polygon),
                "facing {facing}"
            );
        }
    }

    #[test]
    fn despawned_entities_are_not_reported() {
        let mut region = region_with(&[(1, 500, 0), (2, 600, 0)]);
        let mut grid = GridSpatialIndex::default();
        grid.rebuild(&region);
        region.despawn(EntityId(1));

        let polygon = build_attack_region(
            Point::new(0.0, 0.0),
            Facing::default(),
            800.0,
            1_400.0,
            200.0,
        )
        .unwrap();
        assert_eq!(
            grid.entities_in_polygon(&region, &polygon),
            vec![EntityId(2)]
        );
    }

    #[test]
    fn negative_coordinates_fall_in_their_own_cells() {
        let grid = GridSpatialIndex::new(100);
        assert_eq!(grid.cell_of(-1, -1), (-1, -1));
        assert_eq!(grid.cell_of(99, 0), (0, 0));
    }
}
