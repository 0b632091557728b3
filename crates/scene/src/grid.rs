use glam::Vec3;
use handspace_common::EntityId;
use std::collections::{HashMap, HashSet};

/// A 3D cell coordinate in the bucket grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellCoord {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Fixed-size bucket grid used as the coarse phase of radius queries.
///
/// Entities are assigned to cells by position divided by `cell_size`.
/// A radius query visits every cell overlapping the query sphere's bounding
/// box; callers apply the exact distance test.
#[derive(Debug)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<CellCoord, HashSet<EntityId>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        assert!(cell_size > 0.0, "cell_size must be positive");
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn position_to_cell(&self, pos: Vec3) -> CellCoord {
        CellCoord {
            x: (pos.x / self.cell_size).floor() as i32,
            y: (pos.y / self.cell_size).floor() as i32,
            z: (pos.z / self.cell_size).floor() as i32,
        }
    }

    pub fn insert(&mut self, id: EntityId, pos: Vec3) {
        let coord = self.position_to_cell(pos);
        self.cells.entry(coord).or_default().insert(id);
    }

    pub fn remove(&mut self, id: EntityId, pos: Vec3) {
        let coord = self.position_to_cell(pos);
        if let Some(cell) = self.cells.get_mut(&coord) {
            cell.remove(&id);
            if cell.is_empty() {
                self.cells.remove(&coord);
            }
        }
    }

    /// Every id in a cell overlapping the sphere's bounding box.
    pub fn candidates(&self, center: Vec3, radius: f32) -> HashSet<EntityId> {
        let lo = self.position_to_cell(center - Vec3::splat(radius));
        let hi = self.position_to_cell(center + Vec3::splat(radius));
        let mut result = HashSet::new();
        for x in lo.x..=hi.x {
            for y in lo.y..=hi.y {
                for z in lo.z..=hi.z {
                    if let Some(ids) = self.cells.get(&CellCoord::new(x, y, z)) {
                        result.extend(ids);
                    }
                }
            }
        }
        result
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn total_placements(&self) -> usize {
        self.cells.values().map(|s| s.len()).sum()
    }
}
