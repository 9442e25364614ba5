//! Broad phase - cheap candidate pair search
//!
//! Bodies are bucketed by their AABB footprint and only bodies that share a
//! bucket are handed to the narrow phase. Two strategies implement
//! [`BroadPhase`]:
//!
//! - [`SpatialHash`] - uniform grid of `cell_size` cells stored sparsely in a
//!   HashMap. A body is inserted into every cell its AABB touches.
//! - [`SimpleBroadPhase`] - brute-force O(n²) AABB test. Used to cross-check
//!   the hash and for scenes with only a handful of bodies.
//!
//! Bodies are identified by their index in the slice the world hands in;
//! indices are stable for the duration of one step.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::body::Body;
use super::error::PhysicsResult;
use super::shape::Aabb;
use super::types::Vec2;

/// Candidate pair of body indices, `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionPair {
    pub a: usize,
    pub b: usize,
}

impl CollisionPair {
    /// Build a pair in canonical (low, high) order.
    pub fn new(i: usize, j: usize) -> Self {
        if i <= j { Self { a: i, b: j } } else { Self { a: j, b: i } }
    }
}

/// Unordered pair key: `(min << 32) | max`.
#[inline]
pub fn pair_key(i: u32, j: u32) -> u64 {
    let (lo, hi) = if i <= j { (i, j) } else { (j, i) };
    ((lo as u64) << 32) | hi as u64
}

/// Which broad phase the world runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BroadPhaseMode {
    #[default]
    SpatialHash,
    BruteForce,
}

/// Candidate pair search strategy.
pub trait BroadPhase {
    /// Drop all inserted bodies, keeping allocated storage.
    fn clear(&mut self);

    /// Register body `index` under its current AABB.
    fn insert(&mut self, index: usize, body: &Body) -> PhysicsResult<()>;

    /// Append every unique candidate pair to `pairs`.
    fn find_collision_pairs(&mut self, pairs: &mut Vec<CollisionPair>) -> PhysicsResult<()>;

    /// Append the indices of bodies near `position` (within the box
    /// `position ± radius`) to `out`, each at most once.
    fn query(&self, position: Vec2, radius: f32, out: &mut Vec<usize>) -> PhysicsResult<()>;

    /// Clear and insert every body in order.
    fn rebuild(&mut self, bodies: &[Body]) -> PhysicsResult<()> {
        self.clear();
        for (index, body) in bodies.iter().enumerate() {
            self.insert(index, body)?;
        }
        Ok(())
    }
}

/// Build the broad phase selected by `mode`.
pub fn create_broad_phase(mode: BroadPhaseMode, cell_size: f32) -> Box<dyn BroadPhase> {
    match mode {
        BroadPhaseMode::SpatialHash => Box::new(SpatialHash::new(cell_size)),
        BroadPhaseMode::BruteForce => Box::new(SimpleBroadPhase::new()),
    }
}

type CellKey = (i32, i32);

/// Once this many cells exist the map is dropped on `clear` instead of
/// recycled, so a body flung across the world does not pin memory forever.
const MAX_RETAINED_CELLS: usize = 16_384;

// =============================================================================
// SpatialHash
// =============================================================================

/// Sparse uniform grid.
///
/// Cell buckets survive `clear()` so steady-state steps do not allocate.
/// Cells are visited in the order they were first touched since the last
/// clear, which keeps pair order independent of HashMap iteration order.
#[derive(Debug, Clone)]
pub struct SpatialHash {
    cell_size: f32,
    inv_cell_size: f32,
    /// Body indices per cell
    cells: HashMap<CellKey, Vec<usize>>,
    /// Non-empty cells in first-touched order
    occupied: Vec<CellKey>,
    /// Pair keys already emitted this pass
    seen: HashSet<u64>,
    /// AABB of each inserted index
    aabbs: Vec<Option<Aabb>>,
}

impl SpatialHash {
    /// Create an empty hash. Non-positive cell sizes fall back to 1.0.
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size > 0.0 && cell_size.is_finite() { cell_size } else { 1.0 };
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cells: HashMap::new(),
            occupied: Vec::new(),
            seen: HashSet::new(),
            aabbs: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of cells holding at least one body.
    pub fn occupied_cell_count(&self) -> usize {
        self.occupied.len()
    }

    /// Grid coordinate of `p`: `floor(p / cell_size)` per axis.
    #[inline]
    pub fn cell_coord(&self, p: Vec2) -> CellKey {
        (
            (p.x * self.inv_cell_size).floor() as i32,
            (p.y * self.inv_cell_size).floor() as i32,
        )
    }

    fn insert_aabb(&mut self, index: usize, aabb: Aabb) -> PhysicsResult<()> {
        if index >= self.aabbs.len() {
            self.aabbs.try_reserve(index + 1 - self.aabbs.len())?;
            self.aabbs.resize(index + 1, None);
        }
        self.aabbs[index] = Some(aabb);

        let (min_x, min_y) = self.cell_coord(aabb.min);
        let (max_x, max_y) = self.cell_coord(aabb.max);

        for cy in min_y..=max_y {
            for cx in min_x..=max_x {
                let key = (cx, cy);
                self.cells.try_reserve(1)?;
                let bucket = self.cells.entry(key).or_default();
                if bucket.is_empty() {
                    self.occupied.try_reserve(1)?;
                    self.occupied.push(key);
                }
                bucket.try_reserve(1)?;
                bucket.push(index);
            }
        }
        Ok(())
    }

    fn aabb_of(&self, index: usize) -> Option<Aabb> {
        self.aabbs.get(index).copied().flatten()
    }
}

impl Default for SpatialHash {
    fn default() -> Self {
        Self::new(64.0)
    }
}

impl BroadPhase for SpatialHash {
    fn clear(&mut self) {
        if self.cells.len() > MAX_RETAINED_CELLS {
            self.cells.clear();
        } else {
            for key in &self.occupied {
                if let Some(bucket) = self.cells.get_mut(key) {
                    bucket.clear();
                }
            }
        }
        self.occupied.clear();
        self.seen.clear();
        self.aabbs.clear();
    }

    fn insert(&mut self, index: usize, body: &Body) -> PhysicsResult<()> {
        self.insert_aabb(index, body.aabb())
    }

    fn find_collision_pairs(&mut self, pairs: &mut Vec<CollisionPair>) -> PhysicsResult<()> {
        self.seen.clear();

        for key in &self.occupied {
            let Some(bucket) = self.cells.get(key) else {
                continue;
            };
            for (i, &first) in bucket.iter().enumerate() {
                for &second in &bucket[i + 1..] {
                    if first == second {
                        continue;
                    }
                    self.seen.try_reserve(1)?;
                    if !self.seen.insert(pair_key(first as u32, second as u32)) {
                        continue;
                    }
                    // Sharing a cell does not mean the boxes touch.
                    let (Some(box_a), Some(box_b)) = (
                        self.aabbs.get(first).copied().flatten(),
                        self.aabbs.get(second).copied().flatten(),
                    ) else {
                        continue;
                    };
                    if box_a.overlaps(&box_b) {
                        pairs.try_reserve(1)?;
                        pairs.push(CollisionPair::new(first, second));
                    }
                }
            }
        }
        Ok(())
    }

    fn query(&self, position: Vec2, radius: f32, out: &mut Vec<usize>) -> PhysicsResult<()> {
        let area = Aabb::from_center(position, Vec2::splat(radius.max(0.0)));
        let (min_x, min_y) = self.cell_coord(area.min);
        let (max_x, max_y) = self.cell_coord(area.max);
        let mut found: HashSet<usize> = HashSet::new();

        for cy in min_y..=max_y {
            for cx in min_x..=max_x {
                let Some(bucket) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                for &index in bucket {
                    let hit = self.aabb_of(index).is_some_and(|b| b.overlaps(&area));
                    if hit {
                        found.try_reserve(1)?;
                        if found.insert(index) {
                            out.try_reserve(1)?;
                            out.push(index);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// SimpleBroadPhase
// =============================================================================

/// Brute-force broad phase: every inserted body against every other.
#[derive(Debug, Clone, Default)]
pub struct SimpleBroadPhase {
    entries: Vec<(usize, Aabb)>,
}

impl SimpleBroadPhase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BroadPhase for SimpleBroadPhase {
    fn clear(&mut self) {
        self.entries.clear();
    }

    fn insert(&mut self, index: usize, body: &Body) -> PhysicsResult<()> {
        self.entries.try_reserve(1)?;
        self.entries.push((index, body.aabb()));
        Ok(())
    }

    fn find_collision_pairs(&mut self, pairs: &mut Vec<CollisionPair>) -> PhysicsResult<()> {
        for (i, (index_a, box_a)) in self.entries.iter().enumerate() {
            for (index_b, box_b) in &self.entries[i + 1..] {
                if index_a != index_b && box_a.overlaps(box_b) {
                    pairs.try_reserve(1)?;
                    pairs.push(CollisionPair::new(*index_a, *index_b));
                }
            }
        }
        Ok(())
    }

    fn query(&self, position: Vec2, radius: f32, out: &mut Vec<usize>) -> PhysicsResult<()> {
        let area = Aabb::from_center(position, Vec2::splat(radius.max(0.0)));
        for (index, aabb) in &self.entries {
            if aabb.overlaps(&area) && !out.contains(index) {
                out.try_reserve(1)?;
                out.push(*index);
            }
        }
        Ok(())
    }
}
