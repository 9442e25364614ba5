//! Body storage with stable ids
//!
//! Bodies live in one dense `Vec` so the stepper can walk them in order.
//! Removal swaps the last body into the hole, so a body's index can change;
//! its [`BodyId`] cannot. The `slots` table maps every id ever issued to the
//! body's current index (or `None` once removed) and is patched on every
//! swap.

use crate::physics::body::{Body, BodyId};
use crate::physics::error::{PhysicsError, PhysicsResult};

#[derive(Debug, Clone, Default)]
pub struct BodyStorage {
    bodies: Vec<Body>,
    /// `slots[id]` = current index of body `id`
    slots: Vec<Option<usize>>,
}

impl BodyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `body` and return its new id.
    pub fn insert(&mut self, mut body: Body) -> PhysicsResult<BodyId> {
        let raw = u32::try_from(self.slots.len())
            .ok()
            .filter(|&raw| raw != BodyId::UNASSIGNED.raw())
            .ok_or_else(|| PhysicsError::InvalidBody("body id space exhausted".into()))?;

        self.bodies.try_reserve(1)?;
        self.slots.try_reserve(1)?;

        let id = BodyId::new(raw);
        body.assign_id(id);
        self.slots.push(Some(self.bodies.len()));
        self.bodies.push(body);
        Ok(id)
    }

    /// Current index of `id`, if the body still exists.
    pub fn index_of(&self, id: BodyId) -> Option<usize> {
        self.slots.get(id.raw() as usize).copied().flatten()
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.index_of(id).and_then(|index| self.bodies.get(index))
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        let index = self.index_of(id)?;
        self.bodies.get_mut(index)
    }

    /// Remove `id`, moving the last body into its slot.
    pub fn remove(&mut self, id: BodyId) -> Option<Body> {
        let index = self.index_of(id)?;
        self.slots[id.raw() as usize] = None;
        let removed = self.bodies.swap_remove(index);
        if let Some(moved) = self.bodies.get(index) {
            self.slots[moved.id().raw() as usize] = Some(index);
        }
        Some(removed)
    }

    /// Drop every body. Ids already issued are not reused.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn as_slice(&self) -> &[Body] {
        &self.bodies
    }

    pub fn as_mut_slice(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    pub fn iter(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Body> {
        self.bodies.iter_mut()
    }
}

/// Mutable references to two distinct bodies, in argument order.
///
/// Returns `None` when `a == b` or either index is out of range.
pub fn pair_mut(bodies: &mut [Body], a: usize, b: usize) -> Option<(&mut Body, &mut Body)> {
    if a == b || a >= bodies.len() || b >= bodies.len() {
        return None;
    }
    if a < b {
        let (head, tail) = bodies.split_at_mut(b);
        Some((&mut head[a], &mut tail[0]))
    } else {
        let (head, tail) = bodies.split_at_mut(a);
        Some((&mut tail[0], &mut head[b]))
    }
}
