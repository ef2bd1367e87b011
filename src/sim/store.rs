//! Target store: a slot arena with an explicit free list
//!
//! Removing a target only hides it; its slot goes on the free list and is
//! reused by the next add. Iteration order is slot order and never changes
//! within a tick. Ids are handed out by a counter and looked up through an
//! index, so callers hold ids rather than references into the arena.

use std::collections::{BTreeSet, HashMap};

use glam::{Vec2, Vec3};

use super::collision::{ray_capsule, ray_sphere};
use super::room::{RoomDef, wall_to_world};
use super::target::{Target, TargetId};

/// Render/comparison view of one visible target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSnapshot {
    pub id: TargetId,
    pub wall_position: Vec2,
    pub position: Vec3,
    pub radius: f32,
    pub ghost: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TargetStore {
    slots: Vec<Target>,
    /// Hidden slots, lowest index reused first
    free: BTreeSet<usize>,
    index: HashMap<TargetId, usize>,
    last_id: TargetId,
}

impl TargetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new target id (never 0)
    pub fn next_id(&mut self) -> TargetId {
        self.last_id = self.last_id.wrapping_add(1);
        if self.last_id == 0 {
            self.last_id = 1;
        }
        self.last_id
    }

    /// Keep the id counter ahead of externally assigned ids
    fn observe_id(&mut self, id: TargetId) {
        if id > self.last_id {
            self.last_id = id;
        }
    }

    /// Insert a target, assigning an id when it has none.
    ///
    /// The first hidden slot is reused before the arena grows.
    pub fn add_target(&mut self, mut target: Target) -> Target {
        if target.id == 0 {
            target.id = self.next_id();
        } else {
            self.observe_id(target.id);
        }
        target.hidden = false;

        let slot = match self.free.pop_first() {
            Some(slot) => {
                self.slots[slot] = target.clone();
                slot
            }
            None => {
                self.slots.push(target.clone());
                self.slots.len() - 1
            }
        };
        self.index.insert(target.id, slot);
        target
    }

    /// Hide a target and free its slot. Returns false for unknown ids.
    pub fn remove_target(&mut self, id: TargetId) -> bool {
        let Some(slot) = self.index.remove(&id) else {
            return false;
        };
        self.slots[slot].hidden = true;
        self.free.insert(slot);
        true
    }

    /// Swap `new_target` into the slot held by `old_id`.
    ///
    /// Falls back to a plain add when `old_id` is not live.
    pub fn replace_target(&mut self, old_id: TargetId, mut new_target: Target) -> Target {
        let Some(slot) = self.index.remove(&old_id) else {
            return self.add_target(new_target);
        };
        if new_target.id == 0 {
            new_target.id = self.next_id();
        } else {
            self.observe_id(new_target.id);
        }
        new_target.hidden = false;
        self.slots[slot] = new_target.clone();
        self.index.insert(new_target.id, slot);
        new_target
    }

    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.index.get(&id).map(|&slot| &self.slots[slot])
    }

    pub fn get_mut(&mut self, id: TargetId) -> Option<&mut Target> {
        self.index.get(&id).map(|&slot| &mut self.slots[slot])
    }

    /// Visible targets in slot order
    pub fn visible(&self) -> impl Iterator<Item = &Target> {
        self.slots.iter().filter(|t| !t.hidden)
    }

    pub fn visible_mut(&mut self) -> impl Iterator<Item = &mut Target> {
        self.slots.iter_mut().filter(|t| !t.hidden)
    }

    /// Ids of visible targets in slot order
    pub fn visible_ids(&self) -> Vec<TargetId> {
        self.visible().map(|t| t.id).collect()
    }

    pub fn visible_count(&self) -> usize {
        self.index.len()
    }

    /// All slots including hidden ones (render snapshot)
    pub fn slots(&self) -> &[Target] {
        &self.slots
    }

    /// Clear ghost flags on every visible target
    pub fn promote_ghosts(&mut self) {
        for target in self.visible_mut() {
            target.ghost = false;
        }
    }

    /// Move every visible target to where its motion puts it at `run_micros`
    /// and refresh its radius and world position.
    pub fn advance(&mut self, room: &RoomDef, run_micros: u64) {
        for target in self.visible_mut() {
            if let Some(motion) = target.motion {
                target.wall_position = motion.position_at(run_micros);
            }
            target.radius = target.radius_at(run_micros);
            target.position = wall_to_world(target.wall_position, target.radius, room);
        }
    }

    /// Visible targets ordered by id
    pub fn snapshot(&self) -> Vec<TargetSnapshot> {
        let mut out: Vec<TargetSnapshot> = self
            .visible()
            .map(|t| TargetSnapshot {
                id: t.id,
                wall_position: t.wall_position,
                position: t.position,
                radius: t.radius,
                ghost: t.ghost,
            })
            .collect();
        out.sort_by_key(|s| s.id);
        out
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
    }

    /// Nearest visible target hit by the ray, if any
    pub fn get_nearest_hit_target(&self, camera: Vec3, look: Vec3) -> Option<TargetId> {
        let mut best: Option<(TargetId, f32)> = None;
        for target in self.visible() {
            let hit = match target.pill_axis() {
                Some((a, b)) => ray_capsule(camera, look, a, b, target.radius),
                None => ray_sphere(camera, look, target.position, target.radius),
            };
            if let Some(hit) = hit {
                if hit.distance > 0.0 && best.is_none_or(|(_, d)| hit.distance < d) {
                    best = Some((target.id, hit.distance));
                }
            }
        }
        best.map(|(id, _)| id)
    }
}
