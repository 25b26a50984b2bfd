//! Static reference world
//!
//! A fixed set of colliders with brute-force queries. Good enough to drive
//! scenarios and tests deterministically; hosts with a real physics engine
//! implement [`SpatialQuery`] and forward their own trigger events instead.

use std::collections::BTreeMap;

use nalgebra::Vector3;

use crate::collider::{Collider, ColliderId, LayerMask, OrientedBox};
use crate::query::{RaycastHit, SpatialQuery, TriggerEvent};

#[derive(Debug, Clone, Default)]
pub struct StaticWorld {
    colliders: BTreeMap<ColliderId, Collider>,
}

impl StaticWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_colliders(colliders: impl IntoIterator<Item = Collider>) -> Self {
        let mut world = Self::new();
        for collider in colliders {
            world.insert(collider);
        }
        world
    }

    /// Insert or replace by id. Returns the previous collider with that id.
    pub fn insert(&mut self, collider: Collider) -> Option<Collider> {
        self.colliders.insert(collider.id, collider)
    }

    pub fn remove(&mut self, id: ColliderId) -> Option<Collider> {
        self.colliders.remove(&id)
    }

    pub fn get(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(&id)
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    pub fn colliders(&self) -> impl Iterator<Item = &Collider> {
        self.colliders.values()
    }

    /// Ids of colliders touching `volume`, ascending.
    pub fn overlapping(&self, volume: &OrientedBox) -> Vec<ColliderId> {
        self.colliders.values().filter(|c| c.intersects_box(volume)).map(|c| c.id).collect()
    }
}

impl SpatialQuery for StaticWorld {
    fn raycast(
        &self,
        origin: &Vector3<f32>,
        direction: &Vector3<f32>,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RaycastHit> {
        self.colliders
            .values()
            .filter(|c| mask.contains(c.layer))
            .filter_map(|c| c.raycast(origin, direction, max_distance))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

/// Turns per-frame overlap sets into enter/stay/exit transitions.
#[derive(Debug, Clone, Default)]
pub struct TriggerTracker {
    inside: BTreeMap<ColliderId, Collider>,
}

impl TriggerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_inside(&self, id: ColliderId) -> bool {
        self.inside.contains_key(&id)
    }

    /// Exits first, then enters and stays interleaved in ascending id order.
    pub fn update(&mut self, world: &StaticWorld, volume: &OrientedBox) -> Vec<TriggerEvent> {
        let current: BTreeMap<ColliderId, Collider> = world
            .overlapping(volume)
            .into_iter()
            .filter_map(|id| world.get(id).map(|c| (id, *c)))
            .collect();

        let mut events: Vec<TriggerEvent> = self
            .inside
            .iter()
            .filter(|(id, _)| !current.contains_key(id))
            .map(|(_, collider)| TriggerEvent::exit(*collider))
            .collect();

        for (id, collider) in &current {
            if self.inside.contains_key(id) {
                events.push(TriggerEvent::stay(*collider));
            } else {
                events.push(TriggerEvent::enter(*collider));
            }
        }

        self.inside = current;
        events
    }

    pub fn clear(&mut self) {
        self.inside.clear();
    }
}
