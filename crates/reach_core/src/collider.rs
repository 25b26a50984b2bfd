//! Collision geometry
//!
//! Only the queries the interaction controller needs: closest point, ray entry
//! and box overlap. Shapes are convex and posed by a [`Transform`].

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::math::{Transform, EPS};
use crate::query::RaycastHit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColliderId(pub u32);

/// Layer index (0..=31)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CollisionLayer(u8);

impl TryFrom<u8> for CollisionLayer {
    type Error = String;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        CollisionLayer::new(index).ok_or_else(|| format!("layer {} out of range 0..=31", index))
    }
}

impl From<CollisionLayer> for u8 {
    fn from(layer: CollisionLayer) -> Self {
        layer.0
    }
}

impl CollisionLayer {
    pub const DEFAULT: CollisionLayer = CollisionLayer(0);

    pub fn new(index: u8) -> Option<Self> {
        (index < 32).then_some(Self(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn mask(self) -> LayerMask {
        LayerMask::from_layer(self)
    }
}

impl Default for CollisionLayer {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Bit set of layers a query accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    pub const NONE: LayerMask = LayerMask(0);

    pub fn from_layer(layer: CollisionLayer) -> Self {
        Self(1u32 << layer.0)
    }

    pub fn with(self, layer: CollisionLayer) -> Self {
        Self(self.0 | (1u32 << layer.0))
    }

    pub fn contains(self, layer: CollisionLayer) -> bool {
        self.0 & (1u32 << layer.0) != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColliderShape {
    Sphere { radius: f32 },
    Cuboid { half_extents: Vector3<f32> },
}

/// A collider in the world, identified by `id`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub id: ColliderId,
    pub shape: ColliderShape,
    pub transform: Transform,
    #[serde(default)]
    pub layer: CollisionLayer,
}

impl Collider {
    pub fn sphere(id: ColliderId, center: Vector3<f32>, radius: f32) -> Self {
        Self {
            id,
            shape: ColliderShape::Sphere { radius },
            transform: Transform::from_position(center),
            layer: CollisionLayer::DEFAULT,
        }
    }

    pub fn cuboid(id: ColliderId, transform: Transform, half_extents: Vector3<f32>) -> Self {
        Self {
            id,
            shape: ColliderShape::Cuboid { half_extents },
            transform,
            layer: CollisionLayer::DEFAULT,
        }
    }

    pub fn with_layer(mut self, layer: CollisionLayer) -> Self {
        self.layer = layer;
        self
    }

    pub fn center(&self) -> Vector3<f32> {
        self.transform.position
    }

    /// Closest point on the collider to `point`; `point` itself when inside.
    pub fn closest_point(&self, point: &Vector3<f32>) -> Vector3<f32> {
        match self.shape {
            ColliderShape::Sphere { radius } => {
                let offset = point - self.center();
                let dist = offset.norm();
                if dist <= radius {
                    *point
                } else {
                    self.center() + offset * (radius / dist)
                }
            }
            ColliderShape::Cuboid { half_extents } => {
                OrientedBox::from_transform(&self.transform, half_extents).closest_point(point)
            }
        }
    }

    /// First entry along the ray. `direction` must be unit length.
    pub fn raycast(
        &self,
        origin: &Vector3<f32>,
        direction: &Vector3<f32>,
        max_distance: f32,
    ) -> Option<RaycastHit> {
        let (distance, normal) = match self.shape {
            ColliderShape::Sphere { radius } => {
                ray_sphere(origin, direction, &self.center(), radius, max_distance)?
            }
            ColliderShape::Cuboid { half_extents } => {
                OrientedBox::from_transform(&self.transform, half_extents).raycast(
                    origin,
                    direction,
                    max_distance,
                )?
            }
        };
        Some(RaycastHit { point: origin + direction * distance, normal, distance, collider: self.id })
    }

    pub fn intersects_box(&self, volume: &OrientedBox) -> bool {
        match self.shape {
            ColliderShape::Sphere { radius } => volume.intersects_sphere(&self.center(), radius),
            ColliderShape::Cuboid { half_extents } => {
                volume.intersects_box(&OrientedBox::from_transform(&self.transform, half_extents))
            }
        }
    }
}

fn ray_sphere(
    origin: &Vector3<f32>,
    direction: &Vector3<f32>,
    center: &Vector3<f32>,
    radius: f32,
    max_distance: f32,
) -> Option<(f32, Vector3<f32>)> {
    let m = origin - center;
    let b = m.dot(direction);
    let c = m.norm_squared() - radius * radius;
    // outside and pointing away
    if c > 0.0 && b > 0.0 {
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    if t < 0.0 || t > max_distance {
        return None;
    }
    let point = origin + direction * t;
    Some((t, (point - center) / radius))
}

/// Root-local capsule describing the character's body volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapsuleCollider {
    pub center: Vector3<f32>,
    pub height: f32,
    pub radius: f32,
}

impl CapsuleCollider {
    pub fn new(center: Vector3<f32>, height: f32, radius: f32) -> Self {
        Self { center, height, radius }
    }

    /// Arm span approximation used to size the detection volume.
    pub fn wingspan(&self) -> f32 {
        self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    pub center: Vector3<f32>,
    pub half_extents: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl OrientedBox {
    pub fn from_transform(transform: &Transform, half_extents: Vector3<f32>) -> Self {
        Self { center: transform.position, half_extents, rotation: transform.rotation }
    }

    fn axes(&self) -> [Vector3<f32>; 3] {
        [self.rotation * Vector3::x(), self.rotation * Vector3::y(), self.rotation * Vector3::z()]
    }

    fn to_local(&self, point: &Vector3<f32>) -> Vector3<f32> {
        self.rotation.inverse() * (point - self.center)
    }

    pub fn contains(&self, point: &Vector3<f32>) -> bool {
        let local = self.to_local(point);
        (0..3).all(|i| local[i].abs() <= self.half_extents[i])
    }

    pub fn closest_point(&self, point: &Vector3<f32>) -> Vector3<f32> {
        let local = self.to_local(point);
        let clamped = Vector3::new(
            local.x.clamp(-self.half_extents.x, self.half_extents.x),
            local.y.clamp(-self.half_extents.y, self.half_extents.y),
            local.z.clamp(-self.half_extents.z, self.half_extents.z),
        );
        self.rotation * clamped + self.center
    }

    pub fn intersects_sphere(&self, center: &Vector3<f32>, radius: f32) -> bool {
        (self.closest_point(center) - center).norm() <= radius
    }

    /// Separating-axis test over face normals and edge cross products.
    pub fn intersects_box(&self, other: &OrientedBox) -> bool {
        let a = self.axes();
        let b = other.axes();
        let offset = other.center - self.center;

        let mut candidates: Vec<Vector3<f32>> = Vec::with_capacity(15);
        candidates.extend_from_slice(&a);
        candidates.extend_from_slice(&b);
        for axis_a in &a {
            for axis_b in &b {
                candidates.push(axis_a.cross(axis_b));
            }
        }

        for axis in candidates {
            // parallel edges produce no axis
            if axis.norm_squared() < EPS {
                continue;
            }
            let radius_a: f32 =
                (0..3).map(|i| (self.half_extents[i] * a[i].dot(&axis)).abs()).sum();
            let radius_b: f32 =
                (0..3).map(|i| (other.half_extents[i] * b[i].dot(&axis)).abs()).sum();
            if offset.dot(&axis).abs() > radius_a + radius_b {
                return false;
            }
        }
        true
    }

    /// Slab test; returns entry distance and outward normal.
    pub fn raycast(
        &self,
        origin: &Vector3<f32>,
        direction: &Vector3<f32>,
        max_distance: f32,
    ) -> Option<(f32, Vector3<f32>)> {
        let o = self.to_local(origin);
        let d = self.rotation.inverse() * direction;

        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut enter_normal = Vector3::zeros();

        for i in 0..3 {
            let h = self.half_extents[i];
            if d[i].abs() < EPS {
                if o[i].abs() > h {
                    return None;
                }
                continue;
            }
            let mut t1 = (-h - o[i]) / d[i];
            let mut t2 = (h - o[i]) / d[i];
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            if t1 > t_enter {
                t_enter = t1;
                enter_normal = Vector3::zeros();
                enter_normal[i] = if d[i] > 0.0 { -1.0 } else { 1.0 };
            }
            t_exit = t_exit.min(t2);
            if t_enter > t_exit {
                return None;
            }
        }

        // starting inside, or the box is behind the origin
        if t_enter < 0.0 || t_enter > max_distance {
            return None;
        }
        Some((t_enter, self.rotation * enter_normal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall() -> Collider {
        // 2m wide, 2m tall, 0.2m thick wall whose near face sits at z = 1.0
        Collider::cuboid(
            ColliderId(1),
            Transform::from_position(Vector3::new(0.0, 1.0, 1.1)),
            Vector3::new(1.0, 1.0, 0.1),
        )
    }

    #[test]
    fn test_layer_mask() {
        let interactable = CollisionLayer::new(6).unwrap();
        let mask = interactable.mask();
        assert!(mask.contains(interactable));
        assert!(!mask.contains(CollisionLayer::DEFAULT));
        assert!(LayerMask::ALL.contains(CollisionLayer::DEFAULT));
        assert!(!LayerMask::NONE.contains(interactable));
        assert!(mask.with(CollisionLayer::DEFAULT).contains(CollisionLayer::DEFAULT));
        assert!(CollisionLayer::new(32).is_none());
    }

    #[test]
    fn test_sphere_closest_point() {
        let s = Collider::sphere(ColliderId(0), Vector3::new(0.0, 0.0, 0.0), 1.0);
        let p = s.closest_point(&Vector3::new(3.0, 0.0, 0.0));
        assert!((p - Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-5);

        let inside = Vector3::new(0.2, 0.1, 0.0);
        assert_eq!(s.closest_point(&inside), inside);
    }

    #[test]
    fn test_cuboid_closest_point() {
        let w = wall();
        let p = w.closest_point(&Vector3::new(0.3, 1.4, 0.0));
        assert!((p - Vector3::new(0.3, 1.4, 1.0)).norm() < 1e-5);

        // beyond the top edge clamps onto the edge
        let q = w.closest_point(&Vector3::new(0.0, 5.0, 0.0));
        assert!((q - Vector3::new(0.0, 2.0, 1.0)).norm() < 1e-5);
    }

    #[test]
    fn test_rotated_cuboid_closest_point() {
        let c = Collider::cuboid(
            ColliderId(2),
            Transform::from_position_yaw(Vector3::zeros(), 90.0),
            Vector3::new(2.0, 1.0, 0.5),
        );
        // after a 90° yaw the long axis runs along world z
        let p = c.closest_point(&Vector3::new(0.0, 0.0, 5.0));
        assert!((p - Vector3::new(0.0, 0.0, 2.0)).norm() < 1e-4);
    }

    #[test]
    fn test_cuboid_raycast_normal_faces_ray() {
        let w = wall();
        let hit = w.raycast(&Vector3::new(0.0, 1.4, 0.5), &Vector3::z(), 1.0).unwrap();
        assert!((hit.distance - 0.5).abs() < 1e-5);
        assert!((hit.normal - -Vector3::z()).norm() < 1e-5);
        assert!((hit.point - Vector3::new(0.0, 1.4, 1.0)).norm() < 1e-5);
        assert_eq!(hit.collider, ColliderId(1));
    }

    #[test]
    fn test_cuboid_raycast_limits() {
        let w = wall();
        // too short
        assert!(w.raycast(&Vector3::new(0.0, 1.4, 0.0), &Vector3::z(), 0.5).is_none());
        // pointing away
        assert!(w.raycast(&Vector3::new(0.0, 1.4, 0.5), &-Vector3::z(), 5.0).is_none());
        // starting inside
        assert!(w.raycast(&Vector3::new(0.0, 1.0, 1.1), &Vector3::z(), 5.0).is_none());
        // parallel and outside the slab
        assert!(w.raycast(&Vector3::new(0.0, 3.0, 0.0), &Vector3::z(), 5.0).is_none());
    }

    #[test]
    fn test_sphere_raycast() {
        let s = Collider::sphere(ColliderId(3), Vector3::new(0.0, 0.0, 2.0), 0.5);
        let hit = s.raycast(&Vector3::zeros(), &Vector3::z(), 5.0).unwrap();
        assert!((hit.distance - 1.5).abs() < 1e-5);
        assert!((hit.normal - -Vector3::z()).norm() < 1e-5);
        assert!(s.raycast(&Vector3::zeros(), &Vector3::x(), 5.0).is_none());
    }

    #[test]
    fn test_box_overlap() {
        let volume = OrientedBox {
            center: Vector3::new(0.0, 1.0, 0.5),
            half_extents: Vector3::new(0.9, 0.9, 0.9),
            rotation: UnitQuaternion::identity(),
        };
        assert!(wall().intersects_box(&volume));

        let far = Collider::cuboid(
            ColliderId(4),
            Transform::from_position(Vector3::new(0.0, 1.0, 5.0)),
            Vector3::new(1.0, 1.0, 0.1),
        );
        assert!(!far.intersects_box(&volume));

        let tilted = Collider::cuboid(
            ColliderId(5),
            Transform::from_position_yaw(Vector3::new(1.5, 1.0, 0.5), 45.0),
            Vector3::new(0.5, 0.5, 0.5),
        );
        // only the rotated corner (x ≈ 0.79) reaches inside the face at 0.9
        assert!(tilted.intersects_box(&volume));

        let sphere = Collider::sphere(ColliderId(6), Vector3::new(0.0, 1.0, 1.6), 0.25);
        assert!(sphere.intersects_box(&volume));
        let sphere_far = Collider::sphere(ColliderId(7), Vector3::new(0.0, 1.0, 1.8), 0.25);
        assert!(!sphere_far.intersects_box(&volume));
    }

    #[test]
    fn test_collider_serde_shape_tag() {
        let json = r#"{"id":9,"shape":{"type":"sphere","radius":0.5},
            "transform":{"position":[0.0,1.0,2.0],"rotation":[0.0,0.0,0.0,1.0]},"layer":6}"#;
        let c: Collider = serde_json::from_str(json).unwrap();
        assert_eq!(c.id, ColliderId(9));
        assert_eq!(c.layer.index(), 6);
        assert!(matches!(c.shape, ColliderShape::Sphere { radius } if radius == 0.5));

        let bad = json.replace("\"layer\":6", "\"layer\":40");
        assert!(serde_json::from_str::<Collider>(&bad).is_err());
    }
}
