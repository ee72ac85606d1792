use crate::{Ray, Vec3};

/// Axis-Aligned Bounding Box for the BVH.
///
/// `Aabb::EMPTY` plays the role of the null box: it has inverted infinite
/// bounds, so a union with it yields the other box unchanged.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// The null box (contains nothing).
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create an AABB from two arbitrary corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Cube centered on `center` extending `half_extent` along every axis.
    pub fn around(center: Vec3, half_extent: f32) -> Self {
        let r = Vec3::splat(half_extent);
        Self {
            min: center - r,
            max: center + r,
        }
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            min: box0.min.min(box1.min),
            max: box0.max.max(box1.max),
        }
    }

    /// True for the null box (or any inverted box).
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// True if `other` lies entirely inside this box (boundaries included).
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.cmple(other.min).all() && self.max.cmpge(other.max).all()
    }

    /// Test if a ray intersects this AABB.
    ///
    /// Slab method on the reciprocal direction. Zero direction components
    /// divide to ±infinity and fall out of the min/max chains. A hit needs
    /// `tmax >= tmin` and the box must not lie entirely behind the origin.
    pub fn hit(&self, ray: &Ray) -> bool {
        let inv = ray.inv_direction();
        let t1 = (self.min - ray.origin) * inv;
        let t2 = (self.max - ray.origin) * inv;

        let near = t1.min(t2);
        let far = t1.max(t2);

        let tmin = near.x.max(near.y).max(near.z);
        let tmax = far.x.min(far.y).min(far.z);

        tmax >= tmin && tmax > 0.0
    }
}
