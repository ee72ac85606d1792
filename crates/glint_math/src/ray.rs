use crate::Vec3;

/// A ray in 3D space with an origin and a direction.
///
/// Camera and bounce rays are normalized; the intersection routines rely on
/// that for distances. A zero direction is allowed and simply hits nothing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Componentwise reciprocal of the direction, used by the slab test.
    ///
    /// Zero components produce infinities on purpose.
    #[inline]
    pub fn inv_direction(&self) -> Vec3 {
        Vec3::ONE / self.direction
    }
}
