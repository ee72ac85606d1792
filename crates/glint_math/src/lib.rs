// Re-export glam for convenience
pub use glam::*;

// Glint math types
mod aabb;
mod ray;
pub use aabb::Aabb;
pub use ray::Ray;

/// Reflect a direction about a surface normal.
///
/// `n` is expected to be unit length; the result satisfies
/// `reflect(d, n).dot(n) == -d.dot(n)`.
#[inline]
pub fn reflect(d: Vec3, n: Vec3) -> Vec3 {
    d - n * (2.0 * d.dot(n))
}
