//! Ray-sphere intersection and nearest-hit selection.

use crate::gen_f32;
use glint_core::Sphere;
use glint_math::{Ray, Vec3};
use rand::RngCore;

/// Record of a ray-object intersection.
#[derive(Debug, Clone, Copy)]
pub struct Hit<'a> {
    /// Distance along the ray
    pub distance: f32,
    /// Point of intersection
    pub point: Vec3,
    /// Outward normal perturbed by the object's roughness
    pub normal: Vec3,
    /// The object that was hit
    pub object: &'a Sphere,
}

/// Analytic ray-sphere test via the closest-approach point.
///
/// The sphere must lie ahead of the origin (positive projection of its
/// center onto the ray) and the center's perpendicular offset from the ray
/// must be smaller than the radius. Expects a normalized direction; a zero
/// direction never hits.
///
/// The returned normal is the outward normal plus a uniform random vector
/// in [-0.5, 0.5]^3 scaled by `roughness`, renormalized. It is drawn fresh
/// from `rng` on every call.
pub fn sphere_intersection<'a>(
    ray: &Ray,
    sphere: &'a Sphere,
    rng: &mut dyn RngCore,
) -> Option<Hit<'a>> {
    let to_center = sphere.position - ray.origin;
    let along = to_center.dot(ray.direction);
    let offset = (to_center.length_squared() - along * along).max(0.0).sqrt();

    if !(along > 0.0 && offset < sphere.radius) {
        return None;
    }

    let half_chord = (sphere.radius * sphere.radius - offset * offset).abs().sqrt();
    let distance = along - half_chord;
    let point = ray.at(distance);

    let outward = (point - sphere.position).normalize_or_zero();
    let jitter = Vec3::new(gen_f32(rng) - 0.5, gen_f32(rng) - 0.5, gen_f32(rng) - 0.5);
    let normal = (outward + jitter * sphere.roughness).normalize_or_zero();

    Some(Hit {
        distance,
        point,
        normal,
        object: sphere,
    })
}

/// Linear scan for the nearest hit among `objects`.
///
/// Ties keep the first object in iteration order.
pub fn intersect_objects<'a>(
    ray: &Ray,
    objects: &'a [Sphere],
    rng: &mut dyn RngCore,
) -> Option<Hit<'a>> {
    let mut closest: Option<Hit<'a>> = None;

    for object in objects {
        if let Some(hit) = sphere_intersection(ray, object, rng) {
            if closest.map_or(true, |c| hit.distance < c.distance) {
                closest = Some(hit);
            }
        }
    }

    closest
}

/// Pick the closer of two optional hits; a missing hit counts as infinitely far.
///
/// Ties keep `a`.
#[inline]
pub fn nearer<'a>(a: Option<Hit<'a>>, b: Option<Hit<'a>>) -> Option<Hit<'a>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if b.distance < a.distance { b } else { a }),
        (a, None) => a,
        (None, b) => b,
    }
}
