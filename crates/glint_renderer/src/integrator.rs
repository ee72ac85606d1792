//! Path integrator.
//!
//! Ambient + emissive + mirror-bounce model, iterated rather than recursed.
//! Each hit spawns at most one reflection, so the pending work is a single
//! `Option<PathSegment>` instead of a heap stack.

use crate::{bvh::Bvh, renderer::Color};
use glint_math::{reflect, Ray};
use rand::RngCore;

/// Uniform ambient light reflected by every surface, per channel.
pub const AMBIENT_LIGHT: f32 = 0.1;

/// Energy kept per bounce.
pub const BOUNCE_DECAY: f32 = 0.9;

/// Bounce budget while the session is still in its first frames.
pub const EARLY_BOUNCES: u32 = 4;

/// Bounce budget once enough frames have accumulated.
pub const LATE_BOUNCES: u32 = 8;

/// Frames that use `EARLY_BOUNCES`.
pub const EARLY_FRAMES: u32 = 10;

/// A ray waiting to be traced.
#[derive(Debug, Clone, Copy)]
struct PathSegment {
    ray: Ray,
    bounces_left: u32,
    contribution: f32,
}

/// Bounce budget for a given session frame index.
///
/// Cheap early frames, deeper paths once the image has settled.
#[inline]
pub fn bounce_depth(frame: u32) -> u32 {
    if frame < EARLY_FRAMES {
        EARLY_BOUNCES
    } else {
        LATE_BOUNCES
    }
}

/// Compute the radiance seen along `ray`.
///
/// Every hit adds `emission * contribution` plus
/// `reflectivity * AMBIENT_LIGHT * contribution`. While budget remains, a
/// single mirror reflection about the (perturbed) normal is pushed with the
/// contribution decayed by `BOUNCE_DECAY`. Rays that escape add nothing.
pub fn trace(ray: Ray, max_bounces: u32, bvh: &Bvh, rng: &mut dyn RngCore) -> Color {
    let ambient = Color::splat(AMBIENT_LIGHT);
    let mut color = Color::ZERO;
    let mut pending = Some(PathSegment {
        ray,
        bounces_left: max_bounces,
        contribution: 1.0,
    });

    while let Some(segment) = pending.take() {
        let Some(hit) = bvh.intersect(&segment.ray, rng) else {
            continue;
        };

        let object = hit.object;
        color += object.emission * segment.contribution
            + object.reflectivity * ambient * segment.contribution;

        if segment.bounces_left > 0 {
            pending = Some(PathSegment {
                ray: Ray::new(hit.point, reflect(segment.ray.direction, hit.normal)),
                bounces_left: segment.bounces_left - 1,
                contribution: segment.contribution * BOUNCE_DECAY,
            });
        }
    }

    color
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::Sphere;
    use glint_math::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_emissive_hit_without_bounces() {
        let bvh = Bvh::build(&[Sphere::new(Vec3::ZERO, 5.0)
            .with_emission(Vec3::splat(10.0))
            .with_reflectivity(Vec3::new(1.0, 0.5, 0.0))])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let ray = Ray::new(Vec3::new(0.0, 0.0, -20.0), Vec3::Z);
        let color = trace(ray, 0, &bvh, &mut rng);

        assert!((color - Vec3::new(10.1, 10.05, 10.0)).length() < 1e-4);
    }

    #[test]
    fn test_escaping_ray_is_black() {
        let bvh = Bvh::build(&[Sphere::new(Vec3::new(0.0, 0.0, 10.0), 1.0)
            .with_emission(Vec3::ONE)])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        assert_eq!(trace(Ray::new(Vec3::ZERO, -Vec3::Z), 8, &bvh, &mut rng), Color::ZERO);
        assert_eq!(trace(Ray::new(Vec3::ZERO, Vec3::ZERO), 8, &bvh, &mut rng), Color::ZERO);
    }

    #[test]
    fn test_single_sphere_reflects_away() {
        // Head-on mirror bounce goes straight back out of the scene
        let bvh = Bvh::build(&[Sphere::new(Vec3::new(0.0, 0.0, 10.0), 2.0)
            .with_emission(Vec3::splat(2.0))])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let color = trace(Ray::new(Vec3::ZERO, Vec3::Z), 8, &bvh, &mut rng);
        assert!((color - Vec3::splat(2.0)).length() < 1e-5);
    }

    #[test]
    fn test_facing_mirrors_decay_per_bounce() {
        let bvh = Bvh::build(&[
            Sphere::new(Vec3::new(0.0, 0.0, 10.0), 2.0).with_reflectivity(Vec3::ONE),
            Sphere::new(Vec3::new(0.0, 0.0, -10.0), 2.0).with_reflectivity(Vec3::ONE),
        ])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        // One primary hit plus three bounces between the two spheres
        let color = trace(Ray::new(Vec3::ZERO, Vec3::Z), 3, &bvh, &mut rng);
        let expected = AMBIENT_LIGHT * (1.0 + 0.9 + 0.81 + 0.729);
        assert!((color - Vec3::splat(expected)).length() < 1e-5);
    }

    #[test]
    fn test_bounce_budget_stops_the_path() {
        // Facing mirrors would bounce forever; the budget cuts it to 1 + 8 hits
        let bvh = Bvh::build(&[
            Sphere::new(Vec3::new(0.0, 0.0, 10.0), 2.0).with_reflectivity(Vec3::ONE),
            Sphere::new(Vec3::new(0.0, 0.0, -10.0), 2.0).with_reflectivity(Vec3::ONE),
        ])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let color = trace(Ray::new(Vec3::ZERO, Vec3::Z), LATE_BOUNCES, &bvh, &mut rng);
        let expected: f32 = (0..=LATE_BOUNCES)
            .map(|k| AMBIENT_LIGHT * BOUNCE_DECAY.powi(k as i32))
            .sum();
        assert!((color - Vec3::splat(expected)).length() < 1e-4);
    }

    #[test]
    fn test_bounce_depth_schedule() {
        assert_eq!(bounce_depth(0), 4);
        assert_eq!(bounce_depth(9), 4);
        assert_eq!(bounce_depth(10), 8);
        assert_eq!(bounce_depth(499), 8);
    }
}
