//! Pinhole camera for ray generation.

use crate::gen_f32;
use glint_math::{Ray, Vec3};
use rand::RngCore;

/// Sub-pixel jitter extent; keeps samples strictly inside the pixel cell.
const PIXEL_JITTER: f32 = 0.99;

/// Pinhole camera at the origin looking down +Z, with pixel-sized image plane units.
#[derive(Debug, Clone)]
pub struct Camera {
    pub image_width: u32,
    pub image_height: u32,
    focal_length: f32,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self {
            image_width: 250,
            image_height: 250,
            focal_length: 100.0,
        }
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Set distance to the image plane.
    pub fn with_focal_length(mut self, focal_length: f32) -> Self {
        self.focal_length = focal_length;
        self
    }

    /// Generate a normalized ray for pixel (i, j) with random jitter.
    pub fn get_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Ray {
        let (jx, jy) = sample_cell(rng);
        let x = i as f32 - self.image_width as f32 / 2.0 + jx;
        let y = j as f32 - self.image_height as f32 / 2.0 + jy;

        let direction = Vec3::new(x, y, self.focal_length).normalize_or_zero();
        Ray::new(Vec3::ZERO, direction)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Sample a random offset in [0, 0.99) x [0, 0.99).
fn sample_cell(rng: &mut dyn RngCore) -> (f32, f32) {
    (gen_f32(rng) * PIXEL_JITTER, gen_f32(rng) * PIXEL_JITTER)
}
