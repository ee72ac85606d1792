//! Sphere primitive.

use glint_math::{Aabb, Vec3};

use crate::scene::{SceneError, SceneResult};

/// Bounding padding factor for emissive spheres (multiple of radius).
const EMISSIVE_PADDING: f32 = 2.0;

/// Bounding padding factor for every other sphere (multiple of radius).
const SURFACE_PADDING: f32 = 0.1;

/// A sphere with its simplified material.
#[derive(Clone, Debug, PartialEq)]
pub struct Sphere {
    /// Center of the sphere
    pub position: Vec3,

    /// Radius, must be > 0
    pub radius: f32,

    /// Emitted radiance per channel (>= 0)
    pub emission: Vec3,

    /// Per-channel attenuation of the ambient term, conventionally 0-1
    pub reflectivity: Vec3,

    /// Magnitude of the random normal perturbation (>= 0)
    pub roughness: f32,
}

impl Sphere {
    /// Create a non-emissive, non-reflective, perfectly smooth sphere.
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            radius,
            emission: Vec3::ZERO,
            reflectivity: Vec3::ZERO,
            roughness: 0.0,
        }
    }

    /// Set emitted radiance.
    pub fn with_emission(mut self, emission: Vec3) -> Self {
        self.emission = emission;
        self
    }

    /// Set per-channel reflectivity.
    pub fn with_reflectivity(mut self, reflectivity: Vec3) -> Self {
        self.reflectivity = reflectivity;
        self
    }

    /// Set surface roughness.
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    /// Check if this sphere emits light on any channel.
    pub fn is_emissive(&self) -> bool {
        self.emission.max_element() > 0.0
    }

    /// Check if UI collaborators treat this sphere as the scene light.
    pub fn is_light(&self) -> bool {
        self.emission.x > 0.0
    }

    /// Padded bounding box.
    ///
    /// Emissive spheres get a wide margin (2x radius) so the light can move
    /// and jitter without the BVH clipping it; others get 0.1x radius.
    pub fn bounding_box(&self) -> Aabb {
        let factor = if self.is_emissive() {
            EMISSIVE_PADDING
        } else {
            SURFACE_PADDING
        };
        Aabb::around(self.position, self.radius + self.radius * factor)
    }

    /// Reject geometry and material values the renderer cannot handle.
    pub fn validate(&self) -> SceneResult<()> {
        if !self.position.is_finite() {
            return Err(SceneError::InvalidParameter(format!(
                "sphere position must be finite, got {}",
                self.position
            )));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(SceneError::InvalidParameter(format!(
                "sphere radius must be positive, got {}",
                self.radius
            )));
        }
        if !(self.roughness.is_finite() && self.roughness >= 0.0) {
            return Err(SceneError::InvalidParameter(format!(
                "sphere roughness must be >= 0, got {}",
                self.roughness
            )));
        }
        if !self.emission.is_finite() || self.emission.min_element() < 0.0 {
            return Err(SceneError::InvalidParameter(format!(
                "sphere emission must be finite and >= 0, got {}",
                self.emission
            )));
        }
        if !self.reflectivity.is_finite() {
            return Err(SceneError::InvalidParameter(format!(
                "sphere reflectivity must be finite, got {}",
                self.reflectivity
            )));
        }
        Ok(())
    }
}
