//! Glint Core - scene description for the progressive path tracer.
//!
//! This crate provides:
//!
//! - **Primitives**: `Sphere`, the only renderable object
//! - **Scene**: an ordered, validated collection of spheres that UI
//!   collaborators mutate between frames
//!
//! # Example
//!
//! ```
//! use glint_core::{Scene, Sphere};
//! use glint_math::Vec3;
//!
//! let mut scene = Scene::showcase();
//! scene.add(Sphere::new(Vec3::new(0.0, 0.0, 30.0), 2.0))?;
//! assert_eq!(scene.len(), 6);
//! # Ok::<(), glint_core::SceneError>(())
//! ```

pub mod scene;
pub mod sphere;

// Re-export commonly used types
pub use scene::{Scene, SceneError, SceneResult};
pub use sphere::Sphere;
