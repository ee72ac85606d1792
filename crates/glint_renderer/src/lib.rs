//! Glint Renderer - interactive progressive path tracing on the CPU.
//!
//! A median-split BVH over spheres, an explicit-stack bounce integrator,
//! variance-driven adaptive sampling into a running mean, and a bilateral
//! + firefly post-process that runs every frame.
//!
//! The host owns the loop: build a [`RenderSession`], call
//! [`RenderSession::render_frame`] until it reports convergence, and route
//! scene edits through the session so accumulation restarts.

mod buffer;
mod bvh;
mod camera;
mod denoise;
mod integrator;
mod intersect;
mod renderer;
mod sampler;
mod session;

pub use buffer::FrameBuffer;
pub use bvh::{Bvh, BvhNode, LEAF_MAX_SIZE};
pub use camera::Camera;
pub use denoise::{
    bilateral_filter, suppress_fireflies, variance_map, BilateralPass, DenoiseConfig,
};
pub use integrator::{bounce_depth, trace, AMBIENT_LIGHT, BOUNCE_DECAY};
pub use intersect::{intersect_objects, sphere_intersection, Hit};
pub use renderer::{
    color_to_rgba, display_color, tone_map, AccumulationMode, Color, RenderConfig,
};
pub use sampler::{target_sample_count, Accumulator, FrameContext, SampleTally};
pub use session::{format_duration, FrameOutput, FrameStats, RenderSession};

/// Re-export scene and math types
pub use glint_core::{Scene, SceneError, SceneResult, Sphere};
pub use glint_math::{Aabb, Ray, Vec3};

use rand::{Rng, RngCore};

/// Uniform random f32 in [0, 1).
#[inline]
pub(crate) fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen()
}
