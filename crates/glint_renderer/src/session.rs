//! Progressive render session.
//!
//! Owns the scene, its BVH and the pixel buffers. `render_frame` is a
//! single-shot step: the host decides when to call it again. Every scene or
//! quality edit goes through `rebuild_and_reset`, and since all of them take
//! `&mut self` no edit can land while a frame is in progress.

use std::time::{Duration, Instant};

use glint_core::{Scene, SceneError, SceneResult, Sphere};
use glint_math::Vec3;

use crate::buffer::FrameBuffer;
use crate::bvh::Bvh;
use crate::camera::Camera;
use crate::denoise::{self, variance_map};
use crate::renderer::{validate_quality, RenderConfig};
use crate::sampler::{Accumulator, FrameContext};

/// Timing and work counters for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Index of the frame these stats describe
    pub frame: u32,
    pub pixels_sampled: usize,
    pub samples_cast: u64,
    pub fireflies_removed: usize,
    pub duration: Duration,
}

/// What the host gets back from `render_frame`.
#[derive(Debug)]
pub struct FrameOutput<'a> {
    /// Display buffer, row-major, 3 floats per pixel in [0, 1]
    pub pixels: &'a [f32],
    /// True once the sample budget is reached
    pub converged: bool,
    /// Frames completed so far
    pub current_sample: u32,
    /// `None` when the call did no work (already converged)
    pub stats: Option<FrameStats>,
}

/// A scene being progressively rendered.
pub struct RenderSession {
    scene: Scene,
    bvh: Bvh,
    camera: Camera,
    config: RenderConfig,
    accumulator: Accumulator,
    display: FrameBuffer,
    current_sample: u32,
    started: Instant,
}

impl RenderSession {
    /// Create a session and build the BVH for `scene`.
    pub fn new(scene: Scene, config: RenderConfig) -> SceneResult<Self> {
        config.validate()?;
        let bvh = Bvh::build(scene.objects())?;
        let camera = Camera::new()
            .with_resolution(config.width, config.height)
            .with_focal_length(config.focal_length);

        log::info!(
            "Render session: {}x{}, {} objects, {} BVH nodes",
            config.width,
            config.height,
            scene.len(),
            bvh.nodes().len()
        );

        Ok(Self {
            accumulator: Accumulator::new(config.width, config.height),
            display: FrameBuffer::new(config.width, config.height),
            scene,
            bvh,
            camera,
            config,
            current_sample: 0,
            started: Instant::now(),
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn display(&self) -> &FrameBuffer {
        &self.display
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    /// Frames completed since the last reset.
    pub fn current_sample(&self) -> u32 {
        self.current_sample
    }

    pub fn is_converged(&self) -> bool {
        self.current_sample >= self.config.max_samples
    }

    /// Time since the last reset.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Append a sphere and restart accumulation. Returns its index.
    pub fn add_object(&mut self, sphere: Sphere) -> SceneResult<usize> {
        let index = rejected(self.scene.add(sphere))?;
        self.rebuild_and_reset()?;
        Ok(index)
    }

    /// Remove a sphere and restart accumulation.
    ///
    /// Fails with `IndexOutOfRange` for a bad index or when only one
    /// object is left; the scene is unchanged in that case.
    pub fn remove_object(&mut self, index: usize) -> SceneResult<Sphere> {
        let removed = rejected(self.scene.remove(index))?;
        self.rebuild_and_reset()?;
        Ok(removed)
    }

    /// Move a sphere and restart accumulation.
    ///
    /// Callers dragging objects should coalesce bursts of moves themselves.
    pub fn move_object(&mut self, index: usize, position: Vec3) -> SceneResult<()> {
        rejected(self.scene.move_object(index, position))?;
        self.rebuild_and_reset()
    }

    /// Move the scene light and restart accumulation.
    pub fn move_light(&mut self, position: Vec3) -> SceneResult<()> {
        let index = rejected(self.scene.light_index().ok_or(SceneError::IndexOutOfRange {
            index: self.scene.len(),
            len: self.scene.len(),
        }))?;
        self.move_object(index, position)
    }

    /// Update the sample budget and base samples per frame, then restart.
    pub fn set_quality(&mut self, max_samples: u32, samples_per_frame: u32) -> SceneResult<()> {
        rejected(validate_quality(max_samples, samples_per_frame))?;
        self.config.max_samples = max_samples;
        self.config.samples_per_frame = samples_per_frame;
        self.rebuild_and_reset()
    }

    /// Rebuild the BVH from the current scene and zero all render state.
    pub fn rebuild_and_reset(&mut self) -> SceneResult<()> {
        self.bvh = Bvh::build(self.scene.objects())?;
        self.accumulator.reset();
        self.display.clear();
        self.current_sample = 0;
        self.started = Instant::now();

        log::info!(
            "Rebuilt BVH: {} objects, {} nodes, depth {}; accumulation reset",
            self.scene.len(),
            self.bvh.nodes().len(),
            self.bvh.depth()
        );
        Ok(())
    }

    /// Advance one progressive frame.
    ///
    /// Computes the variance map, samples every unconverged pixel,
    /// denoises, and bumps the frame counter. Once the budget is reached
    /// this is a no-op returning the unchanged buffer.
    pub fn render_frame(&mut self) -> FrameOutput<'_> {
        if self.is_converged() {
            return FrameOutput {
                pixels: self.display.as_slice(),
                converged: true,
                current_sample: self.current_sample,
                stats: None,
            };
        }

        let frame_start = Instant::now();
        let frame = self.current_sample;

        let variance = variance_map(&self.display);
        let ctx = FrameContext {
            bvh: &self.bvh,
            camera: &self.camera,
            config: &self.config,
            frame,
        };
        let tally = self.accumulator.sample_frame(&mut self.display, &variance, &ctx);
        let fireflies_removed = denoise::apply(&self.config.denoise, &mut self.display, frame);

        self.current_sample += 1;

        let stats = FrameStats {
            frame,
            pixels_sampled: tally.pixels_sampled,
            samples_cast: tally.samples_cast,
            fireflies_removed,
            duration: frame_start.elapsed(),
        };
        log::debug!(
            "Frame {}: {:.2} ms, {} pixels, {} samples, {} fireflies",
            self.current_sample,
            stats.duration.as_secs_f64() * 1000.0,
            stats.pixels_sampled,
            stats.samples_cast,
            stats.fireflies_removed
        );

        let converged = self.is_converged();
        if converged {
            log::info!(
                "Rendering complete. Total time: {}",
                format_duration(self.elapsed())
            );
        }

        FrameOutput {
            pixels: self.display.as_slice(),
            converged,
            current_sample: self.current_sample,
            stats: Some(stats),
        }
    }
}

/// Log and pass through a rejected edit.
fn rejected<T>(result: SceneResult<T>) -> SceneResult<T> {
    if let Err(err) = &result {
        log::warn!("Scene edit rejected: {}", err);
    }
    result
}

/// Format as `Hh Mm Ss`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{}h {}m {}s", total / 3600, (total % 3600) / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::denoise::DenoiseConfig;

    fn small_config() -> RenderConfig {
        RenderConfig::default()
            .with_resolution(10, 8)
            .with_quality(3, 1)
    }

    fn wall_scene() -> Scene {
        Scene::from_objects(vec![Sphere::new(Vec3::new(0.0, 0.0, 60.0), 30.0)
            .with_emission(Vec3::splat(0.5))])
        .unwrap()
    }

    #[test]
    fn test_empty_scene_is_invalid() {
        let result = RenderSession::new(Scene::new(), small_config());
        assert!(matches!(result, Err(SceneError::InvalidScene(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = RenderSession::new(Scene::showcase(), small_config().with_resolution(0, 0));
        assert!(matches!(result, Err(SceneError::InvalidParameter(_))));
    }

    #[test]
    fn test_converges_and_stays_converged() {
        let mut session = RenderSession::new(Scene::showcase(), small_config()).unwrap();

        for i in 1..=3 {
            let out = session.render_frame();
            assert_eq!(out.current_sample, i);
            assert_eq!(out.converged, i == 3);
            assert!(out.stats.is_some());
        }

        let snapshot = session.display().clone();
        for _ in 0..3 {
            let out = session.render_frame();
            assert!(out.converged);
            assert!(out.stats.is_none());
            assert_eq!(out.current_sample, 3);
            assert_eq!(out.pixels, snapshot.as_slice());
        }
    }

    #[test]
    fn test_display_stays_in_range() {
        let mut session = RenderSession::new(Scene::showcase(), small_config()).unwrap();
        while !session.render_frame().converged {}

        for &v in session.display().as_slice() {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_uniform_wall_converges_to_radiance() {
        let config = small_config().with_quality(6, 1);
        let mut session = RenderSession::new(wall_scene(), config).unwrap();
        while !session.render_frame().converged {}

        // Bilateral and firefly passes leave a flat image alone
        for &v in session.display().as_slice() {
            assert!((v - 1.0 / 3.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_remove_last_object_fails() {
        let mut session = RenderSession::new(wall_scene(), small_config()).unwrap();
        session.render_frame();

        let err = session.remove_object(0).unwrap_err();
        assert_eq!(err, SceneError::IndexOutOfRange { index: 0, len: 1 });
        assert_eq!(session.scene().len(), 1);
        // A rejected edit does not reset accumulation
        assert_eq!(session.current_sample(), 1);
    }

    #[test]
    fn test_mutations_reset_accumulation() {
        let mut session = RenderSession::new(Scene::showcase(), small_config()).unwrap();
        session.render_frame();
        session.render_frame();

        session.move_object(2, Vec3::new(10.0, 0.0, 25.0)).unwrap();
        assert_eq!(session.current_sample(), 0);
        assert!(session.display().as_slice().iter().all(|&v| v == 0.0));
        assert!(session.accumulator().sums().as_slice().iter().all(|&v| v == 0.0));

        session.render_frame();
        let index = session
            .add_object(Sphere::new(Vec3::new(0.0, -10.0, 30.0), 2.0))
            .unwrap();
        assert_eq!(index, 5);
        assert_eq!(session.bvh().objects().len(), 6);
        assert_eq!(session.current_sample(), 0);

        session.render_frame();
        let removed = session.remove_object(index).unwrap();
        assert_eq!(removed.radius, 2.0);
        assert_eq!(session.bvh().objects().len(), 5);
        assert_eq!(session.current_sample(), 0);
    }

    #[test]
    fn test_move_light() {
        let mut session = RenderSession::new(Scene::showcase(), small_config()).unwrap();
        session.move_light(Vec3::new(10.0, -30.0, 35.0)).unwrap();
        let light = session.scene().get(1).unwrap();
        assert!(light.is_light());
        assert_eq!(light.position, Vec3::new(10.0, -30.0, 35.0));
        assert!(matches!(
            session.scene().get(5),
            Err(SceneError::IndexOutOfRange { index: 5, len: 5 })
        ));

        let mut dark = RenderSession::new(
            Scene::from_objects(vec![Sphere::new(Vec3::new(0.0, 0.0, 20.0), 1.0)]).unwrap(),
            small_config(),
        )
        .unwrap();
        assert!(matches!(
            dark.move_light(Vec3::ZERO),
            Err(SceneError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_set_quality() {
        let mut session = RenderSession::new(Scene::showcase(), small_config()).unwrap();
        while !session.render_frame().converged {}

        session.set_quality(5, 2).unwrap();
        assert_eq!(session.config().max_samples, 5);
        assert_eq!(session.config().samples_per_frame, 2);
        assert_eq!(session.current_sample(), 0);
        assert!(!session.render_frame().converged);

        assert!(matches!(
            session.set_quality(0, 2),
            Err(SceneError::InvalidParameter(_))
        ));
        assert_eq!(session.config().max_samples, 5);
    }

    #[test]
    fn test_same_seed_same_image() {
        let config = small_config().with_denoise(DenoiseConfig::default());
        let mut a = RenderSession::new(Scene::showcase(), config.clone()).unwrap();
        let mut b = RenderSession::new(Scene::showcase(), config).unwrap();

        while !a.render_frame().converged {}
        while !b.render_frame().converged {}
        assert_eq!(a.display(), b.display());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
        assert_eq!(format_duration(Duration::from_millis(999)), "0h 0m 0s");
    }
}
