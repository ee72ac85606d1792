//! Progressive adaptive sampling into a running-mean accumulator.
//!
//! Rows are sampled in parallel with rayon. Each row draws from its own
//! `StdRng` seeded from (seed, frame, row), so a frame's output does not
//! depend on how rows are scheduled across threads.

use glint_math::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::buffer::{pixel_count, pixel_offset, FrameBuffer};
use crate::bvh::Bvh;
use crate::camera::Camera;
use crate::integrator::{bounce_depth, trace};
use crate::renderer::{display_color, AccumulationMode, RenderConfig};

/// Everything a frame reads but never writes.
#[derive(Clone, Copy)]
pub struct FrameContext<'a> {
    pub bvh: &'a Bvh,
    pub camera: &'a Camera,
    pub config: &'a RenderConfig,
    /// Index of the frame being sampled (0 for the first frame)
    pub frame: u32,
}

/// Work done by one call to `Accumulator::sample_frame`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleTally {
    pub pixels_sampled: usize,
    pub samples_cast: u64,
}

impl SampleTally {
    fn merge(self, other: SampleTally) -> SampleTally {
        SampleTally {
            pixels_sampled: self.pixels_sampled + other.pixels_sampled,
            samples_cast: self.samples_cast + other.samples_cast,
        }
    }
}

/// Samples to cast for a pixel this frame: `min(cap, ceil(base * (variance + 1)))`.
#[inline]
pub fn target_sample_count(base: u32, variance: f32, cap: u32) -> u32 {
    let wanted = (base as f32 * (variance + 1.0)).ceil();
    if wanted.is_nan() {
        return base.min(cap);
    }
    (wanted as u32).min(cap)
}

/// Seed for one row of one frame.
#[inline]
fn row_seed(seed: u64, frame: u32, row: usize) -> u64 {
    seed ^ (((frame as u64) << 32) | row as u64)
}

/// Running sums of every sample cast, plus per-pixel sample counts.
#[derive(Debug, Clone)]
pub struct Accumulator {
    sums: FrameBuffer,
    sample_counts: Vec<u32>,
}

impl Accumulator {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            sums: FrameBuffer::new(width, height),
            sample_counts: vec![0; pixel_count(width, height)],
        }
    }

    /// Zero all sums and counts.
    pub fn reset(&mut self) {
        self.sums.clear();
        self.sample_counts.fill(0);
    }

    /// Raw accumulated radiance.
    pub fn sums(&self) -> &FrameBuffer {
        &self.sums
    }

    /// Total samples cast for pixel (x, y) since the last reset.
    pub fn sample_count(&self, x: u32, y: u32) -> u32 {
        self.sample_counts[pixel_offset(self.sums.width(), x, y)]
    }

    /// Sample one frame and refresh the display buffer.
    ///
    /// Pixels whose brightest displayed channel is above the brightness
    /// threshold are skipped. Every other pixel gets
    /// `target_sample_count(samples_per_frame, variance)` jittered camera
    /// rays, and its display value becomes the tone-mapped running mean.
    pub fn sample_frame(
        &mut self,
        display: &mut FrameBuffer,
        variance: &[f32],
        ctx: &FrameContext<'_>,
    ) -> SampleTally {
        let width = self.sums.width() as usize;
        let row_len = self.sums.row_len();
        let config = ctx.config;
        let depth = bounce_depth(ctx.frame);

        self.sums
            .as_mut_slice()
            .par_chunks_mut(row_len)
            .zip(display.as_mut_slice().par_chunks_mut(row_len))
            .zip(self.sample_counts.par_chunks_mut(width))
            .zip(variance.par_chunks(width))
            .enumerate()
            .map(|(y, (((sums, shown), counts), row_variance))| {
                let mut rng = StdRng::seed_from_u64(row_seed(config.seed, ctx.frame, y));
                let mut tally = SampleTally::default();

                for x in 0..width {
                    let c = x * 3;
                    let brightest = shown[c].max(shown[c + 1]).max(shown[c + 2]);
                    if brightest > config.brightness_threshold {
                        continue;
                    }

                    let n = target_sample_count(
                        config.samples_per_frame,
                        row_variance[x],
                        config.max_samples_per_pixel,
                    );

                    let mut sum = Vec3::new(sums[c], sums[c + 1], sums[c + 2]);
                    for _ in 0..n {
                        let ray = ctx.camera.get_ray(x as u32, y as u32, &mut rng);
                        sum += trace(ray, depth, ctx.bvh, &mut rng);
                    }
                    sums[c] = sum.x;
                    sums[c + 1] = sum.y;
                    sums[c + 2] = sum.z;
                    counts[x] += n;

                    let divisor = match config.accumulation {
                        AccumulationMode::FrameCount => (ctx.frame + 1) as f32,
                        AccumulationMode::SampleCount => counts[x].max(1) as f32,
                    };
                    let color = display_color(sum / divisor);
                    shown[c] = color.x;
                    shown[c + 1] = color.y;
                    shown[c + 2] = color.z;

                    tally.pixels_sampled += 1;
                    tally.samples_cast += n as u64;
                }

                tally
            })
            .reduce(SampleTally::default, SampleTally::merge)
    }
}
