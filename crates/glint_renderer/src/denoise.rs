//! Image-space post-process: variance estimation, bilateral denoising and
//! firefly suppression.

use glint_core::{SceneError, SceneResult};
use rayon::prelude::*;

use crate::buffer::{pixel_offset, FrameBuffer};

/// One bilateral filter pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BilateralPass {
    /// Gaussian sigma on pixel distance
    pub spatial_sigma: f32,
    /// Gaussian sigma on RGB distance
    pub range_sigma: f32,
}

impl BilateralPass {
    pub const fn new(spatial_sigma: f32, range_sigma: f32) -> Self {
        Self {
            spatial_sigma,
            range_sigma,
        }
    }

    /// Neighborhood radius, `ceil(3 * spatial_sigma)`.
    pub fn radius(&self) -> i32 {
        (self.spatial_sigma * 3.0).ceil() as i32
    }
}

/// Post-process settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DenoiseConfig {
    /// Bilateral passes, applied in order
    pub bilateral_passes: Vec<BilateralPass>,
    /// Bilateral filtering starts once the frame index exceeds this
    pub min_frames: u32,
    /// Whether to run the firefly pass
    pub firefly_suppression: bool,
    /// A channel brighter than this multiple of its 4-neighbor mean is an outlier
    pub firefly_threshold: f32,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            bilateral_passes: vec![BilateralPass::new(2.5, 0.1), BilateralPass::new(1.5, 0.2)],
            min_frames: 1,
            firefly_suppression: true,
            firefly_threshold: 5.0,
        }
    }
}

impl DenoiseConfig {
    /// No post-processing at all.
    pub fn disabled() -> Self {
        Self {
            bilateral_passes: Vec::new(),
            min_frames: 0,
            firefly_suppression: false,
            firefly_threshold: 5.0,
        }
    }

    pub fn validate(&self) -> SceneResult<()> {
        for pass in &self.bilateral_passes {
            let valid = |s: f32| s.is_finite() && s > 0.0;
            if !(valid(pass.spatial_sigma) && valid(pass.range_sigma)) {
                return Err(SceneError::InvalidParameter(format!(
                    "bilateral sigmas must be positive, got {:?}",
                    pass
                )));
            }
        }
        if !(self.firefly_threshold.is_finite() && self.firefly_threshold > 0.0) {
            return Err(SceneError::InvalidParameter(format!(
                "firefly threshold must be positive, got {}",
                self.firefly_threshold
            )));
        }
        Ok(())
    }
}

/// Per-pixel spread of the three channels around their mean.
///
/// A cheap chroma-variance proxy over the display buffer, one float per pixel.
pub fn variance_map(buffer: &FrameBuffer) -> Vec<f32> {
    buffer
        .as_slice()
        .chunks_exact(3)
        .map(|px| {
            let mean = (px[0] + px[1] + px[2]) / 3.0;
            ((px[0] - mean).powi(2) + (px[1] - mean).powi(2) + (px[2] - mean).powi(2)) / 3.0
        })
        .collect()
}

/// Edge-preserving smoothing.
///
/// Each output pixel is the normalized sum of its neighbors within
/// `pass.radius()`, weighted by a Gaussian on pixel distance times a
/// Gaussian on RGB distance to the center. Rows run in parallel.
pub fn bilateral_filter(buffer: &FrameBuffer, pass: BilateralPass) -> FrameBuffer {
    let stride = buffer.width();
    let width = buffer.width() as i32;
    let height = buffer.height() as i32;
    let radius = pass.radius();
    let spatial_denom = 2.0 * pass.spatial_sigma * pass.spatial_sigma;
    let range_denom = 2.0 * pass.range_sigma * pass.range_sigma;
    let src = buffer.as_slice();

    let mut result = FrameBuffer::new(buffer.width(), buffer.height());
    let row_len = result.row_len();

    result
        .as_mut_slice()
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i32;
            for x in 0..width {
                let center = pixel_offset(stride, x as u32, y as u32) * 3;
                let (cr, cg, cb) = (src[center], src[center + 1], src[center + 2]);

                let mut sum = [0.0f32; 3];
                let mut total_weight = 0.0f32;

                for ny in (y - radius).max(0)..(y + radius + 1).min(height) {
                    for nx in (x - radius).max(0)..(x + radius + 1).min(width) {
                        let i = pixel_offset(stride, nx as u32, ny as u32) * 3;

                        let spatial = (((nx - x).pow(2) + (ny - y).pow(2)) as f32) / spatial_denom;
                        let range = ((src[i] - cr).powi(2)
                            + (src[i + 1] - cg).powi(2)
                            + (src[i + 2] - cb).powi(2))
                            / range_denom;
                        let weight = (-spatial).exp() * (-range).exp();

                        sum[0] += src[i] * weight;
                        sum[1] += src[i + 1] * weight;
                        sum[2] += src[i + 2] * weight;
                        total_weight += weight;
                    }
                }

                let out = x as usize * 3;
                row[out] = sum[0] / total_weight;
                row[out + 1] = sum[1] / total_weight;
                row[out + 2] = sum[2] / total_weight;
            }
        });

    result
}

/// Replace isolated bright outliers with the mean of their 4 neighbors.
///
/// A pixel is an outlier when any channel exceeds `threshold` times the
/// mean of that channel over its up/down/left/right neighbors; all three
/// channels are then replaced. Runs in place in row-major order and never
/// touches the 1-pixel border. Returns the number of pixels replaced.
pub fn suppress_fireflies(buffer: &mut FrameBuffer, threshold: f32) -> usize {
    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    if width < 3 || height < 3 {
        return 0;
    }

    let data = buffer.as_mut_slice();

    let mut replaced = 0;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let idx = (y * width + x) * 3;
            let mut is_firefly = false;
            for c in 0..3 {
                if data[idx + c] > threshold * neighbor_mean(data, width, x, y, c) {
                    is_firefly = true;
                    break;
                }
            }

            if is_firefly {
                for c in 0..3 {
                    let mean = neighbor_mean(data, width, x, y, c);
                    data[idx + c] = mean;
                }
                replaced += 1;
            }
        }
    }
    replaced
}

/// Mean of channel `c` over the up/down/left/right neighbors of (x, y).
#[inline]
fn neighbor_mean(data: &[f32], width: usize, x: usize, y: usize, c: usize) -> f32 {
    let up = data[((y - 1) * width + x) * 3 + c];
    let down = data[((y + 1) * width + x) * 3 + c];
    let left = data[(y * width + x - 1) * 3 + c];
    let right = data[(y * width + x + 1) * 3 + c];
    (up + down + left + right) / 4.0
}

/// Run the configured post-process chain on the display buffer.
///
/// `frame` is the index of the frame just sampled. Returns the number of
/// fireflies removed.
pub fn apply(config: &DenoiseConfig, display: &mut FrameBuffer, frame: u32) -> usize {
    if frame > config.min_frames {
        for pass in &config.bilateral_passes {
            *display = bilateral_filter(display, *pass);
        }
    }

    if config.firefly_suppression {
        suppress_fireflies(display, config.firefly_threshold)
    } else {
        0
    }
}
