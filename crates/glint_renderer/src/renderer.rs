//! Render configuration and color helpers shared by the progressive pipeline.

use glint_core::{SceneError, SceneResult};
use glint_math::Vec3;

use crate::denoise::DenoiseConfig;

/// Color type alias (linear RGB radiance)
pub type Color = Vec3;

/// How the running mean of a pixel is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccumulationMode {
    /// Divide the accumulated sum by the number of completed frames.
    ///
    /// Frames that cast more than one sample for a pixel are therefore
    /// weighted up; this matches the historical look of the renderer.
    #[default]
    FrameCount,
    /// Divide by the number of samples actually cast for the pixel.
    SampleCount,
}

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Pinhole distance to the image plane, in pixel units
    pub focal_length: f32,
    /// Frame budget; the session converges once this many frames ran
    pub max_samples: u32,
    /// Base number of samples per pixel per frame, scaled by variance
    pub samples_per_frame: u32,
    /// Hard cap on samples cast for one pixel in one frame
    pub max_samples_per_pixel: u32,
    /// Pixels whose brightest displayed channel exceeds this are skipped
    pub brightness_threshold: f32,
    /// Seed for every random stream of the session
    pub seed: u64,
    /// Running-mean normalization
    pub accumulation: AccumulationMode,
    /// Post-process settings
    pub denoise: DenoiseConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 250,
            height: 250,
            focal_length: 100.0,
            max_samples: 500,
            samples_per_frame: 2,
            max_samples_per_pixel: 1000,
            brightness_threshold: 0.95,
            seed: 0x5eed,
            accumulation: AccumulationMode::FrameCount,
            denoise: DenoiseConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set quality settings.
    pub fn with_quality(mut self, max_samples: u32, samples_per_frame: u32) -> Self {
        self.max_samples = max_samples;
        self.samples_per_frame = samples_per_frame;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the running-mean normalization.
    pub fn with_accumulation(mut self, mode: AccumulationMode) -> Self {
        self.accumulation = mode;
        self
    }

    /// Set post-process settings.
    pub fn with_denoise(mut self, denoise: DenoiseConfig) -> Self {
        self.denoise = denoise;
        self
    }

    /// Check every value the session depends on.
    pub fn validate(&self) -> SceneResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SceneError::InvalidParameter(format!(
                "resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.focal_length.is_finite() && self.focal_length > 0.0) {
            return Err(SceneError::InvalidParameter(format!(
                "focal length must be positive, got {}",
                self.focal_length
            )));
        }
        validate_quality(self.max_samples, self.samples_per_frame)?;
        if self.max_samples_per_pixel == 0 {
            return Err(SceneError::InvalidParameter(
                "max samples per pixel must be positive".to_string(),
            ));
        }
        if !self.brightness_threshold.is_finite() {
            return Err(SceneError::InvalidParameter(format!(
                "brightness threshold must be finite, got {}",
                self.brightness_threshold
            )));
        }
        self.denoise.validate()
    }
}

/// Both quality knobs must be positive.
pub(crate) fn validate_quality(max_samples: u32, samples_per_frame: u32) -> SceneResult<()> {
    if max_samples == 0 {
        return Err(SceneError::InvalidParameter(
            "max samples must be positive".to_string(),
        ));
    }
    if samples_per_frame == 0 {
        return Err(SceneError::InvalidParameter(
            "samples per frame must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Reinhard tone mapping, `c / (1 + c)` per channel.
#[inline]
pub fn tone_map(color: Color) -> Color {
    color / (Color::ONE + color)
}

/// Clamp a value to [0, 1], mapping NaN to 0.
#[inline]
pub fn clamp_01(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Turn a running-mean radiance into the value stored in the display buffer.
#[inline]
pub fn display_color(radiance: Color) -> Color {
    let mapped = tone_map(radiance);
    Color::new(clamp_01(mapped.x), clamp_01(mapped.y), clamp_01(mapped.z))
}

/// Convert a display color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let r = (255.0 * clamp_01(color.x)) as u8;
    let g = (255.0 * clamp_01(color.y)) as u8;
    let b = (255.0 * clamp_01(color.z)) as u8;
    [r, g, b, 255]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_map() {
        assert_eq!(tone_map(Color::ZERO), Color::ZERO);
        assert_eq!(tone_map(Color::ONE), Color::splat(0.5));
        let bright = tone_map(Color::splat(1000.0));
        assert!(bright.x < 1.0 && bright.x > 0.99);
    }

    #[test]
    fn test_display_color_sanitizes_nan() {
        let c = display_color(Color::new(f32::NAN, 1.0, 3.0));
        assert_eq!(c.x, 0.0);
        assert_eq!(c.y, 0.5);
        assert_eq!(c.z, 0.75);
    }

    #[test]
    fn test_color_to_rgba() {
        assert_eq!(color_to_rgba(Color::new(0.0, 1.0, 2.0)), [0, 255, 255, 255]);
        assert_eq!(color_to_rgba(Color::splat(0.5)), [127, 127, 127, 255]);
    }

    #[test]
    fn test_config_validate() {
        assert!(RenderConfig::default().validate().is_ok());

        let bad = [
            RenderConfig::default().with_resolution(0, 10),
            RenderConfig::default().with_quality(0, 2),
            RenderConfig::default().with_quality(10, 0),
            RenderConfig {
                focal_length: -1.0,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(matches!(
                config.validate(),
                Err(SceneError::InvalidParameter(_))
            ));
        }
    }
}
