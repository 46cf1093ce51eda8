use image::{imageops, GrayImage, Luma};
use ndarray::Array2;

use crate::math::stats::StatsHelper;
use crate::prelude::{
    ProcessingStage, ReconConfig, StageError, StageMetadata, StageOutput, StageResult,
};
use crate::telemetry::log::LogManager;

/// Gamma exponent applied to the windowed values; below one brightens
/// midtones.
const DISPLAY_GAMMA: f32 = 0.7;

const PERCENTILE_LOW: f32 = 0.5;
const PERCENTILE_HIGH: f32 = 99.5;

/// Contrast-windows, gamma-corrects, quantizes, and resizes the grid.
pub struct PostProcessStage {
    config: Option<ReconConfig>,
    logger: LogManager,
}

impl PostProcessStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::scoped("post-process"),
        }
    }
}

impl Default for PostProcessStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for PostProcessStage {
    type Input = Array2<f32>;
    type Payload = GrayImage;

    fn initialize(&mut self, config: &ReconConfig) -> StageResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: Self::Input) -> StageResult<StageOutput<Self::Payload>> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;

        let (rows, cols) = input.dim();
        if rows == 0 || cols == 0 {
            return Err(StageError::Shape("grid has an empty dimension".into()));
        }

        let values: Vec<f32> = input.iter().copied().collect();
        let p_low = StatsHelper::percentile(&values, PERCENTILE_LOW);
        let p_high = StatsHelper::percentile(&values, PERCENTILE_HIGH);

        let mut metadata = StageMetadata {
            percentile_window: Some((p_low, p_high)),
            ..Default::default()
        };

        let normalized = if p_high > p_low {
            input.mapv(|value| {
                ((value.clamp(p_low, p_high) - p_low) / (p_high - p_low)).powf(DISPLAY_GAMMA)
            })
        } else {
            // Collapsed contrast window: emit a blank image instead of
            // dividing by zero.
            self.logger
                .warn("contrast window collapsed, emitting blank image");
            metadata.degenerate_contrast = true;
            metadata
                .notes
                .push("degenerate contrast window".to_string());
            Array2::zeros((rows, cols))
        };

        let quantized = GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
            Luma([(normalized[[y as usize, x as usize]] * 255.0) as u8])
        });

        let native = rows;
        let target = config.output_size;
        let output = if target != native {
            self.logger
                .record(&format!("resizing {native}x{native} grid to {target}x{target}"));
            imageops::resize(
                &quantized,
                target as u32,
                target as u32,
                imageops::FilterType::Lanczos3,
            )
        } else {
            quantized
        };

        metadata.value_range = StatsHelper::min_max(values.iter());
        metadata.notes.push(format!(
            "window [{p_low:.6}, {p_high:.6}], gamma {DISPLAY_GAMMA}"
        ));

        Ok(StageOutput {
            payload: output,
            metadata,
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}

/// Diagnostic rendering of a filtered sinogram, independently min/max
/// normalized to the 8-bit range. Shares the filter kernel with the
/// reconstruction, not its contrast pipeline.
pub fn sinogram_view(data: &Array2<f32>) -> GrayImage {
    let (rows, cols) = data.dim();
    let span = StatsHelper::min_max(data.iter());
    match span {
        Some((lo, hi)) if hi > lo => GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
            let value = (data[[y as usize, x as usize]] - lo) / (hi - lo);
            Luma([(value * 255.0) as u8])
        }),
        _ => GrayImage::new(cols as u32, rows as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_with_output_size(output_size: usize) -> PostProcessStage {
        let mut stage = PostProcessStage::new();
        let config = ReconConfig {
            output_size,
            ..Default::default()
        };
        stage.initialize(&config).unwrap();
        stage
    }

    #[test]
    fn constant_grid_yields_blank_image() {
        let grid = Array2::from_elem((16, 16), 3.25);
        let output = stage_with_output_size(16).execute(grid).unwrap();
        assert!(output.metadata.degenerate_contrast);
        assert!(output.payload.pixels().all(|pixel| pixel.0[0] == 0));
    }

    #[test]
    fn native_output_size_skips_resampling() {
        let grid = Array2::from_shape_fn((8, 8), |(row, col)| (row * 8 + col) as f32);
        let output = stage_with_output_size(8).execute(grid.clone()).unwrap();
        assert_eq!(output.payload.dimensions(), (8, 8));

        // Recompute the windowed quantization directly; the image must match
        // pixel for pixel when no resize happens.
        let values: Vec<f32> = grid.iter().copied().collect();
        let p_low = StatsHelper::percentile(&values, PERCENTILE_LOW);
        let p_high = StatsHelper::percentile(&values, PERCENTILE_HIGH);
        for (x, y, pixel) in output.payload.enumerate_pixels() {
            let value = grid[[y as usize, x as usize]];
            let windowed = ((value.clamp(p_low, p_high) - p_low) / (p_high - p_low))
                .powf(DISPLAY_GAMMA);
            assert_eq!(pixel.0[0], (windowed * 255.0) as u8);
        }
    }

    #[test]
    fn requested_output_size_resamples() {
        let grid = Array2::from_shape_fn((8, 8), |(row, col)| (row + col) as f32);
        let output = stage_with_output_size(32).execute(grid).unwrap();
        assert_eq!(output.payload.dimensions(), (32, 32));
    }

    #[test]
    fn gamma_brightens_midtones() {
        let grid = Array2::from_shape_fn((4, 4), |(row, col)| (row * 4 + col) as f32);
        let output = stage_with_output_size(4).execute(grid).unwrap();
        // The midpoint value 7.5 normalizes near 0.5; gamma 0.7 lifts it
        // above the linear quantization.
        let mid = output.payload.get_pixel(3, 1).0[0];
        assert!(mid > 128);
    }

    #[test]
    fn sinogram_view_normalizes_full_range() {
        let data = Array2::from_shape_fn((2, 3), |(row, col)| (row * 3 + col) as f32);
        let view = sinogram_view(&data);
        assert_eq!(view.dimensions(), (3, 2));
        assert_eq!(view.get_pixel(0, 0).0[0], 0);
        assert_eq!(view.get_pixel(2, 1).0[0], 255);
    }

    #[test]
    fn sinogram_view_of_constant_data_is_blank() {
        let data = Array2::from_elem((4, 4), 1.5);
        let view = sinogram_view(&data);
        assert!(view.pixels().all(|pixel| pixel.0[0] == 0));
    }
}
