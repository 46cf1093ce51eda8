use std::f32::consts::PI;

use ndarray::Array2;

use crate::api_interface::FilteredSinogram;
use crate::math::stats::StatsHelper;
use crate::prelude::{
    ProcessingStage, ReconConfig, StageError, StageMetadata, StageOutput, StageResult,
};
use crate::telemetry::log::LogManager;

/// Accumulates filtered projections into the spatial reconstruction grid.
pub struct BackProjectorStage {
    config: Option<ReconConfig>,
    logger: LogManager,
}

impl BackProjectorStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::scoped("back-projector"),
        }
    }
}

impl Default for BackProjectorStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for BackProjectorStage {
    type Input = FilteredSinogram;
    type Payload = Array2<f32>;

    fn initialize(&mut self, config: &ReconConfig) -> StageResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: Self::Input) -> StageResult<StageOutput<Self::Payload>> {
        self.config
            .as_ref()
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;

        let (detectors, num_angles) = input.data.dim();
        if detectors == 0 || num_angles == 0 {
            return Err(StageError::Shape("sinogram has an empty dimension".into()));
        }
        if input.angles.len() != num_angles {
            return Err(StageError::Shape(format!(
                "angle sequence length {} does not match {} projections",
                input.angles.len(),
                num_angles
            )));
        }

        // The native grid is square with the detector count on each side,
        // centered on the half-detector index.
        let size = detectors;
        let half = (detectors / 2) as f32;
        let mut grid = Array2::<f32>::zeros((size, size));

        for (angle_idx, theta) in input.angles.iter_rad().enumerate() {
            let (sin_t, cos_t) = theta.sin_cos();
            let projection = input.data.column(angle_idx);

            for row in 0..size {
                let y = row as f32 - half;
                for col in 0..size {
                    let x = col as f32 - half;
                    let t_idx = x * cos_t + y * sin_t + half;
                    let t_floor = t_idx.floor();
                    let lower = t_floor as isize;
                    // Points projecting outside the detector array are
                    // dropped, never clamped or wrapped.
                    if lower < 0 || lower + 1 >= detectors as isize {
                        continue;
                    }
                    let frac = t_idx - t_floor;
                    let lower = lower as usize;
                    grid[[row, col]] +=
                        projection[lower] * (1.0 - frac) + projection[lower + 1] * frac;
                }
            }
        }

        // Angular sampling density normalization, applied exactly once
        // after all angles have accumulated.
        let scale = PI / (2.0 * num_angles as f32);
        grid.mapv_inplace(|value| value * scale);

        self.logger.record(&format!(
            "back-projected {num_angles} angles onto a {size}x{size} grid"
        ));
        let metadata = StageMetadata {
            value_range: StatsHelper::min_max(grid.iter()),
            notes: vec![format!("{num_angles} angles accumulated")],
            ..Default::default()
        };

        Ok(StageOutput {
            payload: grid,
            metadata,
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}
