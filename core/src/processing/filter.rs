use ndarray::Array2;

use crate::api_interface::{FilteredSinogram, SinogramPayload};
use crate::math::fft::FftHelper;
use crate::math::stats::StatsHelper;
use crate::prelude::{
    ProcessingStage, ReconConfig, StageError, StageMetadata, StageOutput, StageResult,
};
use crate::processing::buffer_pool::BufferPool;
use crate::telemetry::log::LogManager;

/// Applies the frequency-domain kernel to every projection independently.
pub struct ProjectionFilterStage {
    pool: BufferPool,
    config: Option<ReconConfig>,
    logger: LogManager,
}

impl ProjectionFilterStage {
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool: BufferPool::with_capacity(pool_size),
            config: None,
            logger: LogManager::scoped("projection-filter"),
        }
    }
}

impl ProcessingStage for ProjectionFilterStage {
    type Input = SinogramPayload;
    type Payload = FilteredSinogram;

    fn initialize(&mut self, config: &ReconConfig) -> StageResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: Self::Input) -> StageResult<StageOutput<Self::Payload>> {
        let config = self
            .config
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

        let Some(kernel) = config.filter.kernel(detectors) else {
            self.logger.record("no filter selected, passing sinogram through");
            let metadata = StageMetadata {
                value_range: StatsHelper::min_max(input.data.iter()),
                notes: vec!["unfiltered pass-through".to_string()],
                ..Default::default()
            };
            return Ok(StageOutput {
                payload: FilteredSinogram {
                    data: input.data,
                    angles: input.angles,
                },
                metadata,
            });
        };

        let padded_len = kernel.len();
        let mut fft = FftHelper::new(padded_len);
        let mut filtered = Array2::<f32>::zeros((detectors, num_angles));

        for (angle_idx, projection) in input.data.columns().into_iter().enumerate() {
            let mut padded = self.pool.checkout(padded_len)?;
            for (slot, &sample) in padded.iter_mut().zip(projection.iter()) {
                *slot = sample;
            }

            let mut spectrum = fft.forward(&padded);
            for (bin, value) in spectrum.iter_mut().enumerate() {
                *value *= kernel.values()[bin];
            }
            let restored = fft.inverse_real(&mut spectrum);

            for (detector, &sample) in restored[..detectors].iter().enumerate() {
                filtered[[detector, angle_idx]] = sample;
            }
            self.pool.release(padded);
        }

        self.logger.record(&format!(
            "filtered {num_angles} projections with {} kernel (padded to {padded_len})",
            kernel.kind().name()
        ));
        let metadata = StageMetadata {
            value_range: StatsHelper::min_max(filtered.iter()),
            notes: vec![format!(
                "{} kernel, padded length {padded_len}",
                kernel.kind().name()
            )],
            ..Default::default()
        };

        Ok(StageOutput {
            payload: FilteredSinogram {
                data: filtered,
                angles: input.angles,
            },
            metadata,
        })
    }

    fn cleanup(&mut self) {
        self.pool.reset();
        self.config = None;
    }
}
