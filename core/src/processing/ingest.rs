use ndarray::Array2;

use crate::api_interface::{AngleSequence, SinogramOrientation, SinogramPayload};
use crate::math::stats::StatsHelper;
use crate::prelude::{
    ProcessingStage, ReconConfig, StageError, StageMetadata, StageOutput, StageResult,
};
use crate::telemetry::log::LogManager;

/// Decodes an encoded grayscale sinogram into a normalized payload.
pub struct IngestStage {
    config: Option<ReconConfig>,
    logger: LogManager,
}

impl IngestStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::scoped("ingest"),
        }
    }
}

impl Default for IngestStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for IngestStage {
    type Input = Vec<u8>;
    type Payload = SinogramPayload;

    fn initialize(&mut self, config: &ReconConfig) -> StageResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: Self::Input) -> StageResult<StageOutput<Self::Payload>> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;

        let decoded = image::load_from_memory(&input)
            .map_err(|err| StageError::Decode(format!("cannot parse sinogram image: {err}")))?;
        let gray = decoded.to_luma8();
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Err(StageError::Shape("sinogram has an empty dimension".into()));
        }

        let source_shape = (height as usize, width as usize);
        let mut data = Array2::from_shape_fn(source_shape, |(row, col)| {
            f32::from(gray.get_pixel(col as u32, row as u32).0[0]) / 255.0
        });
        if config.orientation == SinogramOrientation::AngleRows {
            data = data.t().to_owned();
        }

        let (detectors, num_angles) = data.dim();
        if num_angles > detectors {
            self.logger.warn(&format!(
                "sinogram has more angles ({num_angles}) than detectors ({detectors}); \
                 check the orientation setting"
            ));
        }
        self.logger.record(&format!(
            "decoded sinogram {detectors} detectors x {num_angles} angles"
        ));

        let angles = AngleSequence::uniform(num_angles, config.angle_range_deg);
        let metadata = StageMetadata {
            source_shape: Some(source_shape),
            value_range: StatsHelper::min_max(data.iter()),
            notes: vec![format!("{detectors} detectors x {num_angles} angles")],
            ..Default::default()
        };

        Ok(StageOutput {
            payload: SinogramPayload::new(data, angles),
            metadata,
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma};
    use std::io::Cursor;

    fn encode_png(image: &GrayImage) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        image.write_to(&mut cursor, ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    fn stage_with(config: &ReconConfig) -> IngestStage {
        let mut stage = IngestStage::new();
        stage.initialize(config).unwrap();
        stage
    }

    #[test]
    fn ingest_normalizes_to_unit_range() {
        let image = GrayImage::from_fn(3, 2, |x, y| Luma([(x + y * 3) as u8 * 51]));
        let mut stage = stage_with(&ReconConfig::default());

        let output = stage.execute(encode_png(&image)).unwrap();
        let payload = output.payload;
        // Rows are detectors (image height), columns are angles (width).
        assert_eq!(payload.data.dim(), (2, 3));
        assert!((payload.data[[0, 0]] - 0.0).abs() < 1e-6);
        assert!((payload.data[[1, 2]] - 255.0 / 255.0).abs() < 1e-6);
        assert_eq!(payload.angles.len(), 3);
        assert_eq!(output.metadata.source_shape, Some((2, 3)));
        stage.cleanup();
    }

    #[test]
    fn ingest_transposes_angle_row_inputs() {
        let image = GrayImage::from_fn(3, 2, |x, y| Luma([(x * 10 + y) as u8]));
        let config = ReconConfig {
            orientation: SinogramOrientation::AngleRows,
            ..Default::default()
        };
        let mut stage = stage_with(&config);

        let payload = stage.execute(encode_png(&image)).unwrap().payload;
        assert_eq!(payload.data.dim(), (3, 2));
        // Pixel (x=2, y=1) lands at detector row 2, angle column 1.
        assert!((payload.data[[2, 1]] - 21.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn ingest_rejects_undecodable_input() {
        let mut stage = stage_with(&ReconConfig::default());
        let result = stage.execute(vec![0x00, 0x01, 0x02]);
        assert!(matches!(result, Err(StageError::Decode(_))));
    }

    #[test]
    fn ingest_angle_count_follows_sweep_setting() {
        let image = GrayImage::from_pixel(4, 8, Luma([100]));
        let config = ReconConfig {
            angle_range_deg: 360.0,
            ..Default::default()
        };
        let mut stage = stage_with(&config);

        let payload = stage.execute(encode_png(&image)).unwrap().payload;
        let last = payload.angles.iter_deg().last().unwrap();
        assert!((last - 270.0).abs() < 1e-4);
    }
}
