use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use fbpcore::api_interface::request::encode_png_data_uri;
use fbpcore::api_interface::{ReconRequest, ReconResponse, SinogramPayload};
use fbpcore::prelude::ProcessingStage;
use fbpcore::processing::postprocess::sinogram_view;
use fbpcore::processing::{BackProjectorStage, IngestStage, PostProcessStage, ProjectionFilterStage};
use image::GrayImage;

pub struct ReconOutcome {
    pub reconstruction: GrayImage,
    pub filtered_view: GrayImage,
    pub num_detectors: usize,
    pub num_angles: usize,
    pub original_shape: (usize, usize),
    pub resolved_filter: &'static str,
    pub output_size: usize,
    pub degenerate_contrast: bool,
    pub notes: Vec<String>,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Full pipeline from encoded sinogram bytes.
    pub fn execute_bytes(&self, encoded: &[u8]) -> anyhow::Result<ReconOutcome> {
        let recon_config = self.config.to_recon_config()?;

        let mut ingest = IngestStage::new();
        ingest
            .initialize(&recon_config)
            .context("initializing ingest stage")?;
        let ingest_output = ingest
            .execute(encoded.to_vec())
            .context("decoding sinogram")?;
        ingest.cleanup();

        let original_shape = ingest_output
            .metadata
            .source_shape
            .unwrap_or_else(|| (ingest_output.payload.detectors(), ingest_output.payload.num_angles()));
        self.execute_payload(ingest_output.payload, original_shape)
    }

    /// Pipeline from an already-decoded payload (phantom baselines, tests).
    pub fn execute_payload(
        &self,
        payload: SinogramPayload,
        original_shape: (usize, usize),
    ) -> anyhow::Result<ReconOutcome> {
        let recon_config = self.config.to_recon_config()?;
        let num_detectors = payload.detectors();
        let num_angles = payload.num_angles();
        let mut notes = Vec::new();

        let mut filter_stage = ProjectionFilterStage::new(2);
        filter_stage
            .initialize(&recon_config)
            .context("initializing projection filter stage")?;
        let filter_output = filter_stage
            .execute(payload)
            .context("executing projection filter stage")?;
        filter_stage.cleanup();
        notes.extend(filter_output.metadata.notes.clone());

        let filtered_view = sinogram_view(&filter_output.payload.data);

        let mut backproject_stage = BackProjectorStage::new();
        backproject_stage
            .initialize(&recon_config)
            .context("initializing back-projector stage")?;
        let backproject_output = backproject_stage
            .execute(filter_output.payload)
            .context("executing back-projector stage")?;
        backproject_stage.cleanup();
        notes.extend(backproject_output.metadata.notes.clone());

        let mut postprocess_stage = PostProcessStage::new();
        postprocess_stage
            .initialize(&recon_config)
            .context("initializing post-process stage")?;
        let postprocess_output = postprocess_stage
            .execute(backproject_output.payload)
            .context("executing post-process stage")?;
        postprocess_stage.cleanup();
        notes.extend(postprocess_output.metadata.notes.clone());

        log::info!(
            "reconstruction complete: {num_detectors} detectors x {num_angles} angles -> {0}x{0}",
            recon_config.output_size
        );

        Ok(ReconOutcome {
            reconstruction: postprocess_output.payload,
            filtered_view,
            num_detectors,
            num_angles,
            original_shape,
            resolved_filter: recon_config.filter.name(),
            output_size: recon_config.output_size,
            degenerate_contrast: postprocess_output.metadata.degenerate_contrast,
            notes,
        })
    }

    /// Serves a boundary request: decode, reconstruct, encode the response.
    pub fn execute_request(
        &self,
        request: &ReconRequest,
    ) -> anyhow::Result<(ReconResponse, ReconOutcome)> {
        let mut config = self.config.clone();
        config.filter = request.filter.clone();
        config.output_size = request.output_size;
        config.angle_range = request.angle_range;
        let runner = Runner::new(config);

        let bytes = request.sinogram_bytes().context("decoding request payload")?;
        let outcome = runner.execute_bytes(&bytes)?;

        let response = ReconResponse {
            success: true,
            image: encode_png_data_uri(&outcome.reconstruction)
                .context("encoding reconstruction")?,
            filtered_sinogram: encode_png_data_uri(&outcome.filtered_view)
                .context("encoding filtered sinogram")?,
            size: outcome.output_size,
            filter: outcome.resolved_filter.to_string(),
            num_angles: outcome.num_angles,
            num_detectors: outcome.num_detectors,
            original_shape: format!("{}x{}", outcome.original_shape.0, outcome.original_shape.1),
        };
        Ok((response, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::phantom::{
        build_disc_payload_from_config, encode_disc_png, PhantomConfig,
    };
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    fn small_disc_config() -> PhantomConfig {
        // A disc only a couple of pixels wide reconstructs to a single
        // unimodal blob, which keeps the peak-location check unambiguous.
        PhantomConfig {
            detectors: 64,
            angles: 180,
            radius_fraction: 0.05,
            ..Default::default()
        }
    }

    #[test]
    fn disc_phantom_round_trips_to_a_centered_peak() {
        let phantom = small_disc_config();
        let payload = build_disc_payload_from_config(&phantom).unwrap();
        let recon_config = WorkflowConfig::from_args("ramp", 64, 180.0)
            .to_recon_config()
            .unwrap();

        let mut filter_stage = ProjectionFilterStage::new(2);
        filter_stage.initialize(&recon_config).unwrap();
        let filtered = filter_stage.execute(payload).unwrap().payload;
        filter_stage.cleanup();

        let mut backproject_stage = BackProjectorStage::new();
        backproject_stage.initialize(&recon_config).unwrap();
        let grid = backproject_stage.execute(filtered).unwrap().payload;
        backproject_stage.cleanup();

        // The strongest reconstructed intensity must sit within one pixel
        // of the phantom center.
        let (mut peak_row, mut peak_col, mut peak) = (0_usize, 0_usize, f32::MIN);
        for ((row, col), &value) in grid.indexed_iter() {
            if value > peak {
                peak = value;
                peak_row = row;
                peak_col = col;
            }
        }
        assert!((peak_row as i64 - 32).abs() <= 1, "peak row {peak_row}");
        assert!((peak_col as i64 - 32).abs() <= 1, "peak col {peak_col}");

        // Background far from the disc stays near zero relative to the peak.
        assert!(grid[[1, 1]].abs() < 0.05 * peak, "corner {}", grid[[1, 1]]);
    }

    #[test]
    fn runner_reconstructs_phantom_payload() {
        let payload = build_disc_payload_from_config(&small_disc_config()).unwrap();
        let shape = (payload.detectors(), payload.num_angles());

        let config = WorkflowConfig::from_args("ramp", 64, 180.0);
        let outcome = Runner::new(config).execute_payload(payload, shape).unwrap();

        assert_eq!(outcome.reconstruction.dimensions(), (64, 64));
        assert_eq!(outcome.num_angles, 180);
        assert_eq!(outcome.resolved_filter, "ramp");
        assert!(!outcome.degenerate_contrast);
        assert!(!outcome.notes.is_empty());

        let center = outcome.reconstruction.get_pixel(32, 32).0[0];
        let corner = outcome.reconstruction.get_pixel(1, 1).0[0];
        assert!(center > 200, "center {center}");
        assert!(corner < center, "corner {corner} vs center {center}");
    }

    #[test]
    fn uniform_sinogram_yields_blank_output() {
        let phantom = PhantomConfig {
            detectors: 32,
            angles: 16,
            intensity: 0.0,
            ..Default::default()
        };
        let payload = build_disc_payload_from_config(&phantom).unwrap();
        let shape = (payload.detectors(), payload.num_angles());

        let config = WorkflowConfig::from_args("ramp", 32, 180.0);
        let outcome = Runner::new(config).execute_payload(payload, shape).unwrap();
        assert!(outcome.degenerate_contrast);
        assert!(outcome
            .reconstruction
            .pixels()
            .all(|pixel| pixel.0[0] == 0));
    }

    #[test]
    fn request_execution_round_trips_data_uris() {
        let png = encode_disc_png(&small_disc_config()).unwrap();
        let request = ReconRequest {
            sinogram: format!("data:image/png;base64,{}", STANDARD.encode(&png)),
            filter: "hann".to_string(),
            output_size: 32,
            angle_range: 180.0,
        };

        let runner = Runner::new(WorkflowConfig::default());
        let (response, outcome) = runner.execute_request(&request).unwrap();
        assert!(response.success);
        assert!(response.image.starts_with("data:image/png;base64,"));
        assert!(response
            .filtered_sinogram
            .starts_with("data:image/png;base64,"));
        assert_eq!(response.filter, "hann");
        assert_eq!(response.size, 32);
        assert_eq!(response.num_detectors, 64);
        assert_eq!(response.num_angles, 180);
        assert_eq!(response.original_shape, "64x180");
        assert_eq!(outcome.reconstruction.dimensions(), (32, 32));
    }

    #[test]
    fn strict_filter_policy_propagates_from_config() {
        let config = WorkflowConfig {
            filter: "butterworth".to_string(),
            strict_filter: true,
            ..Default::default()
        };
        let payload = build_disc_payload_from_config(&small_disc_config()).unwrap();
        let shape = (payload.detectors(), payload.num_angles());
        assert!(Runner::new(config).execute_payload(payload, shape).is_err());
    }
}
