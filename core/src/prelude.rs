use serde::{Deserialize, Serialize};

use crate::api_interface::SinogramOrientation;
use crate::processing::kernel::FilterKind;

/// Shared configuration consumed by every processing stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconConfig {
    pub filter: FilterKind,
    pub output_size: usize,
    pub angle_range_deg: f32,
    pub orientation: SinogramOrientation,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            filter: FilterKind::Ramp,
            output_size: 256,
            angle_range_deg: 180.0,
            orientation: SinogramOrientation::DetectorRows,
        }
    }
}

/// Metadata used for chaining stages and telemetry.
#[derive(Debug, Clone, Default)]
pub struct StageMetadata {
    /// Shape of the decoded input before orientation is applied (rows, cols).
    pub source_shape: Option<(usize, usize)>,
    pub value_range: Option<(f32, f32)>,
    pub percentile_window: Option<(f32, f32)>,
    pub degenerate_contrast: bool,
    pub notes: Vec<String>,
}

/// Output produced by each stage.
#[derive(Debug, Clone)]
pub struct StageOutput<T> {
    pub payload: T,
    pub metadata: StageMetadata,
}

/// Common error type for stage execution.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("decode failure: {0}")]
    Decode(String),
    #[error("shape mismatch: {0}")]
    Shape(String),
    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),
    #[error("encode failure: {0}")]
    Encode(String),
    #[error("buffer exhaustion: {0}")]
    BufferExhaustion(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type StageResult<T> = Result<T, StageError>;

/// Trait describing the reconstruction pipeline stages.
///
/// The stages are heterogeneous (encoded bytes in, matrices between, an
/// 8-bit image out), so input and payload types are associated rather than
/// fixed.
pub trait ProcessingStage {
    type Input;
    type Payload;

    fn initialize(&mut self, config: &ReconConfig) -> StageResult<()>;
    fn execute(&mut self, input: Self::Input) -> StageResult<StageOutput<Self::Payload>>;
    fn cleanup(&mut self);
}
