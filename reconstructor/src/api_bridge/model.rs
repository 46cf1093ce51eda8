use serde::{Deserialize, Serialize};

/// Summary of the most recent reconstruction, served by the bridge.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReconModel {
    pub filter: String,
    pub size: usize,
    pub num_angles: usize,
    pub num_detectors: usize,
    pub degenerate_contrast: bool,
    pub notes: Vec<String>,
}
