use anyhow::Context;
use fbpcore::api_interface::SinogramOrientation;
use fbpcore::prelude::ReconConfig;
use fbpcore::processing::kernel::FilterKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub filter: String,
    pub output_size: usize,
    pub angle_range: f32,
    /// Reject unrecognized filter names instead of falling back to ramp.
    pub strict_filter: bool,
    pub orientation: SinogramOrientation,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            filter: "ramp".to_string(),
            output_size: 256,
            angle_range: 180.0,
            strict_filter: false,
            orientation: SinogramOrientation::DetectorRows,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(filter: &str, output_size: usize, angle_range: f32) -> Self {
        Self {
            filter: filter.to_string(),
            output_size,
            angle_range,
            ..Default::default()
        }
    }

    /// Resolves the filter name under the configured policy and produces the
    /// core stage configuration.
    pub fn to_recon_config(&self) -> anyhow::Result<ReconConfig> {
        let filter = if self.strict_filter {
            FilterKind::parse_strict(&self.filter)
                .with_context(|| format!("resolving filter name {:?}", self.filter))?
        } else {
            FilterKind::parse(&self.filter)
        };
        Ok(ReconConfig {
            filter,
            output_size: self.output_size,
            angle_range_deg: self.angle_range,
            orientation: self.orientation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_produces_recon_config() {
        let cfg = WorkflowConfig::from_args("hann", 128, 180.0);
        let recon = cfg.to_recon_config().unwrap();
        assert_eq!(recon.filter, FilterKind::Hann);
        assert_eq!(recon.output_size, 128);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"filter: shepp-logan\noutput_size: 512\nangle_range: 360.0\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.filter, "shepp-logan");
        assert_eq!(cfg.output_size, 512);
        assert!(!cfg.strict_filter);
    }

    #[test]
    fn lenient_policy_accepts_unknown_names() {
        let cfg = WorkflowConfig::from_args("butterworth", 256, 180.0);
        let recon = cfg.to_recon_config().unwrap();
        assert_eq!(recon.filter, FilterKind::Ramp);
    }

    #[test]
    fn strict_policy_rejects_unknown_names() {
        let cfg = WorkflowConfig {
            filter: "butterworth".to_string(),
            strict_filter: true,
            ..Default::default()
        };
        assert!(cfg.to_recon_config().is_err());
    }
}
