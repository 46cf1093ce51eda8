use std::f32::consts::PI;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::math::fft::frequency_axis;
use crate::prelude::{StageError, StageResult};

/// Closed set of frequency-domain filter selections.
///
/// `Unfiltered` is the explicit `none` selector: the projection filter
/// passes the sinogram through untouched. It is distinct from the
/// unknown-name fallback, which resolves to `Ramp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    Ramp,
    SheppLogan,
    Cosine,
    Hamming,
    Hann,
    #[serde(rename = "none")]
    Unfiltered,
}

impl FilterKind {
    /// Lenient name resolution: unrecognized names fall back to the ramp
    /// filter with a warning.
    pub fn parse(name: &str) -> Self {
        Self::parse_strict(name).unwrap_or_else(|_| {
            warn!("unrecognized filter {name:?}, falling back to ramp");
            FilterKind::Ramp
        })
    }

    /// Strict name resolution: unrecognized names are rejected.
    pub fn parse_strict(name: &str) -> StageResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "ramp" | "ram-lak" => Ok(FilterKind::Ramp),
            "shepp-logan" => Ok(FilterKind::SheppLogan),
            "cosine" => Ok(FilterKind::Cosine),
            "hamming" => Ok(FilterKind::Hamming),
            "hann" => Ok(FilterKind::Hann),
            "none" => Ok(FilterKind::Unfiltered),
            other => Err(StageError::UnsupportedFilter(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::Ramp => "ramp",
            FilterKind::SheppLogan => "shepp-logan",
            FilterKind::Cosine => "cosine",
            FilterKind::Hamming => "hamming",
            FilterKind::Hann => "hann",
            FilterKind::Unfiltered => "none",
        }
    }

    /// Apodization window at normalized frequency `freq` (cycles per sample).
    fn window(&self, freq: f32) -> f32 {
        match self {
            FilterKind::Ramp => 1.0,
            FilterKind::SheppLogan => sinc(freq / 2.0),
            FilterKind::Cosine => (freq * PI / 2.0).cos(),
            FilterKind::Hamming => 0.54 + 0.46 * (freq * PI).cos(),
            FilterKind::Hann => 0.5 + 0.5 * (freq * PI).cos(),
            FilterKind::Unfiltered => 1.0,
        }
    }

    /// Builds the frequency-domain kernel for `detectors` samples, or `None`
    /// when no filtering is requested.
    pub fn kernel(&self, detectors: usize) -> Option<FilterKernel> {
        match self {
            FilterKind::Unfiltered => None,
            _ => Some(FilterKernel::build(*self, detectors)),
        }
    }
}

/// Real-valued frequency-domain kernel of padded length.
#[derive(Debug, Clone)]
pub struct FilterKernel {
    kind: FilterKind,
    values: Vec<f32>,
}

impl FilterKernel {
    /// Padded transform length: `max(64, next_power_of_two(2 * detectors))`.
    pub fn padded_len(detectors: usize) -> usize {
        (2 * detectors.max(1)).next_power_of_two().max(64)
    }

    fn build(kind: FilterKind, detectors: usize) -> Self {
        let len = Self::padded_len(detectors);
        let mut values: Vec<f32> = frequency_axis(len)
            .iter()
            .map(|&freq| 2.0 * freq.abs() * kind.window(freq))
            .collect();
        // The DC bin is zeroed regardless of the window.
        values[0] = 0.0;
        Self { kind, values }
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

fn sinc(x: f32) -> f32 {
    if x == 0.0 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}
