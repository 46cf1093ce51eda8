use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Axis convention of an incoming sinogram image.
///
/// The reconstruction always consumes `detectors x angles`; `AngleRows`
/// inputs are transposed on ingest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SinogramOrientation {
    /// Rows are detector positions, columns are projection angles.
    #[default]
    DetectorRows,
    /// Rows are projection angles, columns are detector positions.
    AngleRows,
}

/// Uniform angular sweep over `[0, range_deg)`, endpoint excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleSequence {
    values_deg: Vec<f32>,
}

impl AngleSequence {
    pub fn uniform(count: usize, range_deg: f32) -> Self {
        let step = if count == 0 {
            0.0
        } else {
            range_deg / count as f32
        };
        Self {
            values_deg: (0..count).map(|index| index as f32 * step).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values_deg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values_deg.is_empty()
    }

    pub fn iter_deg(&self) -> impl Iterator<Item = f32> + '_ {
        self.values_deg.iter().copied()
    }

    pub fn iter_rad(&self) -> impl Iterator<Item = f32> + '_ {
        self.values_deg.iter().map(|deg| deg.to_radians())
    }
}

/// Decoded, normalized sinogram ready for filtering.
#[derive(Debug, Clone)]
pub struct SinogramPayload {
    /// Intensities in `[0, 1]`, shape `detectors x angles`.
    pub data: Array2<f32>,
    pub angles: AngleSequence,
}

impl SinogramPayload {
    pub fn new(data: Array2<f32>, angles: AngleSequence) -> Self {
        Self { data, angles }
    }

    pub fn detectors(&self) -> usize {
        self.data.nrows()
    }

    pub fn num_angles(&self) -> usize {
        self.data.ncols()
    }
}

/// Sinogram whose projections have passed through the frequency filter.
#[derive(Debug, Clone)]
pub struct FilteredSinogram {
    pub data: Array2<f32>,
    pub angles: AngleSequence,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_sequence_excludes_endpoint() {
        let angles = AngleSequence::uniform(4, 180.0);
        let values: Vec<f32> = angles.iter_deg().collect();
        assert_eq!(values, vec![0.0, 45.0, 90.0, 135.0]);
    }

    #[test]
    fn angle_sequence_converts_to_radians() {
        let angles = AngleSequence::uniform(2, 180.0);
        let values: Vec<f32> = angles.iter_rad().collect();
        assert!((values[1] - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn payload_reports_dimensions() {
        let payload = SinogramPayload::new(
            Array2::zeros((16, 8)),
            AngleSequence::uniform(8, 180.0),
        );
        assert_eq!(payload.detectors(), 16);
        assert_eq!(payload.num_angles(), 8);
    }
}
