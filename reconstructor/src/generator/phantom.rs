use std::io::Cursor;

use anyhow::Context;
use fbpcore::api_interface::{AngleSequence, SinogramPayload};
use image::{GrayImage, ImageFormat, Luma};
use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration for generating a synthetic centered-disc sinogram.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhantomConfig {
    pub detectors: usize,
    pub angles: usize,
    /// Disc radius as a fraction of the half detector span.
    pub radius_fraction: f32,
    pub intensity: f32,
    pub noise: f32,
    pub seed: u64,
    pub angle_range: f32,
    pub description: Option<String>,
}

impl Default for PhantomConfig {
    fn default() -> Self {
        Self {
            detectors: 128,
            angles: 180,
            radius_fraction: 0.35,
            intensity: 1.0,
            noise: 0.0,
            seed: 0,
            angle_range: 180.0,
            description: None,
        }
    }
}

/// Parallel-beam projection profile of a centered disc: the chord length at
/// each detector offset, normalized so the central value equals the
/// configured intensity. A centered disc projects identically at every
/// angle.
fn chord_profile(config: &PhantomConfig) -> Vec<f32> {
    let half = (config.detectors / 2) as f32;
    let radius = (config.radius_fraction * half).max(f32::EPSILON);
    (0..config.detectors)
        .map(|detector| {
            let offset = detector as f32 - half;
            if offset.abs() < radius {
                config.intensity * (radius * radius - offset * offset).sqrt() / radius
            } else {
                0.0
            }
        })
        .collect()
}

pub fn build_disc_payload_from_config(config: &PhantomConfig) -> anyhow::Result<SinogramPayload> {
    anyhow::ensure!(config.detectors > 0, "phantom needs at least one detector");
    anyhow::ensure!(config.angles > 0, "phantom needs at least one angle");

    let profile = chord_profile(config);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut data = Array2::<f32>::zeros((config.detectors, config.angles));
    for angle in 0..config.angles {
        for detector in 0..config.detectors {
            let jitter = if config.noise > 0.0 {
                rng.gen_range(-config.noise..config.noise)
            } else {
                0.0
            };
            data[[detector, angle]] = (profile[detector] + jitter).max(0.0);
        }
    }

    let angles = AngleSequence::uniform(config.angles, config.angle_range);
    Ok(SinogramPayload::new(data, angles))
}

pub fn build_disc_payload(detectors: usize, angles: usize) -> anyhow::Result<SinogramPayload> {
    let config = PhantomConfig {
        detectors,
        angles,
        ..Default::default()
    };
    build_disc_payload_from_config(&config)
}

/// Renders the phantom sinogram as PNG bytes, for feeding the full
/// decode-and-reconstruct path.
pub fn encode_disc_png(config: &PhantomConfig) -> anyhow::Result<Vec<u8>> {
    let payload = build_disc_payload_from_config(config)?;
    let (detectors, angles) = payload.data.dim();
    let image = GrayImage::from_fn(angles as u32, detectors as u32, |x, y| {
        let value = payload.data[[y as usize, x as usize]].clamp(0.0, 1.0);
        Luma([(value * 255.0) as u8])
    });
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .context("encoding phantom sinogram")?;
    Ok(cursor.into_inner())
}
