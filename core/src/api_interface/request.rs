use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{GrayImage, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::prelude::{StageError, StageResult};

/// Reconstruction request as delivered by the serving layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconRequest {
    /// Base64-encoded single-channel image, with or without a data-URI prefix.
    pub sinogram: String,
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default = "default_output_size")]
    pub output_size: usize,
    #[serde(default = "default_angle_range")]
    pub angle_range: f32,
}

fn default_filter() -> String {
    "ramp".to_string()
}

fn default_output_size() -> usize {
    256
}

fn default_angle_range() -> f32 {
    180.0
}

impl ReconRequest {
    pub fn sinogram_bytes(&self) -> StageResult<Vec<u8>> {
        decode_data_uri(&self.sinogram)
    }
}

/// Successful reconstruction response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconResponse {
    pub success: bool,
    pub image: String,
    pub filtered_sinogram: String,
    pub size: usize,
    pub filter: String,
    pub num_angles: usize,
    pub num_detectors: usize,
    pub original_shape: String,
}

/// Failure response: human-readable message plus an optional trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconFailure {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

impl ReconFailure {
    pub fn new(error: String, trace: Option<String>) -> Self {
        Self {
            success: false,
            error,
            trace,
        }
    }
}

/// Strips a `data:<media>;base64,` scheme marker, if present.
pub fn strip_data_uri(payload: &str) -> &str {
    payload
        .split_once(',')
        .map(|(_, rest)| rest)
        .unwrap_or(payload)
}

pub fn decode_data_uri(payload: &str) -> StageResult<Vec<u8>> {
    STANDARD
        .decode(strip_data_uri(payload).trim())
        .map_err(|err| StageError::Decode(format!("invalid base64 payload: {err}")))
}

/// Encodes a grayscale image as a PNG data-URI.
pub fn encode_png_data_uri(image: &GrayImage) -> StageResult<String> {
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|err| StageError::Encode(format!("PNG encoding failed: {err}")))?;
    Ok(format!(
        "data:image/png;base64,{}",
        STANDARD.encode(cursor.into_inner())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_data_uri_removes_scheme_marker() {
        assert_eq!(strip_data_uri("data:image/png;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_uri("QUJD"), "QUJD");
    }

    #[test]
    fn decode_data_uri_round_trips_base64() {
        let encoded = format!("data:image/png;base64,{}", STANDARD.encode(b"payload"));
        assert_eq!(decode_data_uri(&encoded).unwrap(), b"payload");
        assert!(decode_data_uri("not base64!!").is_err());
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let request: ReconRequest = serde_json::from_str(r#"{"sinogram": "QUJD"}"#).unwrap();
        assert_eq!(request.filter, "ramp");
        assert_eq!(request.output_size, 256);
        assert_eq!(request.angle_range, 180.0);
    }

    #[test]
    fn encode_png_data_uri_emits_png_payload() {
        let image = GrayImage::from_pixel(4, 4, image::Luma([128]));
        let uri = encode_png_data_uri(&image).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        let bytes = decode_data_uri(&uri).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
