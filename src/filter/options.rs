//! Filter configuration surface
//!
//! The options of spec §6.4, as a typed struct deserializable with
//! `serde`/`serde_json` — mirroring the teacher's `api/models.rs` use of
//! `serde::Deserialize` for request bodies, since this crate's filter
//! configuration is the same kind of externally-supplied, optional-field
//! payload.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Color layouts the WEBP tile filter understands (spec §6.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WebpInputFormat {
    None,
    Rgb,
    Rgba,
    Bgr,
    Bgra,
}

impl WebpInputFormat {
    pub fn from_u8(v: u8) -> Result<Self> {
        match v {
            0 => Ok(WebpInputFormat::None),
            1 => Ok(WebpInputFormat::Rgb),
            2 => Ok(WebpInputFormat::Rgba),
            3 => Ok(WebpInputFormat::Bgr),
            4 => Ok(WebpInputFormat::Bgra),
            other => Err(Error::InvalidArgument(format!(
                "invalid webp_input_format: {}",
                other
            ))),
        }
    }

    /// Bytes per pixel for this color layout; `None` has no pixel depth.
    pub fn pixel_depth(self) -> Option<usize> {
        match self {
            WebpInputFormat::None => None,
            WebpInputFormat::Rgb | WebpInputFormat::Bgr => Some(3),
            WebpInputFormat::Rgba | WebpInputFormat::Bgra => Some(4),
        }
    }
}

/// The filter options enumerated in spec §6.4. All fields are optional
/// on the wire; a missing field keeps the codec's own default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    pub compression_level: Option<i32>,
    pub webp_quality: Option<f32>,
    pub webp_input_format: Option<u8>,
    pub webp_lossless: Option<u8>,
}

impl FilterOptions {
    /// Validates the option values are within the ranges spec §6.4
    /// documents; does not apply codec-specific level clamping (that
    /// happens at the codec, per spec §4.7's "clamped, not an error").
    pub fn validate(&self) -> Result<()> {
        if let Some(q) = self.webp_quality {
            if !(0.0..=100.0).contains(&q) {
                return Err(Error::InvalidArgument(format!(
                    "webp_quality out of range [0, 100]: {}",
                    q
                )));
            }
        }
        if let Some(fmt) = self.webp_input_format {
            WebpInputFormat::from_u8(fmt)?;
        }
        if let Some(lossless) = self.webp_lossless {
            if lossless > 1 {
                return Err(Error::InvalidArgument(format!(
                    "webp_lossless must be 0 or 1: {}",
                    lossless
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial_options() {
        let json = r#"{"compression_level": 5}"#;
        let opts: FilterOptions = serde_json::from_str(json).unwrap();
        assert_eq!(opts.compression_level, Some(5));
        assert_eq!(opts.webp_quality, None);
    }

    #[test]
    fn test_validate_rejects_out_of_range_quality() {
        let opts = FilterOptions {
            webp_quality: Some(150.0),
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_full_range() {
        let opts = FilterOptions {
            compression_level: Some(9),
            webp_quality: Some(75.0),
            webp_input_format: Some(2),
            webp_lossless: Some(1),
        };
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_webp_input_format_pixel_depth() {
        assert_eq!(WebpInputFormat::Rgb.pixel_depth(), Some(3));
        assert_eq!(WebpInputFormat::Rgba.pixel_depth(), Some(4));
        assert_eq!(WebpInputFormat::None.pixel_depth(), None);
    }
}
