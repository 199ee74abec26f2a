//! WEBP tile filter (optional)
//!
//! Grounded on `original_source/tiledb/sm/filter/webp_filter.cc`: the
//! tile is treated as a single 2D pixel buffer (row stride = `extent_x`
//! bytes, pixel width = `extent_x / pixel_depth`). Gated behind the
//! `webp` Cargo feature; absent, every entry point returns
//! `Error::NotSupported` rather than failing to compile (spec §9's
//! capability-trait guidance).

use crate::error::{Error, Result};
use crate::filter::options::WebpInputFormat;

/// Pixel extents exceeding this on either side are rejected (spec §4.8).
const MAX_EXTENT: u32 = 16_383;

#[derive(Debug, Clone, Copy)]
pub struct WebpConfig {
    pub extent_y: u32,
    pub extent_x: u32,
    pub format: WebpInputFormat,
    pub quality: f32,
    pub lossless: bool,
}

impl WebpConfig {
    fn validate(&self) -> Result<usize> {
        if self.extent_y > MAX_EXTENT || self.extent_x > MAX_EXTENT {
            return Err(Error::InvalidArgument(format!(
                "webp extents exceed {} pixels",
                MAX_EXTENT
            )));
        }
        let depth = self
            .format
            .pixel_depth()
            .ok_or_else(|| Error::InvalidArgument("webp_input_format is required".into()))?;
        Ok(depth)
    }
}

#[cfg(feature = "webp")]
pub fn compress(tile: &[u8], cfg: &WebpConfig) -> Result<Vec<u8>> {
    let depth = cfg.validate()?;
    let pixel_width = cfg.extent_x as usize / depth;
    let encoder = match (depth, matches!(cfg.format, WebpInputFormat::Rgba | WebpInputFormat::Bgra)) {
        (3, _) => ::webp::Encoder::from_rgb(tile, pixel_width as u32, cfg.extent_y),
        (4, _) => ::webp::Encoder::from_rgba(tile, pixel_width as u32, cfg.extent_y),
        _ => return Err(Error::InvalidArgument("unsupported webp pixel depth".into())),
    };
    let quality = if cfg.lossless { 100.0 } else { cfg.quality };
    let memory = encoder.encode(quality);
    Ok(memory.to_vec())
}

#[cfg(not(feature = "webp"))]
pub fn compress(_tile: &[u8], _cfg: &WebpConfig) -> Result<Vec<u8>> {
    Err(Error::NotSupported("webp codec (build without the `webp` feature)".into()))
}

#[cfg(feature = "webp")]
pub fn decompress(encoded: &[u8], _cfg: &WebpConfig) -> Result<Vec<u8>> {
    let decoder = ::webp::Decoder::new(encoded);
    let image = decoder
        .decode()
        .ok_or_else(|| Error::Compression("webp decode failed".into()))?;
    Ok(image.to_vec())
}

#[cfg(not(feature = "webp"))]
pub fn decompress(_encoded: &[u8], _cfg: &WebpConfig) -> Result<Vec<u8>> {
    Err(Error::NotSupported("webp codec (build without the `webp` feature)".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_oversized_extents() {
        let cfg = WebpConfig {
            extent_y: 20_000,
            extent_x: 100,
            format: WebpInputFormat::Rgb,
            quality: 80.0,
            lossless: false,
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_requires_pixel_format() {
        let cfg = WebpConfig {
            extent_y: 10,
            extent_x: 10,
            format: WebpInputFormat::None,
            quality: 80.0,
            lossless: false,
        };
        assert!(cfg.validate().is_err());
    }

    #[cfg(not(feature = "webp"))]
    #[test]
    fn test_not_supported_without_feature() {
        let cfg = WebpConfig {
            extent_y: 4,
            extent_x: 12,
            format: WebpInputFormat::Rgb,
            quality: 80.0,
            lossless: false,
        };
        assert!(matches!(compress(&[0; 48], &cfg), Err(Error::NotSupported(_))));
    }
}
