//! Gzip/zlib codec
//!
//! Thin wrapper over `flate2`, the teacher's deflate dependency, kept
//! bit-exact with a standard zlib stream (spec §4.8). Default level 9,
//! valid range 0–9 (spec §4.7).

use crate::error::{Error, Result};
use flate2::read::{ZlibDecoder, ZlibEncoder};
use flate2::Compression;
use std::io::Read;

pub const DEFAULT_LEVEL: i32 = 9;
const MIN_LEVEL: i32 = 0;
const MAX_LEVEL: i32 = 9;

/// Clamps an out-of-range level to the default rather than erroring
/// (spec §4.7 "Level out of range → clamped to default, not an error").
pub fn clamp_level(level: i32) -> i32 {
    if (MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        level
    } else {
        DEFAULT_LEVEL
    }
}

pub fn compress(input: &[u8], level: i32) -> Result<Vec<u8>> {
    let level = clamp_level(level);
    let mut encoder = ZlibEncoder::new(input, Compression::new(level as u32));
    let mut out = Vec::new();
    encoder
        .read_to_end(&mut out)
        .map_err(|e| Error::Compression(format!("gzip compression failed: {}", e)))?;
    Ok(out)
}

pub fn decompress(input: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(input);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::Compression(format!("gzip decompression failed: {}", e)))?;
    Ok(out)
}

/// Worst-case expansion for zlib-framed deflate: a handful of header/
/// trailer bytes plus ~0.1% for incompressible input.
pub fn overhead(nbytes: usize) -> usize {
    (nbytes / 100) + 64
}
