//! Bzip2 codec
//!
//! Thin wrapper over the `bzip2` crate (block-sort, Huffman-coded
//! back end). Default level 9, valid range 1–9 (spec §4.7/§4.8).

use crate::error::{Error, Result};
use bzip2::read::{BzDecoder, BzEncoder};
use bzip2::Compression;
use std::io::Read;

pub const DEFAULT_LEVEL: i32 = 9;
const MIN_LEVEL: i32 = 1;
const MAX_LEVEL: i32 = 9;

pub fn clamp_level(level: i32) -> i32 {
    if (MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        level
    } else {
        DEFAULT_LEVEL
    }
}

pub fn compress(input: &[u8], level: i32) -> Result<Vec<u8>> {
    let level = clamp_level(level);
    let mut encoder = BzEncoder::new(input, Compression::new(level as u32));
    let mut out = Vec::new();
    encoder
        .read_to_end(&mut out)
        .map_err(|e| Error::Compression(format!("bzip2 compression failed: {}", e)))?;
    Ok(out)
}

pub fn decompress(input: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = BzDecoder::new(input);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::Compression(format!("bzip2 decompression failed: {}", e)))?;
    Ok(out)
}

pub fn overhead(nbytes: usize) -> usize {
    (nbytes / 100) + 600
}
