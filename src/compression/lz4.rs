//! LZ4 codec
//!
//! Thin wrapper over `lz4_flex`'s block format. No compression level
//! (spec §4.8); the size-prepended helpers are used so decompression
//! never needs an externally tracked original size.

use crate::error::{Error, Result};

pub fn compress(input: &[u8]) -> Result<Vec<u8>> {
    Ok(lz4_flex::compress_prepend_size(input))
}

pub fn decompress(input: &[u8]) -> Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(input)
        .map_err(|e| Error::Compression(format!("lz4 decompression failed: {}", e)))
}

/// Worst-case LZ4 block expansion plus the 4-byte size prefix.
pub fn overhead(nbytes: usize) -> usize {
    (nbytes / 255) + 16 + 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let input: Vec<u8> = (0..4096u32).map(|v| (v % 7) as u8).collect();
        let compressed = compress(&input).unwrap();
        let decompressed = decompress(&compressed).unwrap();
        assert_eq!(decompressed, input);
    }

    #[test]
    fn test_empty_roundtrip() {
        let compressed = compress(&[]).unwrap();
        let decompressed = decompress(&compressed).unwrap();
        assert!(decompressed.is_empty());
    }
}
