//! The compression filter's part-based wire contract (spec §4.7, §6.3)
//!
//! A filter stage's metadata and data each arrive (and are emitted) as
//! an ordered list of "parts" — independently compressed chunks, e.g.
//! one per tile-chunk. This crate's pipeline only ever produces a
//! single data part per tile (it does not chunk tiles further), but the
//! wire format and this function are written generically over `N` parts
//! since that is what spec §6.3 pins down byte-exactly:
//!
//! ```text
//! u32 num_meta_parts   (host-endian, legacy)
//! u32 num_data_parts
//! for each part: u32 orig_size, u32 compressed_size   (host-endian)
//! ```
//! followed by the concatenated compressed bytes of every metadata part
//! then every data part, in that order.

use crate::compression::Compressor;
use crate::error::{Error, Result};
use rayon::prelude::*;

/// Forward direction: compresses every metadata part then every data
/// part independently, and builds the metadata prefix recording their
/// original/compressed sizes. Parts are independent by construction
/// (spec §6.3), so they compress in parallel via rayon.
pub fn forward(
    compressor: &Compressor,
    meta_parts: &[&[u8]],
    data_parts: &[&[u8]],
) -> Result<(Vec<u8>, Vec<u8>)> {
    let compressed: Vec<Vec<u8>> = meta_parts
        .par_iter()
        .chain(data_parts.par_iter())
        .map(|&part| {
            compressor
                .compress(part)
                .map_err(|e| Error::Compression(format!("filter compression failed: {}", e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut out_meta = Vec::with_capacity(8 + (meta_parts.len() + data_parts.len()) * 8);
    out_meta.extend_from_slice(&(meta_parts.len() as u32).to_ne_bytes());
    out_meta.extend_from_slice(&(data_parts.len() as u32).to_ne_bytes());

    let mut out_data = Vec::new();
    for (&part, compressed) in meta_parts.iter().chain(data_parts.iter()).zip(compressed.iter()) {
        out_meta.extend_from_slice(&(part.len() as u32).to_ne_bytes());
        out_meta.extend_from_slice(&(compressed.len() as u32).to_ne_bytes());
        out_data.extend_from_slice(compressed);
    }
    Ok((out_meta, out_data))
}

/// Reverses [`forward`], returning the reconstructed metadata parts
/// followed by the reconstructed data parts, in original order.
pub fn reverse(
    compressor: &Compressor,
    in_meta: &[u8],
    in_data: &[u8],
) -> Result<(Vec<Vec<u8>>, Vec<Vec<u8>>)> {
    if in_meta.len() < 8 {
        return Err(Error::Compression("compression filter metadata truncated".into()));
    }
    let num_meta_parts = u32::from_ne_bytes(in_meta[0..4].try_into().unwrap()) as usize;
    let num_data_parts = u32::from_ne_bytes(in_meta[4..8].try_into().unwrap()) as usize;
    let total_parts = num_meta_parts + num_data_parts;

    let mut pos = 8usize;
    let mut sizes = Vec::with_capacity(total_parts);
    for _ in 0..total_parts {
        if pos + 8 > in_meta.len() {
            return Err(Error::Compression("compression filter part-size table truncated".into()));
        }
        let orig_size = u32::from_ne_bytes(in_meta[pos..pos + 4].try_into().unwrap()) as usize;
        let compressed_size = u32::from_ne_bytes(in_meta[pos + 4..pos + 8].try_into().unwrap()) as usize;
        sizes.push((orig_size, compressed_size));
        pos += 8;
    }

    let mut chunks = Vec::with_capacity(total_parts);
    let mut data_pos = 0usize;
    for &(orig_size, compressed_size) in &sizes {
        if data_pos + compressed_size > in_data.len() {
            return Err(Error::Compression("compression filter data truncated".into()));
        }
        chunks.push((&in_data[data_pos..data_pos + compressed_size], orig_size));
        data_pos += compressed_size;
    }

    let mut parts: Vec<Vec<u8>> = chunks
        .par_iter()
        .map(|&(chunk, orig_size)| {
            let decompressed = compressor
                .decompress(chunk, orig_size)
                .map_err(|e| Error::Compression(format!("filter decompression failed: {}", e)))?;
            if decompressed.len() != orig_size {
                return Err(Error::Compression(
                    "decompressed part size does not match recorded orig_size".into(),
                ));
            }
            Ok(decompressed)
        })
        .collect::<Result<Vec<_>>>()?;

    let data_parts = parts.split_off(num_meta_parts);
    Ok((parts, data_parts))
}
