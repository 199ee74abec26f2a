//! Codecs
//!
//! Byte-for-byte compatible encoders/decoders for the compression
//! filter (spec §4.7, §4.8): thin wrappers over external reference
//! implementations (`gzip`, `zstd`, `lz4`, `bzip2`, `blosc`), plus two
//! codecs this crate implements itself because no off-the-shelf crate
//! covers them (`rle`, `double_delta`). Variable-length string RLE and
//! dictionary encoding live one layer up, in [`crate::filter`], because
//! they need the offsets tile alongside the data tile.

pub mod blosc;
pub mod bzip2_codec;
pub mod double_delta;
pub mod gzip;
pub mod lz4;
pub mod rle;
pub mod zstd_codec;

use crate::error::{Error, Result};

/// One of the compressors enumerated in spec §4.8. `level` is clamped
/// to each codec's valid range rather than erroring (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Compressor {
    None,
    Gzip { level: i32 },
    Zstd { level: i32 },
    Lz4,
    Bzip2 { level: i32 },
    Blosc {
        inner: blosc::InnerCodec,
        level: i32,
        typesize: usize,
    },
    /// Fixed-width run-length encoding; `value_size` is the attribute's
    /// cell size in bytes.
    Rle { value_size: usize },
    DoubleDelta { cell_size: usize },
}

impl Compressor {
    /// Forward (compression) direction.
    pub fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        match *self {
            Compressor::None => Ok(input.to_vec()),
            Compressor::Gzip { level } => gzip::compress(input, level),
            Compressor::Zstd { level } => zstd_codec::compress(input, level),
            Compressor::Lz4 => lz4::compress(input),
            Compressor::Bzip2 { level } => bzip2_codec::compress(input, level),
            Compressor::Blosc { inner, level, typesize } => {
                blosc::compress(input, typesize, inner, level)
            }
            Compressor::Rle { value_size } => rle::compress(value_size, input),
            Compressor::DoubleDelta { cell_size } => double_delta::compress(cell_size, input),
        }
    }

    /// Reverse (decompression) direction. `orig_size` is the
    /// uncompressed size recorded in the compression filter's metadata
    /// (spec §6.3); codecs that need a cell count (double-delta) derive
    /// it from `orig_size / cell_size`.
    pub fn decompress(&self, input: &[u8], orig_size: usize) -> Result<Vec<u8>> {
        match *self {
            Compressor::None => Ok(input.to_vec()),
            Compressor::Gzip { .. } => gzip::decompress(input),
            Compressor::Zstd { .. } => zstd_codec::decompress(input, orig_size),
            Compressor::Lz4 => lz4::decompress(input),
            Compressor::Bzip2 { .. } => bzip2_codec::decompress(input),
            Compressor::Blosc { inner, typesize, .. } => {
                blosc::decompress(input, typesize, inner, orig_size)
            }
            Compressor::Rle { value_size } => rle::decompress(value_size, input),
            Compressor::DoubleDelta { cell_size } => {
                let cell_num = if cell_size == 0 { 0 } else { orig_size / cell_size };
                double_delta::decompress(cell_size, input, cell_num)
            }
        }
    }

    /// Worst-case expansion in bytes for an input of `nbytes`, used by
    /// the filter pipeline to size output buffers before calling the
    /// codec (spec §4.7).
    pub fn overhead(&self, nbytes: usize) -> usize {
        match *self {
            Compressor::None => 0,
            Compressor::Gzip { .. } => gzip::overhead(nbytes),
            Compressor::Zstd { .. } => zstd_codec::overhead(nbytes),
            Compressor::Lz4 => lz4::overhead(nbytes),
            Compressor::Bzip2 { .. } => bzip2_codec::overhead(nbytes),
            Compressor::Blosc { .. } => blosc::overhead(nbytes),
            Compressor::Rle { value_size } => rle::overhead(nbytes, value_size),
            Compressor::DoubleDelta { cell_size } => double_delta::overhead(nbytes, cell_size),
        }
    }

    /// Clamps `level` into this codec's valid range (a no-op for
    /// codecs, like Lz4, that have no notion of level).
    pub fn with_clamped_level(self) -> Self {
        match self {
            Compressor::Gzip { level } => Compressor::Gzip { level: gzip::clamp_level(level) },
            Compressor::Zstd { level } => Compressor::Zstd { level: zstd_codec::clamp_level(level) },
            Compressor::Bzip2 { level } => Compressor::Bzip2 { level: bzip2_codec::clamp_level(level) },
            Compressor::Blosc { inner, level, typesize } => Compressor::Blosc {
                inner,
                level: gzip::clamp_level(level).max(1),
                typesize,
            },
            other => other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Compressor::None => "NONE",
            Compressor::Gzip { .. } => "GZIP",
            Compressor::Zstd { .. } => "ZSTD",
            Compressor::Lz4 => "LZ4",
            Compressor::Bzip2 { .. } => "BZIP2",
            Compressor::Blosc { .. } => "BLOSC",
            Compressor::Rle { .. } => "RLE",
            Compressor::DoubleDelta { .. } => "DOUBLE_DELTA",
        }
    }
}

/// Parses a compressor name plus a raw level into a [`Compressor`],
/// clamping the level if out of range. `value_size`/`typesize` are
/// required for `RLE`/`DOUBLE_DELTA`/`BLOSC` and ignored otherwise.
pub fn from_name(name: &str, level: i32, value_size: usize) -> Result<Compressor> {
    let compressor = match name.to_ascii_uppercase().as_str() {
        "NONE" => Compressor::None,
        "GZIP" => Compressor::Gzip { level },
        "ZSTD" => Compressor::Zstd { level },
        "LZ4" => Compressor::Lz4,
        "BZIP2" => Compressor::Bzip2 { level },
        "RLE" => Compressor::Rle { value_size },
        "DOUBLE_DELTA" => Compressor::DoubleDelta { cell_size: value_size },
        other => return Err(Error::InvalidArgument(format!("unknown compressor: {}", other))),
    };
    Ok(compressor.with_clamped_level())
}
