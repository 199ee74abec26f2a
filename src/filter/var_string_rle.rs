//! Run-length encoding of variable-length ASCII strings
//!
//! Grounded on `original_source/tiledb/sm/compressors/rle_compressor.cc`'s
//! `span<std::string_view>` overloads. This filter must run first in any
//! chain (spec §4.7) because it needs the offsets tile to slice the data
//! tile into individual strings; everything downstream (e.g. the
//! compression filter) only ever sees its already-encoded byte stream.
//!
//! On-disk header (spec §6.3), written host-endian like the compression
//! filter's own counters:
//! ```text
//! u32 orig_data_size
//! u32 compressed_size
//! u32 offsets_size
//! u8  rle_len_bytesize
//! u8  string_len_bytesize
//! ```
//! followed by the run stream: `(run_len, str_len)` each big-endian at
//! their chosen byte widths, then the run's literal bytes.

use crate::endian::{bytesize_for, decode_be, encode_be};
use crate::error::{Error, Result};

/// Header fields preceding the encoded run stream (spec §6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarRleHeader {
    pub orig_data_size: u32,
    pub compressed_size: u32,
    pub offsets_size: u32,
    pub rle_len_bytesize: u8,
    pub string_len_bytesize: u8,
}

/// The full encoded output: header plus the run-stream bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRleEncoded {
    pub header: VarRleHeader,
    pub runs: Vec<u8>,
}

/// Slices `data` into one `&[u8]` per string using `offsets`, a
/// monotonically non-decreasing list of starting byte positions into
/// `data` (the tile's offsets component, spec §3 "variable-length
/// attributes").
pub fn strings_from_offsets<'a>(data: &'a [u8], offsets: &[u64]) -> Result<Vec<&'a [u8]>> {
    let mut out = Vec::with_capacity(offsets.len());
    for (i, &start) in offsets.iter().enumerate() {
        let end = offsets.get(i + 1).copied().unwrap_or(data.len() as u64);
        if start as usize > data.len() || end as usize > data.len() || start > end {
            return Err(Error::InvalidArgument(
                "offsets tile out of range for data tile".into(),
            ));
        }
        out.push(&data[start as usize..end as usize]);
    }
    Ok(out)
}

/// One pass over `strings` to determine the byte widths and run count
/// needed, mirroring `RLE::calculate_compression_params`.
fn compression_params(strings: &[&[u8]]) -> (u8, u8, usize, usize) {
    if strings.is_empty() {
        return (1, 1, 0, 0);
    }
    let mut max_run = 1u64;
    let mut run = 1u64;
    let mut max_str_len = strings[0].len() as u64;
    let mut num_runs = 1usize;
    let mut total_bytes = 0usize;
    let mut previous = strings[0];
    for &s in &strings[1..] {
        if s == previous {
            run += 1;
        } else {
            max_run = max_run.max(run);
            max_str_len = max_str_len.max(previous.len() as u64);
            total_bytes += previous.len();
            num_runs += 1;
            run = 1;
            previous = s;
        }
    }
    max_run = max_run.max(run);
    max_str_len = max_str_len.max(previous.len() as u64);
    total_bytes += previous.len();
    (bytesize_for(max_run), bytesize_for(max_str_len), num_runs, total_bytes)
}

/// Encodes `strings` (spec §4.7 "RLE on variable-length strings").
pub fn encode(strings: &[&[u8]]) -> VarRleEncoded {
    let (rle_len_bytesize, string_len_bytesize, _num_runs, _total_bytes) =
        compression_params(strings);

    let mut runs = Vec::new();
    if !strings.is_empty() {
        let mut previous = strings[0];
        let mut run_len: u64 = 1;
        let mut emit = |value: &[u8], run_len: u64, runs: &mut Vec<u8>| {
            encode_be(run_len, rle_len_bytesize, runs);
            encode_be(value.len() as u64, string_len_bytesize, runs);
            runs.extend_from_slice(value);
        };
        for &s in &strings[1..] {
            if s == previous {
                run_len += 1;
            } else {
                emit(previous, run_len, &mut runs);
                previous = s;
                run_len = 1;
            }
        }
        emit(previous, run_len, &mut runs);
    }

    let orig_data_size: u32 = strings.iter().map(|s| s.len() as u32).sum();
    let offsets_size = (strings.len() * std::mem::size_of::<u64>()) as u32;
    let header = VarRleHeader {
        orig_data_size,
        compressed_size: runs.len() as u32,
        offsets_size,
        rle_len_bytesize,
        string_len_bytesize,
    };
    VarRleEncoded { header, runs }
}

/// Reconstructs the original string sequence (and, from it, the data
/// tile plus offsets tile) from an encoded run stream.
pub fn decode(encoded: &VarRleEncoded) -> Result<(Vec<u8>, Vec<u64>)> {
    let VarRleEncoded { header, runs } = encoded;
    let mut data = Vec::with_capacity(header.orig_data_size as usize);
    let mut offsets = Vec::new();
    let mut pos = 0usize;
    while pos < runs.len() {
        let rle_w = header.rle_len_bytesize as usize;
        let str_w = header.string_len_bytesize as usize;
        if pos + rle_w + str_w > runs.len() {
            return Err(Error::Compression("truncated var-string RLE run header".into()));
        }
        let run_len = decode_be(&runs[pos..], header.rle_len_bytesize);
        pos += rle_w;
        let str_len = decode_be(&runs[pos..], header.string_len_bytesize) as usize;
        pos += str_w;
        if pos + str_len > runs.len() {
            return Err(Error::Compression("truncated var-string RLE run body".into()));
        }
        let bytes = &runs[pos..pos + str_len];
        pos += str_len;
        for _ in 0..run_len {
            offsets.push(data.len() as u64);
            data.extend_from_slice(bytes);
        }
    }
    Ok((data, offsets))
}

/// Serializes `encoded` to the on-disk byte layout of spec §6.3.
pub fn serialize(encoded: &VarRleEncoded) -> Vec<u8> {
    let h = &encoded.header;
    let mut out = Vec::with_capacity(18 + encoded.runs.len());
    out.extend_from_slice(&h.orig_data_size.to_ne_bytes());
    out.extend_from_slice(&h.compressed_size.to_ne_bytes());
    out.extend_from_slice(&h.offsets_size.to_ne_bytes());
    out.push(h.rle_len_bytesize);
    out.push(h.string_len_bytesize);
    out.extend_from_slice(&encoded.runs);
    out
}

/// Reverses [`serialize`].
pub fn deserialize(bytes: &[u8]) -> Result<VarRleEncoded> {
    if bytes.len() < 14 {
        return Err(Error::Compression("var-string RLE header truncated".into()));
    }
    let orig_data_size = u32::from_ne_bytes(bytes[0..4].try_into().unwrap());
    let compressed_size = u32::from_ne_bytes(bytes[4..8].try_into().unwrap());
    let offsets_size = u32::from_ne_bytes(bytes[8..12].try_into().unwrap());
    let rle_len_bytesize = bytes[12];
    let string_len_bytesize = bytes[13];
    let runs = bytes[14..14 + compressed_size as usize].to_vec();
    Ok(VarRleEncoded {
        header: VarRleHeader {
            orig_data_size,
            compressed_size,
            offsets_size,
            rle_len_bytesize,
            string_len_bytesize,
        },
        runs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs<'a>(v: &[&'a str]) -> Vec<&'a [u8]> {
        v.iter().map(|s| s.as_bytes()).collect()
    }

    #[test]
    fn test_scenario_s3_var_string_rle() {
        let input = strs(&[
            "HG543232", "HG543232", "HG543232", "HG543232", "HG543232",
            "HG54", "HG54", "A",
        ]);
        let encoded = encode(&input);
        assert_eq!(encoded.header.rle_len_bytesize, 1);
        assert_eq!(encoded.header.string_len_bytesize, 1);

        let expected_runs: Vec<u8> = vec![
            5, 8, b'H', b'G', b'5', b'4', b'3', b'2', b'3', b'2',
            2, 4, b'H', b'G', b'5', b'4',
            1, 1, b'A',
        ];
        assert_eq!(encoded.runs, expected_runs);
    }

    #[test]
    fn test_roundtrip() {
        let input = strs(&["a", "a", "a", "bb", "ccc", "ccc"]);
        let encoded = encode(&input);
        let (data, offsets) = decode(&encoded).unwrap();
        let decoded_strings = strings_from_offsets(&data, &offsets).unwrap();
        assert_eq!(decoded_strings, input);
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let input = strs(&["x", "x", "y"]);
        let encoded = encode(&input);
        let bytes = serialize(&encoded);
        let back = deserialize(&bytes).unwrap();
        assert_eq!(back, encoded);
    }

    #[test]
    fn test_empty_input() {
        let encoded = encode(&[]);
        assert!(encoded.runs.is_empty());
        let (data, offsets) = decode(&encoded).unwrap();
        assert!(data.is_empty());
        assert!(offsets.is_empty());
    }

    #[test]
    fn test_large_strings_pick_wider_bytesize() {
        let long = "x".repeat(300);
        let input: Vec<&[u8]> = vec![long.as_bytes(); 2];
        let encoded = encode(&input);
        assert_eq!(encoded.header.string_len_bytesize, 2);
    }
}
