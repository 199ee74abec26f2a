//! Endian encode/decode helpers
//!
//! Two endianness regimes are in play in this crate, matching the legacy
//! on-disk format this core must stay bit-compatible with:
//!
//! - Counters written directly by the compression filter (part counts,
//!   per-part original/compressed sizes) are **host-endian**, a legacy
//!   constraint preserved for on-disk compatibility (spec §6.3, §9).
//! - Values written by a codec itself (RLE run lengths, string lengths,
//!   dictionary entries) are **big-endian** so they round-trip across
//!   platforms of differing native endianness, and their byte width is
//!   chosen dynamically (1, 2, 4 or 8 bytes) based on the largest value
//!   that must be represented.

/// Returns the smallest byte width in `{1, 2, 4, 8}` that can hold `value`.
pub fn bytesize_for(value: u64) -> u8 {
    if value <= u8::MAX as u64 {
        1
    } else if value <= u16::MAX as u64 {
        2
    } else if value <= u32::MAX as u64 {
        4
    } else {
        8
    }
}

/// Encodes `value` in big-endian form using exactly `bytesize` bytes
/// (one of 1, 2, 4, 8), appending to `out`.
pub fn encode_be(value: u64, bytesize: u8, out: &mut Vec<u8>) {
    match bytesize {
        1 => out.push(value as u8),
        2 => out.extend_from_slice(&(value as u16).to_be_bytes()),
        4 => out.extend_from_slice(&(value as u32).to_be_bytes()),
        8 => out.extend_from_slice(&value.to_be_bytes()),
        _ => panic!("unsupported big-endian bytesize: {}", bytesize),
    }
}

/// Decodes a big-endian value of `bytesize` bytes (one of 1, 2, 4, 8)
/// from the front of `input`.
pub fn decode_be(input: &[u8], bytesize: u8) -> u64 {
    match bytesize {
        1 => input[0] as u64,
        2 => u16::from_be_bytes([input[0], input[1]]) as u64,
        4 => u32::from_be_bytes([input[0], input[1], input[2], input[3]]) as u64,
        8 => u64::from_be_bytes(input[..8].try_into().unwrap()),
        _ => panic!("unsupported big-endian bytesize: {}", bytesize),
    }
}

/// Writes a `u32` counter in host (native) endianness, the legacy format
/// used by the on-disk compression filter metadata prefix.
pub fn write_host_u32(value: u32, out: &mut Vec<u8>) {
    out.extend_from_slice(&value.to_ne_bytes());
}

/// Reads a `u32` counter written in host (native) endianness.
pub fn read_host_u32(input: &[u8]) -> u32 {
    u32::from_ne_bytes(input[..4].try_into().unwrap())
}
