//! Double-delta (delta-of-deltas) integer compression
//!
//! Grounded on the delta-of-delta transform used by the original's
//! double-delta filter. Values are interpreted as signed integers of a
//! given cell width (`{1,2,4,8}` bytes), widened to `i64`. The first
//! value is stored verbatim, the second as a plain delta, and every
//! later value as the delta of the previous delta (spec §4.8). Output is
//! always little-endian `i64` words so the stream is portable across
//! platforms of differing native endianness (spec §9).

use crate::error::{Error, Result};

fn read_cell(bytes: &[u8], width: usize) -> i64 {
    match width {
        1 => bytes[0] as i8 as i64,
        2 => i16::from_le_bytes([bytes[0], bytes[1]]) as i64,
        4 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64,
        8 => i64::from_le_bytes(bytes[..8].try_into().unwrap()),
        _ => unreachable!(),
    }
}

/// Encodes `input` (cells of `cell_size` bytes each, `cell_size ∈
/// {1,2,4,8}`) as a little-endian `i64` delta-of-deltas stream.
pub fn compress(cell_size: usize, input: &[u8]) -> Result<Vec<u8>> {
    if !matches!(cell_size, 1 | 2 | 4 | 8) {
        return Err(Error::InvalidArgument(format!(
            "double-delta cell_size must be one of 1, 2, 4, 8 (got {})",
            cell_size
        )));
    }
    if input.len() % cell_size != 0 {
        return Err(Error::Compression(
            "double-delta input length is not a multiple of cell_size".into(),
        ));
    }
    let cell_num = input.len() / cell_size;
    let mut out = Vec::with_capacity(cell_num * 8);
    if cell_num == 0 {
        return Ok(out);
    }

    let values: Vec<i64> = (0..cell_num)
        .map(|i| read_cell(&input[i * cell_size..(i + 1) * cell_size], cell_size))
        .collect();

    out.extend_from_slice(&values[0].to_le_bytes());
    if cell_num == 1 {
        return Ok(out);
    }
    let mut prev_delta = values[1] - values[0];
    out.extend_from_slice(&prev_delta.to_le_bytes());
    for i in 2..cell_num {
        let delta = values[i] - values[i - 1];
        let dod = delta - prev_delta;
        out.extend_from_slice(&dod.to_le_bytes());
        prev_delta = delta;
    }
    Ok(out)
}

/// Reverses [`compress`], writing `cell_num` cells of `cell_size` bytes
/// each.
pub fn decompress(cell_size: usize, input: &[u8], cell_num: usize) -> Result<Vec<u8>> {
    if !matches!(cell_size, 1 | 2 | 4 | 8) {
        return Err(Error::InvalidArgument(format!(
            "double-delta cell_size must be one of 1, 2, 4, 8 (got {})",
            cell_size
        )));
    }
    if cell_num == 0 {
        return Ok(Vec::new());
    }
    if input.len() != cell_num * 8 {
        return Err(Error::Compression(
            "double-delta input length does not match cell_num".into(),
        ));
    }
    let read_i64 = |i: usize| -> i64 {
        i64::from_le_bytes(input[i * 8..(i + 1) * 8].try_into().unwrap())
    };

    let mut values = Vec::with_capacity(cell_num);
    values.push(read_i64(0));
    if cell_num > 1 {
        let mut prev_delta = read_i64(1);
        values.push(values[0] + prev_delta);
        for i in 2..cell_num {
            let dod = read_i64(i);
            let delta = prev_delta + dod;
            values.push(values[i - 1] + delta);
            prev_delta = delta;
        }
    }

    let mut out = Vec::with_capacity(cell_num * cell_size);
    for v in values {
        match cell_size {
            1 => out.push(v as i8 as u8),
            2 => out.extend_from_slice(&(v as i16).to_le_bytes()),
            4 => out.extend_from_slice(&(v as i32).to_le_bytes()),
            8 => out.extend_from_slice(&v.to_le_bytes()),
            _ => unreachable!(),
        }
    }
    Ok(out)
}

/// Worst-case expansion: deltas may need up to 8 bytes per cell
/// regardless of the input cell width.
pub fn overhead(nbytes: usize, cell_size: usize) -> usize {
    if cell_size == 0 {
        return 0;
    }
    let cell_num = nbytes / cell_size;
    cell_num.saturating_mul(8).saturating_sub(nbytes)
}
