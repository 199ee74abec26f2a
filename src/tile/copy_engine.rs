//! Copy engine
//!
//! Moves cell slabs between a tile slab's local buffer (laid out in
//! array cell/tile order) and the user's flat source/destination buffer
//! (laid out in the user's requested order), re-ordering cells as
//! needed and suspending cleanly on overflow so the caller can retry
//! with a larger buffer (spec §4.3).
//!
//! Grounded on the original's `ArraySortedReadState`/
//! `ArraySortedWriteState` `copy_tile_slab`/`copy_tile_slab_var`: the
//! per-coordinate odometer that steps through a tile slab one cell slab
//! at a time, carrying across dimensions, is reproduced here as
//! [`CellWalker`] instead of duplicated per coordinate type (spec §9).

use crate::coord::{CellOrder, Coordinate};
use crate::tile::slab::{TileExtent, TileSlab};
use crate::tile::slab_info::TileSlabInfo;
use crate::tile::state::{CopyState, OverflowFlag, TileSlabState};

/// A mixed-radix odometer over a tile slab's cell coordinates, walked in
/// the user's requested dimension order. [`advance`](Self::advance)
/// moves the cursor by an arbitrary cell count, carrying across
/// dimensions exactly as a flat linear index would (spec §4.3 step 4:
/// "advance `cur_coord` by `cell_slab_num` ... propagate the carry
/// through remaining dimensions").
struct CellWalker {
    /// Current 0-based position within the slab, per dimension.
    pos: Vec<i64>,
    /// Dimension indices from fastest- to slowest-varying in the user's
    /// requested order; carries propagate along this path.
    fast_to_slow: Vec<usize>,
    tile_offset_per_dim: Vec<i64>,
    cell_offset_per_dim: Vec<i64>,
}

impl CellWalker {
    fn new(dim_num: usize, user_order: CellOrder, info: &TileSlabInfo, pos: Vec<i64>) -> Self {
        Self {
            pos,
            fast_to_slow: user_order.dims_fast_to_slow(dim_num),
            tile_offset_per_dim: info.tile_offset_per_dim.clone(),
            cell_offset_per_dim: info.cell_offset_per_dim.clone(),
        }
    }

    /// `(tile_linear_idx, in_tile_cell_id)` for the cursor's current
    /// position, both in array order (spec §4.3 step 1).
    fn locate(&self, tile_extent_lens: &[i64]) -> (i64, i64) {
        let mut tile_idx = 0i64;
        let mut cid = 0i64;
        for d in 0..self.pos.len() {
            let tile_coord = self.pos[d] / tile_extent_lens[d];
            let in_tile = self.pos[d] % tile_extent_lens[d];
            tile_idx += tile_coord * self.tile_offset_per_dim[d];
            cid += in_tile * self.cell_offset_per_dim[d];
        }
        (tile_idx, cid)
    }

    /// Advances the cursor by `n` cells in the user's requested order,
    /// carrying across dimensions. Returns `true` once the cursor has
    /// walked off the end of the slab.
    fn advance(&mut self, mut n: i64, dims: &[i64]) -> bool {
        for &d in &self.fast_to_slow {
            if n == 0 {
                break;
            }
            let total = self.pos[d] + n;
            self.pos[d] = total.rem_euclid(dims[d]);
            n = total.div_euclid(dims[d]);
        }
        n > 0
    }

    /// Linear index of the cursor's current position within the slab,
    /// along the walker's own (user-order) traversal path. Unlike
    /// [`locate`](Self::locate), which maps into array order, this is
    /// used to index buffers that are already laid out in the user's
    /// requested order, e.g. a write query's source offsets/payload.
    fn linear(&self, dims: &[i64]) -> i64 {
        let mut idx = 0i64;
        let mut stride = 1i64;
        for &d in &self.fast_to_slow {
            idx += self.pos[d] * stride;
            stride *= dims[d];
        }
        idx
    }
}

/// Per-dimension cell length of `slab`.
fn slab_dims<T: Coordinate>(slab: &TileSlab<T>) -> Vec<i64> {
    slab.ranges.iter().map(|r| r.len()).collect()
}

fn tile_extent_lens(tile_extents: &TileExtent) -> Vec<i64> {
    tile_extents.extents.iter().map(|&e| e as i64).collect()
}

fn tile_cell_num(tile_extents: &TileExtent) -> i64 {
    tile_extents.extents.iter().map(|&e| e as i64).product()
}

fn make_walker<T: Coordinate>(
    info: &TileSlabInfo,
    slab: &TileSlab<T>,
    user_order: CellOrder,
    state: &TileSlabState<T>,
) -> CellWalker {
    let dims = slab_dims(slab);
    let pos = if state.current_offsets.len() == dims.len() {
        state.current_offsets.clone()
    } else {
        vec![0i64; dims.len()]
    };
    CellWalker::new(dims.len(), user_order, info, pos)
}

/// Copies one tile slab's worth of a fixed-size attribute from
/// `local_buffer` (array order) into `user_buffer` (user order),
/// resuming from `state`/`copy_state` and stopping with
/// [`OverflowFlag::Fixed`] the moment `user_buffer` cannot hold the next
/// cell slab (spec §4.3 read path).
pub fn copy_tile_slab_read<T: Coordinate>(
    info: &TileSlabInfo,
    slab: &TileSlab<T>,
    tile_extents: &TileExtent,
    user_order: CellOrder,
    attribute_size: usize,
    local_buffer: &[u8],
    state: &mut TileSlabState<T>,
    copy_state: &mut CopyState,
    user_buffer: &mut [u8],
) -> OverflowFlag {
    if state.copy_tile_slab_done {
        return OverflowFlag::None;
    }
    let dims = slab_dims(slab);
    let tile_lens = tile_extent_lens(tile_extents);
    let tile_bytes = tile_cell_num(tile_extents) as usize * attribute_size;
    let mut walker = make_walker(info, slab, user_order, state);
    let slab_bytes = info.cell_slab_size as usize * attribute_size;

    loop {
        if copy_state.remaining(0) < slab_bytes {
            state.current_offsets = walker.pos.clone();
            return OverflowFlag::Fixed;
        }
        let (tile_idx, cid) = walker.locate(&tile_lens);
        let src = tile_idx as usize * tile_bytes + cid as usize * attribute_size;
        let dst = copy_state.buffer_offsets[0];
        user_buffer[dst..dst + slab_bytes].copy_from_slice(&local_buffer[src..src + slab_bytes]);
        copy_state.buffer_offsets[0] += slab_bytes;

        let done = walker.advance(info.cell_slab_size, &dims);
        if done {
            state.copy_tile_slab_done = true;
            state.current_offsets = walker.pos;
            return OverflowFlag::None;
        }
    }
}

/// Mirror of [`copy_tile_slab_read`] for the write path: scatters cells
/// from `user_buffer` (user order) into `local_buffer` (array order).
/// `local_buffer` must already be filled with the attribute's empty-fill
/// pattern (spec §4.3 "the local slab buffer is first filled with
/// per-datatype empty fill values").
pub fn copy_tile_slab_write<T: Coordinate>(
    info: &TileSlabInfo,
    slab: &TileSlab<T>,
    tile_extents: &TileExtent,
    user_order: CellOrder,
    attribute_size: usize,
    local_buffer: &mut [u8],
    state: &mut TileSlabState<T>,
    copy_state: &mut CopyState,
    user_buffer: &[u8],
) -> OverflowFlag {
    if state.copy_tile_slab_done {
        return OverflowFlag::None;
    }
    let dims = slab_dims(slab);
    let tile_lens = tile_extent_lens(tile_extents);
    let tile_bytes = tile_cell_num(tile_extents) as usize * attribute_size;
    let mut walker = make_walker(info, slab, user_order, state);
    let slab_bytes = info.cell_slab_size as usize * attribute_size;

    loop {
        if copy_state.remaining(0) < slab_bytes {
            state.current_offsets = walker.pos.clone();
            return OverflowFlag::Fixed;
        }
        let (tile_idx, cid) = walker.locate(&tile_lens);
        let dst = tile_idx as usize * tile_bytes + cid as usize * attribute_size;
        let src = copy_state.buffer_offsets[0];
        local_buffer[dst..dst + slab_bytes].copy_from_slice(&user_buffer[src..src + slab_bytes]);
        copy_state.buffer_offsets[0] += slab_bytes;

        let done = walker.advance(info.cell_slab_size, &dims);
        if done {
            state.copy_tile_slab_done = true;
            state.current_offsets = walker.pos;
            return OverflowFlag::None;
        }
    }
}

/// Fills `buffer` with repetitions of `fill_pattern` (spec §4.3 empty
/// fill values, byte patterns from [`crate::coord::empty_fill_bytes`]).
pub fn fill_empty(buffer: &mut [u8], fill_pattern: &[u8]) {
    for chunk in buffer.chunks_mut(fill_pattern.len()) {
        chunk.copy_from_slice(&fill_pattern[..chunk.len()]);
    }
}

/// Variable-length attribute read: translates the tile's offsets
/// component into user-buffer-relative offsets while copying the
/// payload bytes in the same pass (spec §4.3 "variable-length
/// attributes"). `local_offsets` holds one absolute byte offset per
/// cell of the whole tile slab, in array order; `user_var_offset` is
/// the running write position into `user_payload`, carried across calls
/// so offsets stay relative to the start of the *query's* var buffer
/// rather than resetting every slab.
pub fn copy_tile_slab_read_var<T: Coordinate>(
    info: &TileSlabInfo,
    slab: &TileSlab<T>,
    tile_extents: &TileExtent,
    user_order: CellOrder,
    local_offsets: &[u64],
    local_payload: &[u8],
    state: &mut TileSlabState<T>,
    copy_state: &mut CopyState,
    user_offsets: &mut [u8],
    user_payload: &mut [u8],
    user_var_offset: &mut u64,
) -> OverflowFlag {
    if state.copy_tile_slab_done {
        return OverflowFlag::None;
    }
    let dims = slab_dims(slab);
    let tile_lens = tile_extent_lens(tile_extents);
    let tile_cells = tile_cell_num(tile_extents);
    let total_cells = local_offsets.len() as i64;
    let mut walker = make_walker(info, slab, user_order, state);
    let cell_slab = info.cell_slab_size;
    let offsets_bytes = cell_slab as usize * 8;

    loop {
        let (tile_idx, cid) = walker.locate(&tile_lens);
        let global = tile_idx * tile_cells + cid;
        let payload_start = local_offsets[global as usize];
        let payload_end = if global + cell_slab < total_cells {
            local_offsets[(global + cell_slab) as usize]
        } else {
            local_payload.len() as u64
        };
        let payload_len = (payload_end - payload_start) as usize;

        if copy_state.remaining(0) < offsets_bytes {
            state.current_offsets = walker.pos.clone();
            return OverflowFlag::Fixed;
        }
        if copy_state.remaining(1) < payload_len {
            state.current_offsets = walker.pos.clone();
            return OverflowFlag::VarData;
        }

        let off_base = copy_state.buffer_offsets[0];
        for k in 0..cell_slab {
            let cell_rel = local_offsets[(global + k) as usize] - payload_start;
            let user_off = *user_var_offset + cell_rel;
            let at = off_base + k as usize * 8;
            user_offsets[at..at + 8].copy_from_slice(&user_off.to_ne_bytes());
        }
        let pay_base = copy_state.buffer_offsets[1];
        user_payload[pay_base..pay_base + payload_len]
            .copy_from_slice(&local_payload[payload_start as usize..payload_end as usize]);

        copy_state.buffer_offsets[0] += offsets_bytes;
        copy_state.buffer_offsets[1] += payload_len;
        *user_var_offset += payload_len as u64;

        let done = walker.advance(cell_slab, &dims);
        if done {
            state.copy_tile_slab_done = true;
            state.current_offsets = walker.pos;
            return OverflowFlag::None;
        }
    }
}

/// Default assumed average byte length of one variable-length cell's
/// payload, used as the starting point for the local payload buffer's
/// doubling growth (spec §9 Open Question: write-path buffer growth is
/// "doubling, starting from whatever initial capacity the caller
/// configured, defaulting to this constant times the cell count").
pub const DEFAULT_AVG_VAR_CELL_LEN: usize = 32;

/// Grows `buf`'s capacity by doubling until it can hold `additional`
/// more bytes without reallocating again next call.
fn grow_payload_for(buf: &mut Vec<u8>, additional: usize) {
    let needed = buf.len() + additional;
    if needed <= buf.capacity() {
        return;
    }
    let mut new_cap = buf.capacity().max(DEFAULT_AVG_VAR_CELL_LEN);
    while new_cap < needed {
        new_cap *= 2;
    }
    buf.reserve(new_cap - buf.len());
}

/// Variable-length attribute write: scatters user cells (laid out in
/// the user's requested order via `user_offsets`/`user_payload`) into
/// `local_offsets`/`local_payload` (array order), growing the payload
/// buffer by doubling instead of overflowing (spec §4.3 write path,
/// §9). Runs in two passes, mirroring the original's sentinel scheme:
/// the first records, at every array position, a 1-based sentinel
/// naming which user cell lands there; the second walks array order,
/// copies each cell's payload into the local payload buffer, and
/// overwrites the sentinel with the cell's absolute byte offset (spec
/// §4.3 "offsets are written as 1-based sentinel values ... then
/// rectified in a second pass"). `local_offsets` must already be sized
/// to the slab's total cell count.
pub fn copy_tile_slab_write_var<T: Coordinate>(
    info: &TileSlabInfo,
    slab: &TileSlab<T>,
    tile_extents: &TileExtent,
    user_order: CellOrder,
    user_offsets: &[u64],
    user_payload: &[u8],
    state: &mut TileSlabState<T>,
    local_offsets: &mut [u64],
    local_payload: &mut Vec<u8>,
) {
    if state.copy_tile_slab_done {
        return;
    }
    let dims = slab_dims(slab);
    let tile_lens = tile_extent_lens(tile_extents);
    let tile_cells = tile_cell_num(tile_extents);
    let total_user_cells = user_offsets.len() as i64;
    let mut walker = make_walker(info, slab, user_order, state);
    let cell_slab = info.cell_slab_size;

    let mut user_cursor = walker.linear(&dims);
    loop {
        let (tile_idx, cid) = walker.locate(&tile_lens);
        let array_base = tile_idx * tile_cells + cid;
        for k in 0..cell_slab {
            local_offsets[(array_base + k) as usize] = (user_cursor + k) as u64 + 1;
        }
        user_cursor += cell_slab;

        if walker.advance(cell_slab, &dims) {
            break;
        }
    }
    state.copy_tile_slab_done = true;
    state.current_offsets = walker.pos;

    for array_idx in 0..local_offsets.len() {
        let user_idx = (local_offsets[array_idx] - 1) as usize;
        let start = user_offsets[user_idx] as usize;
        let end = if (user_idx as i64) + 1 < total_user_cells {
            user_offsets[user_idx + 1] as usize
        } else {
            user_payload.len()
        };
        let bytes = &user_payload[start..end];

        grow_payload_for(local_payload, bytes.len());
        let offset = local_payload.len() as u64;
        local_payload.extend_from_slice(bytes);
        local_offsets[array_idx] = offset;
    }
}
