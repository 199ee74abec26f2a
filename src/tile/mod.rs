//! Ordered cell re-layout pipeline
//!
//! Implements the user-order <-> array-order cell re-layout described in
//! spec §4: a tile-slab iterator walks the overlap between a user
//! subarray and the array's tile grid one tile-slab at a time, a
//! slab-info calculator works out cell-slab extents for a given
//! `(user_order, array_order)` pairing, a copy engine moves cell slabs
//! between the array's tile layout and the user's flat buffer, and an
//! async coordinator overlaps I/O for the next slab with copying of the
//! current one.
//!
//! Grounded on the original's `array_sorted_write_state`/
//! `array_sorted_read_state` (`ASWS_Data`, `TileSlabInfo`,
//! `TileSlabState`, `CopyState`).

pub mod copy_engine;
pub mod coordinator;
pub mod slab;
pub mod slab_info;
pub mod state;

pub use copy_engine::{
    copy_tile_slab_read, copy_tile_slab_read_var, copy_tile_slab_write, copy_tile_slab_write_var,
    fill_empty, DEFAULT_AVG_VAR_CELL_LEN,
};
pub use coordinator::{requires_new_fragment, Coordinator, IoExecutor, ResumeState, ThreadExecutor};
pub use slab::{ExpandedSubarray, TileExtent, TileSlab};
pub use slab_info::TileSlabInfo;
pub use state::{CopyState, OverflowFlag, TileSlabState};
