//! arraykit-core - the ordered cell re-layout and filter pipeline core
//! of a tiled, multi-dimensional array store.
//!
//! This crate re-orders cells between a user's requested dimension
//! order and an array's on-disk tile/cell order one tile slab at a
//! time, applies a configurable chain of compression and encoding
//! filters to each tile, and overlaps a slab's I/O with the copy of the
//! slab before it.
//!
//! # Examples
//!
//! ## Re-ordering a tile slab
//!
//! ```
//! use arraykit_core::coord::{CellOrder, Range};
//! use arraykit_core::tile::{
//!     copy_tile_slab_read, CopyState, OverflowFlag, TileExtent, TileSlab, TileSlabInfo,
//!     TileSlabState,
//! };
//!
//! let slab: TileSlab<i32> = TileSlab { ranges: vec![Range::new(0, 3), Range::new(0, 3)] };
//! let tile_extents = TileExtent::new(vec![4, 4]);
//! let info = TileSlabInfo::calculate(&slab, &tile_extents, CellOrder::RowMajor, CellOrder::RowMajor);
//!
//! let local = vec![0u8; 16 * 4];
//! let mut state: TileSlabState<i32> = TileSlabState::new(vec![0, 0], 2);
//! let mut copy_state = CopyState::new([16 * 4, 0]);
//! let mut user_buf = vec![0u8; 16 * 4];
//! let flag = copy_tile_slab_read(
//!     &info, &slab, &tile_extents, CellOrder::RowMajor, 4,
//!     &local, &mut state, &mut copy_state, &mut user_buf,
//! );
//! assert_eq!(flag, OverflowFlag::None);
//! ```
//!
//! ## Running a tile through the filter pipeline
//!
//! ```
//! use arraykit_core::compression::{gzip, Compressor};
//! use arraykit_core::filter::{FilterPipeline, FilterStage};
//!
//! let pipeline = FilterPipeline::with_stages(vec![FilterStage::Compression(
//!     Compressor::Gzip { level: gzip::DEFAULT_LEVEL },
//! )])
//! .unwrap();
//! let tile: Vec<u8> = (0..512u32).map(|v| (v % 97) as u8).collect();
//! let (meta, data) = pipeline.forward(&tile, None).unwrap();
//! let (decoded, _) = pipeline.reverse(&meta, &data).unwrap();
//! assert_eq!(decoded, tile);
//! ```

pub mod buffer;
pub mod compression;
pub mod coord;
pub mod endian;
pub mod error;
pub mod filter;
pub mod scoped_executor;
pub mod tile;

pub use buffer::{BufferPool, FilterBuffer, PooledBuffer};
pub use compression::Compressor;
pub use coord::{CellOrder, Coordinate, Datatype, Range, Subarray};
pub use error::{Error, Result};
pub use filter::{FilterPipeline, FilterStage};
pub use tile::{
    copy_tile_slab_read, copy_tile_slab_read_var, copy_tile_slab_write, copy_tile_slab_write_var,
    Coordinator, CopyState, ExpandedSubarray, OverflowFlag, ResumeState, TileExtent, TileSlab,
    TileSlabInfo, TileSlabState,
};
