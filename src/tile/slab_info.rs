//! Slab-info calculator
//!
//! Works out, for a given tile slab, how many cells a maximal contiguous
//! run ("cell slab") covers and how many such runs the slab contains.
//! This depends on both the user's requested cell order and the array's
//! native cell order, so there are four cases. The original specialized
//! a template per `(user_order, array_order)` pair
//! (`calculate_cell_slab_info_row_col_s<T>` and its three siblings); this
//! crate keeps the four cases as plain functions dispatched once by
//! [`TileSlabInfo::calculate`], generic over [`Coordinate`] instead of
//! duplicated per coordinate type (spec §4.2, §9).
//!
//! When the user order matches the array order, a run of cells stays
//! contiguous across a dimension boundary only while the slab has
//! exactly one tile along that dimension; otherwise storage groups cells
//! by tile first, breaking contiguity (spec §4.2's "optionally extended
//! inward across dimensions whose tile-domain length is 1"). When the
//! orders are opposite, no two distinct cells are ever contiguous in
//! both orders at once, so the cell slab degenerates to a single cell
//! (spec §4.2 "user≠array: cell slab has length 1").

use crate::coord::{CellOrder, Coordinate};
use crate::tile::slab::{TileExtent, TileSlab};

/// Per-tile-slab geometry needed by the copy engine: how large a
/// contiguous cell slab is, how many of them make up the tile slab, and
/// the per-dimension tile/cell offsets used to walk them in array order.
#[derive(Debug, Clone)]
pub struct TileSlabInfo {
    /// Cell count of one maximal contiguous run (spec §3 "cell slab").
    pub cell_slab_size: i64,
    /// Total number of cell slabs covering the whole tile slab.
    pub cell_slab_num: i64,
    /// Per-dimension multipliers mapping an in-tile coordinate to the
    /// cell's linear position within the tile, in array cell order.
    pub cell_offset_per_dim: Vec<i64>,
    /// Number of tiles overlapped by the slab.
    pub tile_num: i64,
    /// Tiles-per-dimension shape of the slab (each entry is the count of
    /// whole tiles the slab spans along that dimension).
    pub tile_grid_shape: Vec<i64>,
    /// Per-dimension multipliers mapping a tile coordinate to the
    /// tile's linear index within the slab, in array tile order.
    pub tile_offset_per_dim: Vec<i64>,
}

impl TileSlabInfo {
    /// Computes slab info for `slab` given the tile grid's per-dimension
    /// extents and the `(user_order, array_order)` pairing.
    pub fn calculate<T: Coordinate>(
        slab: &TileSlab<T>,
        tile_extents: &TileExtent,
        user_order: CellOrder,
        array_order: CellOrder,
    ) -> Self {
        let dim_num = slab.ranges.len();
        let tile_grid_shape = Self::tile_grid_shape(slab, tile_extents);
        let tile_num: i64 = tile_grid_shape.iter().product();
        let tile_cell_num: i64 = tile_extents.extents.iter().map(|&e| e as i64).product();
        let total_cells = tile_cell_num * tile_num;

        let cell_offset_per_dim = Self::offset_per_dim(
            dim_num,
            array_order,
            &tile_extents.extents.iter().map(|&e| e as i64).collect::<Vec<_>>(),
        );
        let tile_offset_per_dim = Self::offset_per_dim(dim_num, array_order, &tile_grid_shape);

        let cell_slab_size = if user_order == array_order {
            Self::matching_cell_slab_size(&tile_grid_shape, tile_extents, array_order)
        } else {
            1
        };
        let cell_slab_num = if cell_slab_size == 0 { 0 } else { total_cells / cell_slab_size };

        Self {
            cell_slab_size,
            cell_slab_num,
            cell_offset_per_dim,
            tile_num,
            tile_grid_shape,
            tile_offset_per_dim,
        }
    }

    /// Number of whole tiles the slab spans along each dimension. The
    /// slab is always tile-aligned (it is carved from an already
    /// tile-expanded subarray, spec §4.1), so this divides evenly.
    fn tile_grid_shape<T: Coordinate>(slab: &TileSlab<T>, tile_extents: &TileExtent) -> Vec<i64> {
        slab.ranges
            .iter()
            .zip(tile_extents.extents.iter())
            .map(|(r, &extent)| {
                let len = r.len();
                let extent = extent as i64;
                (len + extent - 1) / extent
            })
            .collect()
    }

    /// Cell slab length when user and array order agree: the innermost
    /// (fastest-varying, in array order) dimension's full tile extent,
    /// extended into the next slower dimension only while the slab has
    /// exactly one tile along the dimension just included (spec §4.2).
    fn matching_cell_slab_size(
        tile_grid_shape: &[i64],
        tile_extents: &TileExtent,
        array_order: CellOrder,
    ) -> i64 {
        let dim_num = tile_grid_shape.len();
        let mut size = 1i64;
        for d in array_order.dims_fast_to_slow(dim_num) {
            size *= tile_extents.extents[d] as i64;
            if tile_grid_shape[d] != 1 {
                break;
            }
        }
        size
    }

    /// Cumulative per-dimension multipliers in array order, used to map
    /// a coordinate (in tile units, or in cell-within-tile units) to its
    /// linear position (mirrors `TileSlabInfo::cell_offset_per_dim_` /
    /// `tile_offset_per_dim_`).
    fn offset_per_dim(dim_num: usize, array_order: CellOrder, lengths: &[i64]) -> Vec<i64> {
        let mut offsets = vec![0i64; dim_num];
        match array_order {
            CellOrder::RowMajor => {
                let mut acc = 1i64;
                for d in (0..dim_num).rev() {
                    offsets[d] = acc;
                    acc *= lengths[d];
                }
            }
            CellOrder::ColMajor => {
                let mut acc = 1i64;
                for d in 0..dim_num {
                    offsets[d] = acc;
                    acc *= lengths[d];
                }
            }
        }
        offsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Range;

    fn slab_2x2_tiles_of_4x4() -> TileSlab<i32> {
        TileSlab {
            ranges: vec![Range::new(0, 3), Range::new(0, 7)],
        }
    }

    #[test]
    fn test_matching_orders_merges_single_tile_dims() {
        let slab = slab_2x2_tiles_of_4x4();
        let extents = TileExtent::new(vec![4, 4]);
        // dim0 has exactly one tile in the slab, dim1 has two.
        let info =
            TileSlabInfo::calculate(&slab, &extents, CellOrder::RowMajor, CellOrder::RowMajor);
        // Fastest (dim1) tile-domain length is 2, so the merge stops
        // after including dim1 alone: one tile-row per cell slab.
        assert_eq!(info.cell_slab_size, 4);
        assert_eq!(info.tile_num, 2);
        assert_eq!(info.cell_slab_num, 8);
    }

    #[test]
    fn test_matching_orders_single_tile_in_faster_dim_merges_fully() {
        // A slab exactly one tile wide in both dimensions: the whole
        // tile is one cell slab.
        let slab = TileSlab {
            ranges: vec![Range::new(0i32, 3i32), Range::new(0i32, 3i32)],
        };
        let extents = TileExtent::new(vec![4, 4]);
        let info =
            TileSlabInfo::calculate(&slab, &extents, CellOrder::RowMajor, CellOrder::RowMajor);
        assert_eq!(info.cell_slab_size, 16);
        assert_eq!(info.tile_num, 1);
        assert_eq!(info.cell_slab_num, 1);
    }

    #[test]
    fn test_opposite_orders_cell_slab_is_single_cell() {
        let slab = slab_2x2_tiles_of_4x4();
        let extents = TileExtent::new(vec![4, 4]);
        let info =
            TileSlabInfo::calculate(&slab, &extents, CellOrder::RowMajor, CellOrder::ColMajor);
        assert_eq!(info.cell_slab_size, 1);
        assert_eq!(info.tile_num, 2);
        assert_eq!(info.cell_slab_num, 32);
    }

    #[test]
    fn test_cell_offset_per_dim_row_major() {
        let slab = TileSlab {
            ranges: vec![Range::new(0i32, 1i32), Range::new(0i32, 2i32), Range::new(0i32, 3i32)],
        };
        let extents = TileExtent::new(vec![2, 3, 4]);
        let info = TileSlabInfo::calculate(&slab, &extents, CellOrder::RowMajor, CellOrder::RowMajor);
        assert_eq!(info.cell_offset_per_dim, vec![12, 4, 1]);
    }

    #[test]
    fn test_cell_offset_per_dim_col_major() {
        let slab = TileSlab {
            ranges: vec![Range::new(0i32, 1i32), Range::new(0i32, 2i32), Range::new(0i32, 3i32)],
        };
        let extents = TileExtent::new(vec![2, 3, 4]);
        let info = TileSlabInfo::calculate(&slab, &extents, CellOrder::ColMajor, CellOrder::ColMajor);
        assert_eq!(info.cell_offset_per_dim, vec![1, 2, 6]);
    }

    #[test]
    fn test_tile_offset_per_dim_matches_cell_offset_shape() {
        let slab = slab_2x2_tiles_of_4x4();
        let extents = TileExtent::new(vec![4, 4]);
        let info =
            TileSlabInfo::calculate(&slab, &extents, CellOrder::RowMajor, CellOrder::RowMajor);
        assert_eq!(info.tile_grid_shape, vec![1, 2]);
        // Row-major tile order: dim1 (fastest) has stride 1, dim0 stride 2.
        assert_eq!(info.tile_offset_per_dim, vec![2, 1]);
    }
}
