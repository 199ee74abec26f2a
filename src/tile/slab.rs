//! Tile-slab iterator
//!
//! A tile slab is the portion of the (expanded) subarray that lies
//! within a single row (row-major array order) or column (column-major
//! array order) of tiles along the array order's slowest-varying
//! dimension. The iterator walks the expanded subarray one tile-slab at
//! a time, advancing the slowest-varying dimension by one tile extent
//! per step (spec §4.1).
//!
//! Grounded on the original's tile-slab bookkeeping in
//! `array_sorted_write_state`/`array_sorted_read_state`
//! (`tile_slab_`, `tile_domain_`, `expanded_subarray_`).

use crate::coord::{CellOrder, Coordinate, Range, Subarray};

/// Per-dimension tile extents. Only meaningful for dense, integer-typed
/// domains; floating-point dimensions have no tile extents (spec §3).
#[derive(Debug, Clone)]
pub struct TileExtent {
    pub extents: Vec<u64>,
}

impl TileExtent {
    pub fn new(extents: Vec<u64>) -> Self {
        Self { extents }
    }

    pub fn dim_num(&self) -> usize {
        self.extents.len()
    }
}

/// The subarray rounded outward to whole tile boundaries in every
/// dimension, as required before a dense ordered read/write can be
/// expressed in terms of complete tile slabs (spec §4.1).
#[derive(Debug, Clone)]
pub struct ExpandedSubarray<T: Coordinate> {
    pub ranges: Subarray<T>,
}

impl<T: Coordinate> ExpandedSubarray<T> {
    /// Rounds every dimension of `subarray` outward to the nearest tile
    /// boundary relative to `domain_origin`.
    pub fn compute(
        subarray: &Subarray<T>,
        domain_origin: &[T],
        tile_extents: &TileExtent,
    ) -> Self {
        let ranges = subarray
            .iter()
            .zip(domain_origin.iter())
            .zip(tile_extents.extents.iter())
            .map(|((r, &origin), &extent)| round_up_to_tile_boundary(r, origin, extent))
            .collect();
        ExpandedSubarray { ranges }
    }
}

/// Rounds a single-dimension range `[lo, hi]` outward to whole multiples
/// of `extent` tiles counted from `origin`.
fn round_up_to_tile_boundary<T: Coordinate>(r: &Range<T>, origin: T, extent: u64) -> Range<T> {
    let extent = extent as i64;
    let origin_i = origin.to_i64();
    let lo_tile = (r.lo.to_i64() - origin_i).div_euclid(extent);
    let hi_tile = (r.hi.to_i64() - origin_i).div_euclid(extent);
    let lo = T::from_i64(origin_i + lo_tile * extent);
    let hi = T::from_i64(origin_i + (hi_tile + 1) * extent - 1);
    Range::new(lo, hi)
}

/// One tile-slab: the subarray's extent along every dimension, narrowed
/// along the array order's slowest-varying dimension to a single tile's
/// width.
#[derive(Debug, Clone)]
pub struct TileSlab<T: Coordinate> {
    pub ranges: Subarray<T>,
}

impl<T: Coordinate> TileSlab<T> {
    /// Number of cells this slab covers.
    pub fn cell_num(&self) -> i64 {
        self.ranges.iter().map(Range::len).product()
    }
}

/// Walks an [`ExpandedSubarray`] one tile-slab at a time along the array
/// order's slowest-varying dimension.
pub struct TileSlabIterator<T: Coordinate> {
    expanded: Subarray<T>,
    tile_extents: TileExtent,
    domain_origin: Vec<T>,
    slowest_dim: usize,
    cursor: Option<T>,
}

impl<T: Coordinate> TileSlabIterator<T> {
    pub fn new(
        expanded: ExpandedSubarray<T>,
        tile_extents: TileExtent,
        domain_origin: Vec<T>,
        array_order: CellOrder,
    ) -> Self {
        let dim_num = expanded.ranges.len();
        let slowest_dim = array_order.slowest_dim(dim_num);
        let cursor = Some(expanded.ranges[slowest_dim].lo);
        Self {
            expanded: expanded.ranges,
            tile_extents,
            domain_origin,
            slowest_dim,
            cursor,
        }
    }

    /// Returns the next tile slab, or `None` once the expanded subarray
    /// has been fully consumed.
    pub fn next_slab(&mut self) -> Option<TileSlab<T>> {
        let lo = self.cursor?;
        let full_hi = self.expanded[self.slowest_dim].hi;
        let extent = self.tile_extents.extents[self.slowest_dim] as i64;
        let origin = self.domain_origin[self.slowest_dim].to_i64();
        let tile_idx = (lo.to_i64() - origin).div_euclid(extent);
        let slab_hi_unclamped = T::from_i64(origin + (tile_idx + 1) * extent - 1);
        let hi = if slab_hi_unclamped.to_i64() > full_hi.to_i64() {
            full_hi
        } else {
            slab_hi_unclamped
        };

        let mut ranges = self.expanded.clone();
        ranges[self.slowest_dim] = Range::new(lo, hi);

        self.cursor = if hi.to_i64() >= full_hi.to_i64() {
            None
        } else {
            Some(hi.increment())
        };

        Some(TileSlab { ranges })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense_domain() -> (Subarray<i32>, Vec<i32>, TileExtent) {
        let subarray = vec![Range::new(0, 9), Range::new(0, 9)];
        let origin = vec![0, 0];
        let extents = TileExtent::new(vec![4, 4]);
        (subarray, origin, extents)
    }

    #[test]
    fn test_round_up_to_tile_boundary() {
        let r = Range::new(2i32, 5i32);
        let rounded = round_up_to_tile_boundary(&r, 0, 4);
        assert_eq!(rounded, Range::new(0, 7));
    }

    #[test]
    fn test_expanded_subarray_rounds_every_dim() {
        let (subarray, origin, extents) = dense_domain();
        let expanded = ExpandedSubarray::compute(&subarray, &origin, &extents);
        assert_eq!(expanded.ranges[0], Range::new(0, 11));
        assert_eq!(expanded.ranges[1], Range::new(0, 11));
    }

    #[test]
    fn test_tile_slab_iterator_row_major_covers_whole_subarray() {
        let (subarray, origin, extents) = dense_domain();
        let expanded = ExpandedSubarray::compute(&subarray, &origin, &extents);
        let mut it =
            TileSlabIterator::new(expanded, extents, origin, CellOrder::RowMajor);

        let mut slabs = Vec::new();
        while let Some(slab) = it.next_slab() {
            slabs.push(slab);
        }
        // Slowest dim (0) spans [0,11] in tiles of extent 4: 3 slabs.
        assert_eq!(slabs.len(), 3);
        assert_eq!(slabs[0].ranges[0], Range::new(0, 3));
        assert_eq!(slabs[1].ranges[0], Range::new(4, 7));
        assert_eq!(slabs[2].ranges[0], Range::new(8, 11));
        for s in &slabs {
            assert_eq!(s.ranges[1], Range::new(0, 11));
        }
    }

    #[test]
    fn test_tile_slab_iterator_col_major_uses_last_dim_as_slowest() {
        let (subarray, origin, extents) = dense_domain();
        let expanded = ExpandedSubarray::compute(&subarray, &origin, &extents);
        let mut it =
            TileSlabIterator::new(expanded, extents, origin, CellOrder::ColMajor);

        let first = it.next_slab().unwrap();
        assert_eq!(first.ranges[1], Range::new(0, 3));
        assert_eq!(first.ranges[0], Range::new(0, 11));
    }

    #[test]
    fn test_cell_num() {
        let slab = TileSlab {
            ranges: vec![Range::new(0i32, 3i32), Range::new(0i32, 9i32)],
        };
        assert_eq!(slab.cell_num(), 40);
    }
}
