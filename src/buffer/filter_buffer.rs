//! Scatter/gather filter buffer
//!
//! Grounded on the original's `FilterBuffer`/`BufferOrView`: a filter
//! stage's output is not always a single contiguous allocation. A
//! pass-through stage (e.g. `NO_COMPRESSION`) wants to hand its input
//! along untouched; a stage that *does* transform bytes wants to append
//! freshly written segments, and the compression filter wants to prepend
//! a metadata header once the body has already been written. A single
//! logical byte stream stitched together from owned and borrowed
//! segments covers all three without a copy (spec §3 "Filter buffer").

use crate::error::{Error, Result};
use std::sync::Arc;

/// One segment of a [`FilterBuffer`]: either bytes this buffer owns, or a
/// read-only view into bytes owned elsewhere.
enum Segment {
    Owned(Vec<u8>),
    View(Arc<Vec<u8>>, usize, usize),
}

impl Segment {
    fn len(&self) -> usize {
        match self {
            Segment::Owned(v) => v.len(),
            Segment::View(_, _, len) => *len,
        }
    }

    fn as_slice(&self) -> &[u8] {
        match self {
            Segment::Owned(v) => v.as_slice(),
            Segment::View(base, offset, len) => &base[*offset..*offset + len],
        }
    }
}

/// A scatter/gather byte buffer used throughout the filter pipeline.
pub struct FilterBuffer {
    segments: Vec<Segment>,
    /// Logical read/write cursor into the concatenated segment stream.
    offset: usize,
    read_only: bool,
    /// When set, the buffer may not grow past this many total bytes; a
    /// single `Owned` segment is pre-reserved to that capacity.
    fixed_allocation: Option<usize>,
    /// Whether the one permitted prepend-or-append has already happened
    /// since `set_fixed_allocation` (spec §4.5: "at most one
    /// prepend-or-append operation; further mutation is rejected").
    fixed_alloc_used: bool,
}

impl Default for FilterBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterBuffer {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            offset: 0,
            read_only: false,
            fixed_allocation: None,
            fixed_alloc_used: false,
        }
    }

    /// Initializes the buffer with a single owned, empty segment reserved
    /// to `capacity` bytes.
    pub fn init(&mut self, capacity: usize) {
        self.segments.clear();
        self.segments.push(Segment::Owned(Vec::with_capacity(capacity)));
        self.offset = 0;
    }

    /// Marks this buffer as a single fixed-capacity allocation: writes
    /// that would grow it past `capacity` bytes fail instead of
    /// reallocating. Used for output buffers sized by an upper bound
    /// computed up front (spec §4.7 `overhead()`).
    pub fn set_fixed_allocation(&mut self, capacity: usize) {
        self.segments.clear();
        self.segments.push(Segment::Owned(Vec::with_capacity(capacity)));
        self.offset = 0;
        // The single segment above already is the one buffer a
        // fixed-allocation caller gets to reuse; any further
        // `prepend_buffer`/`append_view` call is the "one follow-up"
        // spec §4.5 allows at most once, and that slot is consumed by
        // construction here, so it is rejected too.
        self.fixed_allocation = Some(capacity);
        self.fixed_alloc_used = true;
    }

    /// Consumes the one permitted prepend-or-append in fixed-allocation
    /// mode, erroring if it was already used. A no-op (always `Ok`) when
    /// the buffer isn't in fixed-allocation mode.
    fn consume_fixed_alloc_slot(&mut self) -> Result<()> {
        if self.fixed_allocation.is_some() {
            if self.fixed_alloc_used {
                return Err(Error::FixedAllocViolation(
                    "fixed-allocation buffer permits only one prepend-or-append".into(),
                ));
            }
            self.fixed_alloc_used = true;
        }
        Ok(())
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn num_buffers(&self) -> usize {
        self.segments.len()
    }

    /// Total size in bytes across all segments.
    pub fn size(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }

    /// Size in bytes of the `i`-th segment.
    pub fn buffer_size(&self, i: usize) -> usize {
        self.segments[i].len()
    }

    /// Borrows the `i`-th segment's bytes.
    pub fn buffer_ptr(&self, i: usize) -> &[u8] {
        self.segments[i].as_slice()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub fn reset_offset(&mut self) {
        self.offset = 0;
    }

    pub fn advance_offset(&mut self, nbytes: usize) {
        self.offset += nbytes;
    }

    /// Drops all segments and resets the cursor. Does not clear
    /// `read_only`/`fixed_allocation` flags.
    pub fn clear(&mut self) {
        self.segments.clear();
        self.offset = 0;
    }

    /// Appends a zero-copy view onto bytes owned elsewhere, e.g. to pass
    /// an upstream filter's output through untouched (spec §4.7
    /// `NO_COMPRESSION`).
    pub fn append_view(&mut self, base: Arc<Vec<u8>>, offset: usize, len: usize) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnly("append_view on read-only FilterBuffer".into()));
        }
        self.consume_fixed_alloc_slot()?;
        self.segments.push(Segment::View(base, offset, len));
        Ok(())
    }

    /// Inserts a new owned, empty segment at the front, reserved to
    /// `capacity` bytes. Used to write a metadata header after the body
    /// it describes has already been produced (spec §4.7).
    pub fn prepend_buffer(&mut self, capacity: usize) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnly("prepend_buffer on read-only FilterBuffer".into()));
        }
        self.consume_fixed_alloc_slot()?;
        self.segments
            .insert(0, Segment::Owned(Vec::with_capacity(capacity)));
        self.offset = 0;
        Ok(())
    }

    /// Appends bytes to the last segment, starting a new owned segment if
    /// the buffer is empty or the last segment is a view. Vec's own
    /// geometric (amortized-doubling) growth handles reallocation for
    /// unbounded buffers; a `fixed_allocation` buffer instead errors
    /// once its reserved capacity would be exceeded.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnly("write on read-only FilterBuffer".into()));
        }
        if let Some(cap) = self.fixed_allocation {
            if self.size() + data.len() > cap {
                return Err(Error::FixedAllocViolation(format!(
                    "write of {} bytes would exceed fixed allocation of {} bytes",
                    data.len(),
                    cap
                )));
            }
        }
        match self.segments.last_mut() {
            Some(Segment::Owned(v)) => v.extend_from_slice(data),
            _ => self.segments.push(Segment::Owned(data.to_vec())),
        }
        Ok(())
    }

    fn locate(&self, mut global_offset: usize) -> Option<(usize, usize)> {
        for (i, seg) in self.segments.iter().enumerate() {
            if global_offset < seg.len() {
                return Some((i, global_offset));
            }
            global_offset -= seg.len();
        }
        if global_offset == 0 {
            Some((self.segments.len(), 0))
        } else {
            None
        }
    }

    /// The remaining bytes of the segment the cursor currently sits in
    /// (not necessarily all remaining bytes in the buffer — mirrors the
    /// original's raw-pointer `cur_data()`, which only ever pointed into
    /// one physical allocation at a time).
    pub fn cur_data(&self) -> &[u8] {
        match self.locate(self.offset) {
            Some((seg_idx, local)) if seg_idx < self.segments.len() => {
                &self.segments[seg_idx].as_slice()[local..]
            }
            _ => &[],
        }
    }

    /// Reads exactly `dst.len()` bytes starting at the cursor, spanning
    /// segment boundaries as needed, and advances the cursor.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<()> {
        let mut remaining = dst;
        let mut global = self.offset;
        while !remaining.is_empty() {
            let (seg_idx, local) = self.locate(global).ok_or_else(|| {
                Error::BufferOverflow("read past end of FilterBuffer".into())
            })?;
            if seg_idx >= self.segments.len() {
                return Err(Error::BufferOverflow("read past end of FilterBuffer".into()));
            }
            let seg = self.segments[seg_idx].as_slice();
            let avail = seg.len() - local;
            let take = avail.min(remaining.len());
            remaining[..take].copy_from_slice(&seg[local..local + take]);
            remaining = &mut remaining[take..];
            global += take;
        }
        self.offset = global;
        Ok(())
    }

    /// Reads a fixed-width little-endian value at the cursor and
    /// advances it. Used for the small scalar reads the compression
    /// filter's metadata header needs (counts, per-part sizes).
    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read(&mut buf)?;
        Ok(u32::from_ne_bytes(buf))
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write(&value.to_ne_bytes())
    }

    /// Copies every byte from the cursor to the end of the buffer into
    /// `dst`, without advancing the cursor.
    pub fn copy_to(&self, dst: &mut Vec<u8>) {
        let mut global = self.offset;
        for seg in &self.segments {
            if global >= seg.len() {
                global -= seg.len();
                continue;
            }
            dst.extend_from_slice(&seg.as_slice()[global..]);
            global = 0;
        }
    }

    /// Exchanges contents with `other`, including the cursor and flags.
    pub fn swap(&mut self, other: &mut FilterBuffer) {
        std::mem::swap(&mut self.segments, &mut other.segments);
        std::mem::swap(&mut self.offset, &mut other.offset);
        std::mem::swap(&mut self.read_only, &mut other.read_only);
        std::mem::swap(&mut self.fixed_allocation, &mut other.fixed_allocation);
        std::mem::swap(&mut self.fixed_alloc_used, &mut other.fixed_alloc_used);
    }
}
