//! Buffer pool
//!
//! A reclaim pool of heap buffers for the filter pipeline, grounded on
//! the original's `FilterStorage`: buffers are handed out via
//! [`BufferPool::get_buffer`], tracked while in use, and returned to the
//! pool automatically when the caller drops its [`PooledBuffer`] handle
//! (spec §3 "Buffer pool").
//!
//! The original tracks `available_`/`in_use_` as two intrusive lists plus
//! a pointer-keyed map back to the owning list. This crate gets the same
//! behavior for free from RAII: a [`PooledBuffer`]'s `Drop` impl is the
//! `reclaim()` call, so there is no way to leak a buffer out of the
//! in-use set by forgetting to reclaim it.

use crossbeam::queue::SegQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct PoolInner {
    available: SegQueue<Vec<u8>>,
    available_count: AtomicUsize,
    in_use_count: AtomicUsize,
}

/// A pool of reusable byte buffers.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferPool {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(PoolInner {
                available: SegQueue::new(),
                available_count: AtomicUsize::new(0),
                in_use_count: AtomicUsize::new(0),
            }),
        }
    }

    /// Returns a buffer of at least `min_capacity` bytes, reusing a
    /// reclaimed buffer when one of sufficient capacity is available.
    pub fn get_buffer(&self, min_capacity: usize) -> PooledBuffer {
        let mut buf = match self.inner.available.pop() {
            Some(b) => {
                self.inner.available_count.fetch_sub(1, Ordering::AcqRel);
                b
            }
            None => Vec::new(),
        };
        if buf.capacity() < min_capacity {
            buf.reserve(min_capacity - buf.capacity());
        }
        buf.clear();
        self.inner.in_use_count.fetch_add(1, Ordering::AcqRel);
        PooledBuffer {
            data: Some(buf),
            pool: self.inner.clone(),
        }
    }

    /// Number of buffers currently sitting idle in the pool.
    pub fn num_available(&self) -> usize {
        self.inner.available_count.load(Ordering::Acquire)
    }

    /// Number of buffers currently checked out to callers.
    pub fn num_in_use(&self) -> usize {
        self.inner.in_use_count.load(Ordering::Acquire)
    }
}

/// A buffer checked out of a [`BufferPool`]. Returned to the pool when
/// dropped.
pub struct PooledBuffer {
    data: Option<Vec<u8>>,
    pool: Arc<PoolInner>,
}

impl PooledBuffer {
    pub fn as_slice(&self) -> &[u8] {
        self.data.as_ref().expect("buffer taken")
    }

    pub fn as_mut_vec(&mut self) -> &mut Vec<u8> {
        self.data.as_mut().expect("buffer taken")
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(buf) = self.data.take() {
            self.pool.available.push(buf);
            self.pool.available_count.fetch_add(1, Ordering::AcqRel);
        }
        self.pool.in_use_count.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_buffer_tracks_in_use() {
        let pool = BufferPool::new();
        assert_eq!(pool.num_in_use(), 0);
        let buf = pool.get_buffer(16);
        assert_eq!(pool.num_in_use(), 1);
        assert_eq!(pool.num_available(), 0);
        drop(buf);
        assert_eq!(pool.num_in_use(), 0);
        assert_eq!(pool.num_available(), 1);
    }

    #[test]
    fn test_reclaimed_buffer_is_reused() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.get_buffer(64);
            buf.as_mut_vec().extend_from_slice(&[1, 2, 3]);
        }
        assert_eq!(pool.num_available(), 1);
        let buf2 = pool.get_buffer(8);
        // Cleared on reuse, but capacity should have been retained.
        assert!(buf2.as_slice().is_empty());
        assert_eq!(pool.num_available(), 0);
        assert_eq!(pool.num_in_use(), 1);
    }

    #[test]
    fn test_multiple_outstanding_buffers() {
        let pool = BufferPool::new();
        let b1 = pool.get_buffer(8);
        let b2 = pool.get_buffer(8);
        assert_eq!(pool.num_in_use(), 2);
        drop(b1);
        assert_eq!(pool.num_in_use(), 1);
        assert_eq!(pool.num_available(), 1);
        drop(b2);
        assert_eq!(pool.num_in_use(), 0);
        assert_eq!(pool.num_available(), 2);
    }
}
