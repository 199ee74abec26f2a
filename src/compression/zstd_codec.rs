//! Zstd codec
//!
//! Thin wrapper over the `zstd` crate. Compression/decompression
//! contexts are expensive to allocate (each carries its own sizable
//! working memory), so this module keeps a small bounded pool of each,
//! acquired with a blocking recv on a `crossbeam::channel` — an
//! application of the "single-capacity channel" pattern spec §9
//! recommends for the coordinator's slot handshake, reused here for a
//! resource pool instead (spec §4.8, §5).

use crate::error::{Error, Result};
use crossbeam::channel::{bounded, Receiver, Sender};
use std::sync::OnceLock;
use zstd::bulk::{Compressor, Decompressor};

pub const DEFAULT_LEVEL: i32 = 3;
const POOL_SIZE: usize = 4;

struct ContextPool<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> ContextPool<T> {
    fn new(make: impl Fn() -> T, size: usize) -> Self {
        let (tx, rx) = bounded(size);
        for _ in 0..size {
            let _ = tx.send(make());
        }
        Self { tx, rx }
    }

    /// Blocking acquire: waits for a context to become available.
    fn acquire(&self) -> T {
        self.rx.recv().expect("zstd context pool sender dropped")
    }

    fn release(&self, ctx: T) {
        let _ = self.tx.send(ctx);
    }
}

fn compressor_pool() -> &'static ContextPool<Compressor<'static>> {
    static POOL: OnceLock<ContextPool<Compressor<'static>>> = OnceLock::new();
    POOL.get_or_init(|| {
        ContextPool::new(
            || Compressor::new(DEFAULT_LEVEL).expect("zstd compressor init"),
            POOL_SIZE,
        )
    })
}

fn decompressor_pool() -> &'static ContextPool<Decompressor<'static>> {
    static POOL: OnceLock<ContextPool<Decompressor<'static>>> = OnceLock::new();
    POOL.get_or_init(|| {
        ContextPool::new(
            || Decompressor::new().expect("zstd decompressor init"),
            POOL_SIZE,
        )
    })
}

/// Zstd has no fixed maximum level here; values below 1 clamp to the
/// default (spec §4.7).
pub fn clamp_level(level: i32) -> i32 {
    if level < 1 {
        DEFAULT_LEVEL
    } else {
        level
    }
}

pub fn compress(input: &[u8], level: i32) -> Result<Vec<u8>> {
    let level = clamp_level(level);
    let pool = compressor_pool();
    let mut ctx = pool.acquire();
    ctx.set_compression_level(level)
        .map_err(|e| Error::Compression(format!("zstd set level failed: {}", e)))?;
    let result = ctx
        .compress(input)
        .map_err(|e| Error::Compression(format!("zstd compression failed: {}", e)));
    pool.release(ctx);
    result
}

pub fn decompress(input: &[u8], orig_size_hint: usize) -> Result<Vec<u8>> {
    let pool = decompressor_pool();
    let mut ctx = pool.acquire();
    let result = ctx
        .decompress(input, orig_size_hint.max(input.len()))
        .map_err(|e| Error::Compression(format!("zstd decompression failed: {}", e)));
    pool.release(ctx);
    result
}

/// Worst-case expansion per the zstd frame format.
pub fn overhead(nbytes: usize) -> usize {
    (nbytes / 200) + 128
}
