//! Async I/O coordinator
//!
//! A two-slot pipeline that overlaps the next slab's I/O with the
//! current slab's copy (spec §4.4). Each slot transitions `IDLE ->
//! SUBMITTED -> IN_FLIGHT -> COMPLETE -> IDLE`; this crate collapses
//! that into a slot either holding a pending completion receiver or not.
//!
//! The original's two `goto`-based resume points (`copy_label_1`,
//! `copy_label_2`) are reconstructed as the explicit [`ResumeState`]
//! variant the design notes call for (spec §4.4, §9), and the
//! pthreads mutex/condvar pair per slot is replaced with a bounded,
//! capacity-1 channel carrying the completion result (spec §9: "replace
//! with ... a single-capacity channel carrying the completion result").

use crate::coord::CellOrder;
use crate::error::{Error, Result};
use crossbeam::channel::{bounded, Receiver};

/// Where a previous call into the driver suspended, so the next call
/// resumes the interrupted copy instead of restarting the slab loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResumeState {
    #[default]
    None,
    /// Suspended mid-loop: slab `index`'s I/O has already completed and
    /// its copy overflowed. `index`'s own submission and wait are done,
    /// so resuming only retries `copy_slab(index)`; once that succeeds
    /// the loop continues submitting/waiting/copying slabs
    /// `index + 1 ..` exactly as if the interruption had not happened.
    PostMid { index: usize },
    /// Suspended after the last slab's completion was awaited and its
    /// copy overflowed; resuming retries `copy_slab(index)` only.
    PostEnd { index: usize },
}

/// The piece of the storage-manager collaborator (spec §6.1) that the
/// coordinator itself drives: running a task asynchronously and
/// invoking a completion callback without blocking the calling thread.
/// [`Coordinator`] is generic over this trait so tests can substitute a
/// synchronous fake executor without spawning real threads.
pub trait IoExecutor: Send + Sync {
    /// Runs `task` asynchronously, invoking `on_complete` with its
    /// result when done. Returns immediately.
    fn submit(
        &self,
        task: Box<dyn FnOnce() -> Result<()> + Send>,
        on_complete: Box<dyn FnOnce(Result<()>) + Send>,
    );
}

/// The full storage-manager collaborator of spec §6.1: the three
/// synchronous file operations plus the async submission behavior of
/// [`IoExecutor`]. This crate ships no concrete file-backed
/// implementation (raw file I/O is out of scope, spec §1); the three
/// file methods default to `NotSupported` so a type that only needs
/// `submit` (like [`ThreadExecutor`]) isn't forced to implement them.
pub trait StorageBackend: IoExecutor {
    fn read_from_file(&self, _uri: &str, _offset: u64, _dst: &mut [u8]) -> Result<()> {
        Err(Error::NotSupported("read_from_file".into()))
    }

    fn write_to_file(&self, _uri: &str, _src: &[u8]) -> Result<()> {
        Err(Error::NotSupported("write_to_file".into()))
    }

    fn file_size(&self, _uri: &str) -> Result<u64> {
        Err(Error::NotSupported("file_size".into()))
    }
}

/// `submit`-only backend: spawns one OS thread per submission, and has
/// no file backing (every sync method is `NotSupported`). Adequate for
/// tests and small pipelines; a production host would supply a pooled
/// or storage-manager-integrated backend instead.
#[derive(Debug, Default)]
pub struct ThreadExecutor;

impl IoExecutor for ThreadExecutor {
    fn submit(
        &self,
        task: Box<dyn FnOnce() -> Result<()> + Send>,
        on_complete: Box<dyn FnOnce(Result<()>) + Send>,
    ) {
        std::thread::spawn(move || {
            let result = task();
            on_complete(result);
        });
    }
}

impl StorageBackend for ThreadExecutor {}

enum Slot {
    Idle,
    InFlight(Receiver<Result<()>>),
}

/// Drives the two-slot read/write pipeline of spec §4.4. Generic over
/// the executor so tests can substitute a synchronous fake without
/// spawning real threads.
pub struct Coordinator<E: IoExecutor> {
    executor: E,
    slots: [Slot; 2],
    pub resume: ResumeState,
}

impl<E: IoExecutor> Coordinator<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            slots: [Slot::Idle, Slot::Idle],
            resume: ResumeState::None,
        }
    }

    /// Submits `task` on slot `id`, overwriting any prior (already
    /// completed) occupant. Per spec's ordering guarantee, a slot must
    /// never be resubmitted while a previous occupant is still in
    /// flight; callers always `wait_for_completion` first.
    pub fn submit(&mut self, id: usize, task: impl FnOnce() -> Result<()> + Send + 'static) {
        let (tx, rx) = bounded(1);
        self.executor.submit(
            Box::new(task),
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        );
        self.slots[id] = Slot::InFlight(rx);
    }

    /// Blocks until slot `id`'s in-flight submission completes,
    /// returning its result. A slot with nothing in flight is a no-op
    /// success (spec: `wait[id]` implies the slot is occupied).
    pub fn wait_for_completion(&mut self, id: usize) -> Result<()> {
        match std::mem::replace(&mut self.slots[id], Slot::Idle) {
            Slot::InFlight(rx) => rx
                .recv()
                .map_err(|_| Error::Storage("executor dropped completion channel".into()))?,
            Slot::Idle => Ok(()),
        }
    }

    /// Waits out every slot currently in flight without propagating
    /// their results, draining the pipeline before an error surfaces
    /// (spec §4.4 "On any failure the coordinator drains in-flight
    /// slots ... no slot may outlive the coordinator").
    pub fn drain(&mut self) {
        for id in 0..2 {
            if let Slot::InFlight(rx) = std::mem::replace(&mut self.slots[id], Slot::Idle) {
                let _ = rx.recv();
            }
        }
    }

    /// Runs the read loop of spec §4.4 over `num_slabs` slabs.
    /// `submit_slab(k)` enqueues slab `k`'s I/O; `copy_slab(k)` performs
    /// its copy and returns `true` if the copy overflowed (so the
    /// caller should stop and let the user retry with a larger buffer).
    /// Resumes from `self.resume` rather than restarting if a prior
    /// call suspended mid-loop, and — unlike simply re-running the copy
    /// that overflowed — continues submitting, waiting on, and copying
    /// every slab after it so a multi-slab read is never silently
    /// truncated at the first overflow.
    pub fn run_read(
        &mut self,
        num_slabs: usize,
        mut submit_slab: impl FnMut(&mut Self, usize),
        mut copy_slab: impl FnMut(usize) -> Result<bool>,
    ) -> Result<()> {
        if num_slabs == 0 {
            self.resume = ResumeState::None;
            return Ok(());
        }

        // `k` is the next iteration of the original `for k in 1..num_slabs`
        // loop to run; resuming from `PostMid { index }` retries only the
        // copy that overflowed (its submit and wait already happened) and
        // then falls through to the loop starting at `index + 1`.
        let mut k = match self.resume {
            ResumeState::None => {
                submit_slab(self, 0);
                1
            }
            ResumeState::PostMid { index } => {
                match copy_slab(index) {
                    Ok(true) => return Ok(()),
                    Ok(false) => {}
                    Err(e) => {
                        self.drain();
                        return Err(e);
                    }
                }
                index + 2
            }
            ResumeState::PostEnd { index } => {
                return match copy_slab(index) {
                    Ok(true) => Ok(()),
                    Ok(false) => {
                        self.resume = ResumeState::None;
                        Ok(())
                    }
                    Err(e) => {
                        self.drain();
                        Err(e)
                    }
                };
            }
        };

        while k < num_slabs {
            submit_slab(self, k);
            if let Err(e) = self.wait_for_completion((k - 1) % 2) {
                self.drain();
                return Err(e);
            }
            match copy_slab(k - 1) {
                Ok(true) => {
                    self.resume = ResumeState::PostMid { index: k - 1 };
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => {
                    self.drain();
                    return Err(e);
                }
            }
            k += 1;
        }

        if let Err(e) = self.wait_for_completion((num_slabs - 1) % 2) {
            self.drain();
            return Err(e);
        }
        match copy_slab(num_slabs - 1) {
            Ok(true) => {
                self.resume = ResumeState::PostEnd { index: num_slabs - 1 };
                Ok(())
            }
            Ok(false) => {
                self.resume = ResumeState::None;
                Ok(())
            }
            Err(e) => {
                self.drain();
                Err(e)
            }
        }
    }
}

/// Whether an outer write must start a new fragment because successive
/// slabs are not contiguous along the global cell order (spec §4.4
/// "Separate-fragment predicate"). Pure in `(user_order, tile_order)` so
/// the (out-of-scope) fragment-naming layer can call it directly.
pub fn requires_new_fragment(user_order: CellOrder, tile_order: CellOrder) -> bool {
    user_order != tile_order
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Runs submissions synchronously on the calling thread, so tests
    /// are deterministic without real concurrency.
    struct SyncExecutor;

    impl IoExecutor for SyncExecutor {
        fn submit(
            &self,
            task: Box<dyn FnOnce() -> Result<()> + Send>,
            on_complete: Box<dyn FnOnce(Result<()>) + Send>,
        ) {
            on_complete(task());
        }
    }

    #[test]
    fn test_requires_new_fragment() {
        assert!(!requires_new_fragment(CellOrder::RowMajor, CellOrder::RowMajor));
        assert!(requires_new_fragment(CellOrder::RowMajor, CellOrder::ColMajor));
        assert!(requires_new_fragment(CellOrder::ColMajor, CellOrder::RowMajor));
        assert!(!requires_new_fragment(CellOrder::ColMajor, CellOrder::ColMajor));
    }

    #[test]
    fn test_submit_and_wait_roundtrip() {
        let mut coord = Coordinator::new(SyncExecutor);
        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = ran.clone();
        coord.submit(0, move || {
            ran2.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        coord.wait_for_completion(0).unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_wait_on_idle_slot_is_noop() {
        let mut coord = Coordinator::new(SyncExecutor);
        assert!(coord.wait_for_completion(0).is_ok());
    }

    #[test]
    fn test_run_read_visits_every_slab_in_order() {
        let mut coord = Coordinator::new(SyncExecutor);
        let submitted = Arc::new(Mutex::new(Vec::new()));
        let copied = Arc::new(Mutex::new(Vec::new()));

        let submitted_cl = submitted.clone();
        let copied_cl = copied.clone();
        let result = coord.run_read(
            4,
            move |c, k| {
                submitted_cl.lock().unwrap().push(k);
                c.submit(k % 2, || Ok(()));
            },
            move |k| {
                copied_cl.lock().unwrap().push(k);
                Ok(false)
            },
        );
        assert!(result.is_ok());
        assert_eq!(*submitted.lock().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(*copied.lock().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(coord.resume, ResumeState::None);
    }

    #[test]
    fn test_run_read_zero_slabs_is_noop() {
        let mut coord = Coordinator::new(SyncExecutor);
        let result = coord.run_read(0, |_, _| {}, |_| Ok(false));
        assert!(result.is_ok());
        assert_eq!(coord.resume, ResumeState::None);
    }

    #[test]
    fn test_run_read_propagates_io_error_after_draining() {
        let mut coord = Coordinator::new(SyncExecutor);
        let result = coord.run_read(
            2,
            |c, k| {
                if k == 0 {
                    c.submit(0, || Err(Error::Storage("disk gone".into())));
                } else {
                    c.submit(1, || Ok(()));
                }
            },
            |_| Ok(false),
        );
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[test]
    fn test_run_read_overflow_sets_post_mid_resume() {
        let mut coord = Coordinator::new(SyncExecutor);
        let result = coord.run_read(
            3,
            |c, k| c.submit(k % 2, || Ok(())),
            |k| Ok(k == 0),
        );
        assert!(result.is_ok());
        assert_eq!(coord.resume, ResumeState::PostMid { index: 0 });
    }

    /// A multi-slab read whose first slab overflows must, once resumed,
    /// still submit/copy every remaining slab instead of reporting done
    /// after only the interrupted slab's retry.
    #[test]
    fn test_run_read_resumes_through_remaining_slabs() {
        let mut coord = Coordinator::new(SyncExecutor);
        let submitted = Arc::new(Mutex::new(Vec::new()));
        let copied = Arc::new(Mutex::new(Vec::new()));
        // Slab 0's copy overflows exactly once; every later call for any
        // slab succeeds, so the only interruption is the first one.
        let overflowed_once = Arc::new(AtomicUsize::new(0));

        let run = |coord: &mut Coordinator<SyncExecutor>| {
            let submitted_cl = submitted.clone();
            let copied_cl = copied.clone();
            let overflowed_once_cl = overflowed_once.clone();
            coord.run_read(
                5,
                move |c, k| {
                    submitted_cl.lock().unwrap().push(k);
                    c.submit(k % 2, || Ok(()));
                },
                move |k| {
                    copied_cl.lock().unwrap().push(k);
                    if k == 0 && overflowed_once_cl.fetch_add(1, Ordering::SeqCst) == 0 {
                        Ok(true)
                    } else {
                        Ok(false)
                    }
                },
            )
        };

        let first = run(&mut coord);
        assert!(first.is_ok());
        assert_eq!(coord.resume, ResumeState::PostMid { index: 0 });
        assert_eq!(*copied.lock().unwrap(), vec![0]);

        let second = run(&mut coord);
        assert!(second.is_ok());
        assert_eq!(coord.resume, ResumeState::None);
        assert_eq!(*submitted.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(*copied.lock().unwrap(), vec![0, 0, 1, 2, 3, 4]);
    }
}
