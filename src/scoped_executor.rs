//! Scoped deferred execution
//!
//! A small RAII guard that runs a closure when it goes out of scope,
//! regardless of the path (normal return, early `?`, or panic unwind).
//! One of the small utilities spec §2 calls out alongside endian
//! encode/decode and the error taxonomy; a general-purpose building
//! block for any caller (e.g. a host wiring this crate into a query
//! executor) that wants "drain in-flight I/O before propagating an
//! error" (spec §4.4) expressed as a guard rather than duplicated at
//! every early-return site.

/// Runs `fn_` once, when the guard is dropped.
pub struct ScopedExecutor {
    f: Option<Box<dyn FnOnce() + Send>>,
}

impl ScopedExecutor {
    /// Creates a guard that runs `f` on drop.
    pub fn new<F: FnOnce() + Send + 'static>(f: F) -> Self {
        Self { f: Some(Box::new(f)) }
    }

    /// Cancels the deferred execution; `f` will not run.
    pub fn dismiss(mut self) {
        self.f = None;
    }
}

impl Drop for ScopedExecutor {
    fn drop(&mut self) {
        if let Some(f) = self.f.take() {
            f();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_runs_on_drop() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let c = Arc::clone(&counter);
            let _guard = ScopedExecutor::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            });
            assert_eq!(counter.load(Ordering::SeqCst), 0);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dismiss_skips_execution() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        let guard = ScopedExecutor::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        guard.dismiss();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_runs_on_early_return_via_drop() {
        let counter = Arc::new(AtomicUsize::new(0));

        fn scoped(counter: &Arc<AtomicUsize>, fail: bool) -> Result<(), ()> {
            let c = Arc::clone(counter);
            let _guard = ScopedExecutor::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            });
            if fail {
                return Err(());
            }
            Ok(())
        }

        let _ = scoped(&counter, true);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
