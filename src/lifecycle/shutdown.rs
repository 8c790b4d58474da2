//! Shutdown coordination for the server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Coordinator for cooperative shutdown.
///
/// A cheap, cloneable handle around a single flag. The owner calls
/// [`trigger`](Self::trigger) once; the accept loop and every connection
/// worker observe it at their suspension points.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    triggered: AtomicBool,
    lock: Mutex<()>,
    wakeup: Condvar,
}

impl ShutdownSignal {
    /// Create a new, untriggered shutdown signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger the shutdown signal. Further calls are no-ops.
    pub fn trigger(&self) {
        if self.inner.triggered.swap(true, Ordering::SeqCst) {
            return;
        }
        // Taking the lock orders the store before any waiter re-checks the flag.
        let _guard = self.inner.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.inner.wakeup.notify_all();
        tracing::info!("Shutdown signal triggered");
    }

    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// Block for up to `timeout`, returning early if shutdown is triggered.
    ///
    /// Returns `true` if shutdown has been requested.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.inner.lock.lock().unwrap_or_else(|e| e.into_inner());
        let (_guard, _) = self
            .inner
            .wakeup
            .wait_timeout_while(guard, timeout, |_| !self.is_triggered())
            .unwrap_or_else(|e| e.into_inner());
        self.is_triggered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn starts_untriggered() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_triggered());
    }

    #[test]
    fn clones_share_state() {
        let signal = ShutdownSignal::new();
        let observer = signal.clone();
        signal.trigger();
        assert!(observer.is_triggered());

        // second trigger is harmless
        signal.trigger();
        assert!(observer.is_triggered());
    }

    #[test]
    fn wait_times_out_when_not_triggered() {
        let signal = ShutdownSignal::new();
        let start = Instant::now();
        assert!(!signal.wait_timeout(Duration::from_millis(50)));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn trigger_wakes_waiter_early() {
        let signal = ShutdownSignal::new();
        let waiter = signal.clone();
        let handle = thread::spawn(move || {
            let start = Instant::now();
            let triggered = waiter.wait_timeout(Duration::from_secs(10));
            (triggered, start.elapsed())
        });

        thread::sleep(Duration::from_millis(50));
        signal.trigger();

        let (triggered, elapsed) = handle.join().unwrap();
        assert!(triggered);
        assert!(elapsed < Duration::from_secs(5));
    }
}
