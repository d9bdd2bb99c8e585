//! Periodic tick sources.
//!
//! The engine holds at most one live [`TickHandle`]. Every transition out of
//! Running cancels it, and arming a new one cancels the old one first, so two
//! tick streams never run side by side.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub trait TickScheduler {
    /// Start a periodic tick stream.
    fn arm(&mut self) -> Box<dyn TickHandle>;
}

pub trait TickHandle {
    /// Stop the stream. Idempotent.
    fn cancel(&mut self);
}

/// A scheduler that starts nothing; the caller invokes `tick()` itself.
///
/// It still counts live handles so tests can check that the engine never
/// leaves a second stream running.
#[derive(Debug, Clone, Default)]
pub struct ManualTicks {
    live: Arc<AtomicUsize>,
    armed_total: Arc<AtomicUsize>,
}

impl ManualTicks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles armed and not yet cancelled.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Handles armed over the scheduler's lifetime.
    pub fn armed_total(&self) -> usize {
        self.armed_total.load(Ordering::SeqCst)
    }
}

impl TickScheduler for ManualTicks {
    fn arm(&mut self) -> Box<dyn TickHandle> {
        self.live.fetch_add(1, Ordering::SeqCst);
        self.armed_total.fetch_add(1, Ordering::SeqCst);
        Box::new(ManualHandle {
            live: Arc::clone(&self.live),
            cancelled: false,
        })
    }
}

struct ManualHandle {
    live: Arc<AtomicUsize>,
    cancelled: bool,
}

impl TickHandle for ManualHandle {
    fn cancel(&mut self) {
        if !self.cancelled {
            self.cancelled = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for ManualHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Marker sent on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSignal;

/// Drives ticks from a `tokio::time::interval` task.
///
/// Each armed stream is a spawned task that sends [`TickSignal`]s on the
/// channel handed to [`IntervalTicks::new`]. Cancelling aborts the task.
/// Must be armed from within a Tokio runtime.
pub struct IntervalTicks {
    period: Duration,
    tx: mpsc::UnboundedSender<TickSignal>,
}

impl IntervalTicks {
    pub fn new(period: Duration) -> (Self, mpsc::UnboundedReceiver<TickSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { period, tx }, rx)
    }
}

impl TickScheduler for IntervalTicks {
    fn arm(&mut self) -> Box<dyn TickHandle> {
        let tx = self.tx.clone();
        let period = self.period;
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick of a tokio interval completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(TickSignal).is_err() {
                    break;
                }
            }
        });
        Box::new(TaskHandle { task })
    }
}

struct TaskHandle {
    task: JoinHandle<()>,
}

impl TickHandle for TaskHandle {
    fn cancel(&mut self) {
        self.task.abort();
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_ticks_count_live_handles() {
        let mut ticks = ManualTicks::new();
        let mut a = ticks.arm();
        assert_eq!(ticks.live(), 1);
        a.cancel();
        a.cancel();
        assert_eq!(ticks.live(), 0);
        let b = ticks.arm();
        assert_eq!(ticks.live(), 1);
        drop(b);
        assert_eq!(ticks.live(), 0);
        assert_eq!(ticks.armed_total(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_ticks_stop_after_cancel() {
        let (mut ticks, mut rx) = IntervalTicks::new(Duration::from_millis(100));
        let mut handle = ticks.arm();

        tokio::time::sleep(Duration::from_millis(350)).await;
        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert!(received >= 2, "expected ticks, got {received}");

        handle.cancel();
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }
}
