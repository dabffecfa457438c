use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Work run once per period by [`schedule_repeating`].
pub trait Tick: Send + 'static {
    fn tick(&mut self) -> impl Future<Output = ()> + Send;
}

/// Cancels the repeating work when cancelled or dropped.
#[derive(Debug)]
pub struct RepeatHandle {
    task: JoinHandle<()>,
}

impl RepeatHandle {
    /// Stops the schedule. A tick that is mid-flight is dropped, not awaited.
    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for RepeatHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Runs `worker.tick()` every `period` on its own task.
///
/// Ticks never overlap: a tick that runs past the period delays the next one,
/// and the periods it swallowed are skipped rather than replayed.
pub fn schedule_repeating<W: Tick>(period: Duration, mut worker: W) -> RepeatHandle {
    let task = tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            worker.tick().await;
        }
    });

    RepeatHandle { task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    struct Counter {
        ticks: Arc<AtomicUsize>,
        busy: Arc<AtomicUsize>,
        work: Duration,
        overlaps: Arc<AtomicUsize>,
    }

    impl Counter {
        fn new(work: Duration) -> Self {
            Self {
                ticks: Arc::default(),
                busy: Arc::default(),
                work,
                overlaps: Arc::default(),
            }
        }
    }

    impl Tick for Counter {
        async fn tick(&mut self) {
            if self.busy.fetch_add(1, Ordering::SeqCst) > 0 {
                self.overlaps.fetch_add(1, Ordering::SeqCst);
            }
            if !self.work.is_zero() {
                time::sleep(self.work).await;
            }
            self.ticks.fetch_add(1, Ordering::SeqCst);
            self.busy.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let worker = Counter::new(Duration::ZERO);
        let ticks = worker.ticks.clone();

        let handle = schedule_repeating(Duration::from_millis(100), worker);
        time::sleep(Duration::from_millis(950)).await;

        // Immediate first tick, then one every 100ms
        assert_eq!(ticks.load(Ordering::SeqCst), 10);
        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn slow_ticks_are_skipped_not_overlapped() {
        let worker = Counter::new(Duration::from_millis(250));
        let ticks = worker.ticks.clone();
        let overlaps = worker.overlaps.clone();

        let start = Instant::now();
        let handle = schedule_repeating(Duration::from_millis(100), worker);
        time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
        let done = ticks.load(Ordering::SeqCst);
        assert!(done >= 3 && done <= 4, "{done} ticks in {:?}", start.elapsed());
        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_ticking() {
        let worker = Counter::new(Duration::ZERO);
        let ticks = worker.ticks.clone();

        let handle = schedule_repeating(Duration::from_millis(100), worker);
        time::sleep(Duration::from_millis(250)).await;
        handle.cancel();
        let seen = ticks.load(Ordering::SeqCst);

        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_discards_the_running_tick() {
        let worker = Counter::new(Duration::from_millis(300));
        let ticks = worker.ticks.clone();

        let handle = schedule_repeating(Duration::from_millis(100), worker);
        time::sleep(Duration::from_millis(50)).await;
        drop(handle);

        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }
}
