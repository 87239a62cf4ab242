use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Stops a [`RecurringTask`] for good. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Fixed-period task driven by the caller's clock.
///
/// Periods missed while the caller was busy collapse into a single tick.
#[derive(Debug)]
pub struct RecurringTask {
    period: Duration,
    next_due: Instant,
    cancel: CancelHandle,
}

impl RecurringTask {
    /// The first tick is due one period after `start`. Periods shorter than 1 ms are raised
    /// to 1 ms.
    pub fn new(period: Duration, start: Instant) -> Self {
        let period = period.max(MIN_PERIOD);
        Self {
            period,
            next_due: start + period,
            cancel: CancelHandle::default(),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Returns `true` when a tick is due at `now` and schedules the next one.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.cancel.is_cancelled() || now < self.next_due {
            return false;
        }
        while self.next_due <= now {
            self.next_due += self.period;
        }
        true
    }

    /// Time left until the next tick, or `None` once cancelled.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        if self.cancel.is_cancelled() {
            return None;
        }
        Some(self.next_due.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(50);

    #[test]
    fn fires_once_per_period() {
        let start = Instant::now();
        let mut task = RecurringTask::new(PERIOD, start);

        assert!(!task.poll(start));
        assert!(!task.poll(start + Duration::from_millis(49)));
        assert!(task.poll(start + PERIOD));
        assert!(!task.poll(start + Duration::from_millis(60)));
        assert!(task.poll(start + 2 * PERIOD));
    }

    #[test]
    fn stall_collapses_into_one_tick() {
        let start = Instant::now();
        let mut task = RecurringTask::new(PERIOD, start);

        let late = start + Duration::from_millis(230);
        assert!(task.poll(late));
        assert!(!task.poll(late));
        assert_eq!(task.time_until_due(late), Some(Duration::from_millis(20)));
    }

    #[test]
    fn zero_period_is_raised_to_the_minimum() {
        let start = Instant::now();
        let mut task = RecurringTask::new(Duration::ZERO, start);

        assert!(!task.poll(start));
        assert!(task.poll(start + Duration::from_secs(1)));
        assert_eq!(task.time_until_due(start + Duration::from_secs(1)), Some(MIN_PERIOD));
    }

    #[test]
    fn cancelled_task_never_fires() {
        let start = Instant::now();
        let mut task = RecurringTask::new(PERIOD, start);
        let handle = task.cancel_handle();

        handle.cancel();
        assert!(!task.poll(start + 10 * PERIOD));
        assert_eq!(task.time_until_due(start), None);
        assert!(handle.is_cancelled());
    }
}
