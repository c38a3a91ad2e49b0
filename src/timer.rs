use std::time::{Duration, Instant};

/// Repeating timer owned by the host. It drives `advance` while a round is
/// running and is cancelled the moment a rate is caught.
///
/// Deadline based: nothing fires on its own, the event loop asks whether
/// the timer is due.
#[derive(Debug, Clone)]
pub struct CycleTimer {
    interval: Duration,
    next_due: Option<Instant>,
}

impl CycleTimer {
    /// A cancelled timer with the given cadence.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arm the timer; the first fire is one interval after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Time left until the next fire, `None` when cancelled.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }

    /// Consume one fire if the deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                let next = due + self.interval;
                // Fell behind by more than a whole interval: skip the backlog.
                self.next_due = Some(if next <= now { now + self.interval } else { next });
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_100: Duration = Duration::from_millis(100);

    #[test]
    fn new_timer_is_cancelled() {
        let mut timer = CycleTimer::new(MS_100);
        let now = Instant::now();
        assert!(!timer.is_armed());
        assert_eq!(timer.remaining(now), None);
        assert!(!timer.take_due(now + Duration::from_secs(10)));
    }

    #[test]
    fn fires_once_per_interval() {
        let mut timer = CycleTimer::new(MS_100);
        let t0 = Instant::now();
        timer.start(t0);

        assert!(!timer.take_due(t0 + Duration::from_millis(99)));
        assert!(timer.take_due(t0 + MS_100));
        assert!(!timer.take_due(t0 + Duration::from_millis(150)));
        assert!(timer.take_due(t0 + Duration::from_millis(200)));
        assert_eq!(
            timer.remaining(t0 + Duration::from_millis(250)),
            Some(Duration::from_millis(50))
        );
    }

    #[test]
    fn cancel_stops_further_fires() {
        let mut timer = CycleTimer::new(MS_100);
        let t0 = Instant::now();
        timer.start(t0);
        timer.cancel();
        assert!(!timer.take_due(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn restart_after_cancel_rearms_from_now() {
        let mut timer = CycleTimer::new(MS_100);
        let t0 = Instant::now();
        timer.start(t0);
        timer.cancel();

        let t1 = t0 + Duration::from_secs(5);
        timer.start(t1);
        assert!(!timer.take_due(t1 + Duration::from_millis(50)));
        assert!(timer.take_due(t1 + MS_100));
    }

    #[test]
    fn lagging_host_does_not_burst() {
        let mut timer = CycleTimer::new(MS_100);
        let t0 = Instant::now();
        timer.start(t0);

        let late = t0 + Duration::from_millis(1_000);
        assert!(timer.take_due(late));
        assert!(!timer.take_due(late));
        assert_eq!(timer.remaining(late), Some(MS_100));
    }
}
