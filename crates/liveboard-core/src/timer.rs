//! Fixed-interval timers driven by an external clock.
//!
//! The event loop owns time: it calls [`IntervalTimer::due`] with the
//! current timestamp and gets back every tick that elapsed since the last
//! call. Nothing here sleeps or spawns.

/// Milliseconds on the session clock.
pub type Millis = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTimer {
    interval: Millis,
    next_due: Option<Millis>,
}

impl IntervalTimer {
    /// Create a stopped timer. A zero interval is treated as 1 ms.
    pub fn new(interval: Millis) -> Self {
        Self {
            interval: interval.max(1),
            next_due: None,
        }
    }

    /// Start ticking; the first tick is one interval after `now`.
    pub fn start(&mut self, now: Millis) {
        self.next_due = Some(now + self.interval);
    }

    /// Stop ticking. Later calls to [`due`](Self::due) return nothing.
    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn interval(&self) -> Millis {
        self.interval
    }

    /// Timestamps of every tick that fell due up to and including `now`.
    pub fn due(&mut self, now: Millis) -> Vec<Millis> {
        let mut ticks = Vec::new();
        while let Some(next) = self.next_due {
            if next > now {
                break;
            }
            ticks.push(next);
            self.next_due = Some(next + self.interval);
        }
        ticks
    }
}
