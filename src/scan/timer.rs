//! Host-driven timers.
//!
//! The engine never sleeps or spawns: the host passes the current monotonic
//! time with each event and calls `Scanner::poll` to fire what is due.

use std::ops::Add;

/// Monotonic milliseconds supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Millis(pub u64);

impl Add<u64> for Millis {
    type Output = Millis;

    fn add(self, ms: u64) -> Millis {
        Millis(self.0.saturating_add(ms))
    }
}

/// A single pending value that becomes due at a fixed time.
///
/// Scheduling replaces whatever was pending, so only the most recent value
/// is ever delivered.
#[derive(Debug, Clone)]
pub struct Scheduled<T> {
    pending: Option<(Millis, T)>,
}

impl<T> Default for Scheduled<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> Scheduled<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `value` for `now + delay_ms`, returning the value it replaced.
    pub fn schedule(&mut self, now: Millis, delay_ms: u64, value: T) -> Option<T> {
        self.pending
            .replace((now + delay_ms, value))
            .map(|(_, old)| old)
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }

    /// Take the value if it is due at `now`.
    pub fn take_due(&mut self, now: Millis) -> Option<T> {
        match &self.pending {
            Some((due, _)) if *due <= now => self.cancel(),
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(_, value)| value)
    }

    pub fn due_at(&self) -> Option<Millis> {
        self.pending.as_ref().map(|(due, _)| *due)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_when_due() {
        let mut timer = Scheduled::new();
        timer.schedule(Millis(0), 300, "a");
        assert_eq!(timer.take_due(Millis(299)), None);
        assert_eq!(timer.take_due(Millis(300)), Some("a"));
        assert_eq!(timer.take_due(Millis(1000)), None);
    }

    #[test]
    fn test_reschedule_replaces() {
        let mut timer = Scheduled::new();
        assert_eq!(timer.schedule(Millis(0), 300, 1), None);
        assert_eq!(timer.schedule(Millis(200), 300, 2), Some(1));
        assert_eq!(timer.due_at(), Some(Millis(500)));
        assert_eq!(timer.take_due(Millis(400)), None);
        assert_eq!(timer.take_due(Millis(500)), Some(2));
    }

    #[test]
    fn test_cancel() {
        let mut timer = Scheduled::new();
        timer.schedule(Millis(5), 10, 'x');
        assert_eq!(timer.pending(), Some(&'x'));
        assert_eq!(timer.cancel(), Some('x'));
        assert!(!timer.is_pending());
        assert_eq!(timer.take_due(Millis(100)), None);
    }

    #[test]
    fn test_saturating_time() {
        assert_eq!(Millis(u64::MAX) + 5, Millis(u64::MAX));
    }
}
