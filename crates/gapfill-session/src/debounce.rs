//! Single-slot debouncer
//!
//! Holds at most one pending value. Scheduling a new value replaces the
//! pending one and restarts the delay, so a later edit always supersedes an
//! earlier one. Nothing is ever dropped silently: callers take the pending
//! value through [`Debouncer::poll`] once it is due, or through
//! [`Debouncer::flush`] right away.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `value` to fire `delay` after `now`. Returns the value it
    /// replaced, if any.
    pub fn schedule(&mut self, value: T, now: Instant) -> Option<T> {
        self.pending
            .replace((value, now + self.delay))
            .map(|(old, _)| old)
    }

    /// Take the pending value if its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if *deadline <= now => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Take the pending value regardless of its deadline
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(v, _)| v)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, d)| *d)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_fires_after_delay() {
        let mut d = Debouncer::new(ms(500));
        let t0 = Instant::now();
        d.schedule("a", t0);
        assert_eq!(d.poll(t0 + ms(499)), None);
        assert_eq!(d.poll(t0 + ms(500)), Some("a"));
        assert!(!d.is_pending());
    }

    #[test]
    fn test_later_value_supersedes() {
        let mut d = Debouncer::new(ms(500));
        let t0 = Instant::now();
        assert_eq!(d.schedule("a", t0), None);
        assert_eq!(d.schedule("b", t0 + ms(300)), Some("a"));

        // Deadline restarted from the second schedule
        assert_eq!(d.poll(t0 + ms(600)), None);
        assert_eq!(d.poll(t0 + ms(800)), Some("b"));
        assert_eq!(d.poll(t0 + ms(2000)), None);
    }

    #[test]
    fn test_flush_takes_immediately() {
        let mut d = Debouncer::new(ms(500));
        let t0 = Instant::now();
        d.schedule(1, t0);
        assert_eq!(d.pending(), Some(&1));
        assert_eq!(d.deadline(), Some(t0 + ms(500)));
        assert_eq!(d.flush(), Some(1));
        assert_eq!(d.flush(), None);
    }
}
