use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::{
    admission::RateDecision,
    clock::{Clock, SystemClock},
};

/// Fixed window counter for one client key.
#[derive(Debug)]
struct FixedWindow {
    count: u32,
    window_start: Instant,
    last_seen: Instant,
}

impl FixedWindow {
    fn new(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
            last_seen: now,
        }
    }

    fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) >= window
    }

    /// Records one hit. A closed window restarts at `now`; an over-limit hit
    /// never restarts it early and is not counted, so `count` stays within `limit`.
    fn hit(&mut self, now: Instant, window: Duration, limit: u32) -> RateDecision {
        self.last_seen = now;

        if self.is_expired(now, window) {
            self.count = 0;
            self.window_start = now;
        }

        let allowed = self.count < limit;
        if allowed {
            self.count += 1;
        }
        let resets_in = window.saturating_sub(now.saturating_duration_since(self.window_start));

        RateDecision {
            allowed,
            limit,
            remaining: limit.saturating_sub(self.count),
            resets_in,
        }
    }

    fn refund(&mut self, now: Instant, window: Duration) {
        if !self.is_expired(now, window) {
            self.count = self.count.saturating_sub(1);
        }
    }
}

type Key = String;

/// Per-key fixed window limiter. Each key's window sits behind its own
/// mutex, so concurrent hits on one key are counted one at a time. The map
/// entry stays borrowed while the window is locked, so a purge can never
/// detach a window that a hit is about to update.
#[derive(Clone)]
pub struct FixedWindowLimiter {
    map: Arc<DashMap<Key, Mutex<FixedWindow>>>,
    limit: u32,
    window: Duration,
    idle_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    pub fn new(limit: u32, window: Duration, idle_ttl: Duration) -> Self {
        Self::with_clock(limit, window, idle_ttl, SystemClock::new())
    }

    pub fn with_clock<C>(limit: u32, window: Duration, idle_ttl: Duration, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        Self {
            map: Arc::new(DashMap::new()),
            limit,
            window,
            idle_ttl,
            clock: Arc::new(clock),
        }
    }

    /// Counts one request for `key` and reports whether it fits the budget.
    pub fn check_and_record(&self, key: &str) -> RateDecision {
        let now = self.clock.now();

        if let Some(window) = self.map.get(key) {
            return window.lock().hit(now, self.window, self.limit);
        }

        self.map
            .entry(key.to_string())
            .or_insert_with(|| Mutex::new(FixedWindow::new(now)))
            .lock()
            .hit(now, self.window, self.limit)
    }

    /// Gives back one slot for `key` if its window is still open.
    pub fn refund(&self, key: &str) {
        if let Some(window) = self.map.get(key) {
            let now = self.clock.now();
            window.lock().refund(now, self.window);
        }
    }

    /// Drops windows that are closed and have been idle longer than the TTL.
    /// Returns how many keys were removed.
    pub fn purge_idle(&self) -> usize {
        let now = self.clock.now();
        let before = self.map.len();

        self.map.retain(|_, window| {
            let w = window.lock();
            !(w.is_expired(now, self.window) && now.saturating_duration_since(w.last_seen) > self.idle_ttl)
        });

        before.saturating_sub(self.map.len())
    }

    pub fn tracked_keys(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_window_counts_first_hit() {
        let now = Instant::now();
        let mut w = FixedWindow::new(now);

        let decision = w.hit(now, Duration::from_secs(60), 5);

        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
        assert_eq!(w.count, 1);
    }

    #[test]
    fn over_limit_hit_keeps_window_start() {
        let start = Instant::now();
        let mut w = FixedWindow::new(start);
        let window = Duration::from_secs(60);

        for _ in 0..3 {
            w.hit(start, window, 2);
        }
        let later = start + Duration::from_secs(10);
        let decision = w.hit(later, window, 2);

        assert!(!decision.allowed);
        assert_eq!(w.count, 2);
        assert_eq!(w.window_start, start);
        assert_eq!(decision.resets_in, Duration::from_secs(50));
    }

    #[test]
    fn refund_is_ignored_after_window_closes() {
        let start = Instant::now();
        let mut w = FixedWindow::new(start);
        let window = Duration::from_secs(60);
        w.hit(start, window, 5);

        w.refund(start + window, window);

        assert_eq!(w.count, 1);
    }
}
