// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fire-once timers on a virtual clock.
//!
//! The queue never reads the wall clock. Callers move time forward with
//! [`TimerQueue::pop_due`] and [`TimerQueue::set_now`], which keeps the
//! sequencer deterministic and lets any driver (a tokio task, a frame loop,
//! a test) decide how real time maps onto it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Ownership token for one armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Raw handle value
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Queue of delayed, fire-once actions
#[derive(Debug, Clone)]
pub struct TimerQueue<A> {
    now: Duration,
    next_handle: u64,
    /// Ordered by deadline, then by arming order
    entries: BTreeMap<(Duration, TimerHandle), A>,
    deadlines: HashMap<TimerHandle, Duration>,
}

impl<A> TimerQueue<A> {
    /// Create an empty queue at time zero
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_handle: 0,
            entries: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `action` to fire `delay` from now
    pub fn arm(&mut self, delay: Duration, action: A) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;

        let deadline = self.now + delay;
        self.entries.insert((deadline, handle), action);
        self.deadlines.insert(handle, deadline);
        handle
    }

    /// Cancel a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.deadlines.remove(&handle) {
            Some(deadline) => self.entries.remove(&(deadline, handle)).is_some(),
            None => false,
        }
    }

    /// Whether a handle still refers to a live timer
    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle)
    }

    /// Deadline of the earliest live timer
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Remove the earliest timer due at or before `until`.
    ///
    /// The clock moves to that timer's deadline so that anything armed
    /// while handling it is scheduled relative to the moment it fired.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerHandle, A)> {
        let (&(deadline, handle), _) = self.entries.first_key_value()?;
        if deadline > until {
            return None;
        }

        let action = self.entries.remove(&(deadline, handle))?;
        self.deadlines.remove(&handle);
        self.now = self.now.max(deadline);
        Some((handle, action))
    }

    /// Move the clock forward. Earlier times are ignored.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Number of live timers
    pub fn live_count(&self) -> usize {
        self.entries.len()
    }

    /// Drop every live timer
    pub fn clear(&mut self) {
        self.entries.clear();
        self.deadlines.clear();
    }
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let mut queue = TimerQueue::new();
        queue.arm(ms(300), "late");
        queue.arm(ms(100), "early");
        queue.arm(ms(100), "early-second");

        assert_eq!(queue.next_deadline(), Some(ms(100)));
        assert_eq!(queue.pop_due(ms(50)), None);

        let fired: Vec<_> = std::iter::from_fn(|| queue.pop_due(ms(1000)))
            .map(|(_, action)| action)
            .collect();
        assert_eq!(fired, vec!["early", "early-second", "late"]);
        assert_eq!(queue.now(), ms(300));
    }

    #[test]
    fn test_cancel_is_safe_noop_when_stale() {
        let mut queue = TimerQueue::new();
        let handle = queue.arm(ms(100), ());
        assert!(queue.is_armed(handle));
        assert!(queue.cancel(handle));
        assert!(!queue.cancel(handle));
        assert_eq!(queue.live_count(), 0);

        let fired = queue.arm(ms(10), ());
        assert!(queue.pop_due(ms(10)).is_some());
        assert!(!queue.cancel(fired));
    }

    #[test]
    fn test_arm_is_relative_to_fire_time() {
        let mut queue = TimerQueue::new();
        queue.arm(ms(100), 1);
        let (_, first) = queue.pop_due(ms(500)).unwrap();
        assert_eq!(first, 1);

        // Armed while handling the first timer, from t=100
        queue.arm(ms(100), 2);
        assert_eq!(queue.next_deadline(), Some(ms(200)));
        queue.set_now(ms(500));
        assert_eq!(queue.now(), ms(500));
    }

    #[test]
    fn test_clock_never_goes_backwards() {
        let mut queue: TimerQueue<()> = TimerQueue::new();
        queue.set_now(ms(200));
        queue.set_now(ms(100));
        assert_eq!(queue.now(), ms(200));
    }
}
