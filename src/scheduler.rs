//! Deferred task scheduling.
//!
//! Retries, settle delays and notification dismissal are all "run this
//! task after a delay" callbacks. The browser build hands them to
//! `setTimeout`; the native build and tests use [`ManualScheduler`], a
//! virtual clock that is advanced explicitly.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

/// Something that runs a task after a delay.
pub trait Scheduler<T> {
    /// Queue `task` to fire once `delay` has elapsed.
    fn schedule(&mut self, delay: Duration, task: T);
}

/// Task waiting on the virtual clock.
#[derive(Debug)]
struct TimerEntry<T> {
    due: Duration,
    seq: u64,
    task: T,
}

impl<T> PartialEq for TimerEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for TimerEntry<T> {}

impl<T> PartialOrd for TimerEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for TimerEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on deadline, FIFO among equal deadlines
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Virtual-clock scheduler. Time only moves when [`ManualScheduler::pop_due`]
/// or [`ManualScheduler::advance_to`] is called.
#[derive(Debug)]
pub struct ManualScheduler<T> {
    now: Duration,
    next_seq: u64,
    queue: BinaryHeap<TimerEntry<T>>,
}

impl<T> Default for ManualScheduler<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            queue: BinaryHeap::new(),
        }
    }
}

impl<T> ManualScheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time since creation.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Deadline of the earliest queued task.
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.peek().map(|e| e.due)
    }

    /// Pop the earliest task due at or before `limit`, moving the clock to
    /// its deadline. Tasks scheduled while handling it are seen by the
    /// next call.
    pub fn pop_due(&mut self, limit: Duration) -> Option<T> {
        if self.queue.peek()?.due > limit {
            return None;
        }
        let entry = self.queue.pop()?;
        self.now = self.now.max(entry.due);
        Some(entry.task)
    }

    /// Move the clock forward without running anything.
    pub fn advance_to(&mut self, time: Duration) {
        self.now = self.now.max(time);
    }
}

impl<T> Scheduler<T> for ManualScheduler<T> {
    fn schedule(&mut self, delay: Duration, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(TimerEntry {
            due: self.now + delay,
            seq,
            task,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let mut sched = ManualScheduler::new();
        sched.schedule(ms(300), "c");
        sched.schedule(ms(100), "a");
        sched.schedule(ms(200), "b");

        let mut fired = Vec::new();
        while let Some(task) = sched.pop_due(ms(1000)) {
            fired.push((task, sched.now()));
        }
        assert_eq!(fired, vec![("a", ms(100)), ("b", ms(200)), ("c", ms(300))]);
    }

    #[test]
    fn test_equal_deadlines_are_fifo() {
        let mut sched = ManualScheduler::new();
        for i in 0..5 {
            sched.schedule(ms(50), i);
        }
        let order: Vec<_> = std::iter::from_fn(|| sched.pop_due(ms(50))).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_respects_limit() {
        let mut sched = ManualScheduler::new();
        sched.schedule(ms(100), 1);
        assert_eq!(sched.pop_due(ms(99)), None);
        assert_eq!(sched.pending(), 1);
        assert_eq!(sched.next_due(), Some(ms(100)));
        assert_eq!(sched.pop_due(ms(100)), Some(1));
        assert!(sched.is_idle());
    }

    #[test]
    fn test_delay_is_relative_to_now() {
        let mut sched = ManualScheduler::new();
        sched.advance_to(ms(500));
        sched.schedule(ms(100), ());
        assert_eq!(sched.next_due(), Some(ms(600)));
    }
}
