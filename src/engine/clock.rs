//! The single-threaded timer queue every timed continuation runs on.
//!
//! Time is virtual: the owner feeds `pop_due` with the current instant and
//! the scheduler hands back due timers one at a time, in due order. While a
//! timer is being handled the scheduler's clock sits at that timer's due
//! time, so follow-up timers scheduled from the handler are measured from
//! when the continuation was *supposed* to run, not from when the frame loop
//! got around to it.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// Cooperative cancellation flag shared between a timed operation and
/// whoever may cancel it. Continuations check it before touching state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

pub struct Scheduler<E> {
    now: Duration,
    next_id: u64,
    queue: BTreeMap<(Duration, TimerId), E>,
    due_of: HashMap<TimerId, Duration>,
}

impl<E> Scheduler<E> {
    pub fn new(now: Duration) -> Self {
        Self {
            now,
            next_id: 0,
            queue: BTreeMap::new(),
            due_of: HashMap::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `event` to come due `delay` after the scheduler's clock.
    pub fn schedule(&mut self, delay: Duration, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due = self.now + delay;
        self.queue.insert((due, id), event);
        self.due_of.insert(id, due);
        id
    }

    /// Drop a pending timer. Returns false if it already fired or was
    /// cancelled before.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.due_of.remove(&id) {
            Some(due) => self.queue.remove(&(due, id)).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.due_of.contains_key(&id)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Pop the earliest timer due at or before `now`, moving the clock to
    /// its due time. When nothing is due the clock moves to `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerId, E)> {
        let &(due, id) = match self.queue.keys().next() {
            Some(key) if key.0 <= now => key,
            _ => {
                self.now = self.now.max(now);
                return None;
            }
        };
        let event = self.queue.remove(&(due, id))?;
        self.due_of.remove(&id);
        self.now = self.now.max(due);
        Some((id, event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn timers_fire_in_due_then_insertion_order() {
        let mut s = Scheduler::new(Duration::ZERO);
        s.schedule(ms(20), "late");
        s.schedule(ms(10), "first");
        s.schedule(ms(10), "second");

        let mut fired = Vec::new();
        while let Some((_, e)) = s.pop_due(ms(100)) {
            fired.push(e);
        }
        assert_eq!(fired, vec!["first", "second", "late"]);
        assert_eq!(s.now(), ms(100));
    }

    #[test]
    fn nothing_fires_early() {
        let mut s = Scheduler::new(Duration::ZERO);
        s.schedule(ms(50), ());
        assert!(s.pop_due(ms(49)).is_none());
        assert!(s.pop_due(ms(50)).is_some());
    }

    #[test]
    fn clock_sits_at_due_time_while_handling() {
        let mut s = Scheduler::new(Duration::ZERO);
        s.schedule(ms(10), 1);
        let (_, _) = s.pop_due(ms(95)).expect("due");
        assert_eq!(s.now(), ms(10));
        s.schedule(ms(10), 2);
        let (_, e) = s.pop_due(ms(95)).expect("chained timer is due");
        assert_eq!(e, 2);
        assert_eq!(s.now(), ms(20));
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut s = Scheduler::new(Duration::ZERO);
        let a = s.schedule(ms(5), 'a');
        s.schedule(ms(6), 'b');
        assert!(s.cancel(a));
        assert!(!s.cancel(a));
        assert!(!s.is_pending(a));
        assert_eq!(s.pop_due(ms(10)).map(|(_, e)| e), Some('b'));
        assert!(s.pop_due(ms(10)).is_none());
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let held = token.clone();
        assert!(!held.is_cancelled());
        token.cancel();
        assert!(held.is_cancelled());
    }
}
