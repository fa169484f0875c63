//! Single-shot timers driven by the event loop.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Handle on a scheduled timer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TimerId(u64);

/// Who gets called back when a timer fires.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum TimerOwner {
    AutoLock,
    Authenticator,
    Demo,
    Observer(String),
}

#[derive(Debug, Default)]
pub struct Timers {
    next_id: u64,
    pending: BTreeMap<TimerId, (Instant, TimerOwner)>,
}

impl Timers {
    pub fn new() -> Timers {
        Timers::default()
    }

    /// Schedules a timer to fire `delay` from now.
    pub fn schedule(&mut self, delay: Duration, owner: TimerOwner) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.insert(id, (Instant::now() + delay, owner));
        id
    }

    /// Cancels a timer. Returns whether it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Cancels every timer belonging to `owner`, for example when a plugin is unloaded.
    pub fn cancel_owned_by(&mut self, owner: &TimerOwner) {
        self.pending.retain(|_, (_, o)| o != owner);
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest deadline among the pending timers.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|(deadline, _)| *deadline).min()
    }

    /// Removes and returns every timer due at `now`, earliest first. Timers scheduled while the
    /// returned ones are handled wait for the next call.
    pub fn take_due(&mut self, now: Instant) -> Vec<(TimerId, TimerOwner)> {
        let mut due: Vec<(Instant, TimerId)> = self
            .pending
            .iter()
            .filter(|(_, (deadline, _))| *deadline <= now)
            .map(|(id, (deadline, _))| (*deadline, *id))
            .collect();
        due.sort();

        due.into_iter()
            .filter_map(|(_, id)| self.pending.remove(&id).map(|(_, owner)| (id, owner)))
            .collect()
    }
}
