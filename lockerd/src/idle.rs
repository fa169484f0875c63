//! Idle notifications and the auto-lock timer.

use std::fmt;
use std::time::Duration;

use log::debug;

use crate::timer::{TimerId, TimerOwner, Timers};

/// Events produced by the platform on screen saver state changes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IdleEvent {
    /// The screen saver turned on
    On,

    /// The screen saver turned off
    Off,

    /// The screen saver cycled to a new image
    Cycle,

    /// The screen saver was disabled
    Disabled,
}

/// What to do once the screen saver turns on.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LockDelay {
    /// Only show the screen saver.
    Never,
    /// Lock as soon as the screen saver turns on.
    Immediate,
    /// Lock if the screen saver is still on after this long.
    After(Duration),
}

impl LockDelay {
    /// Parses a delay in whole seconds.
    pub fn parse(value: &str) -> Option<LockDelay> {
        match value.trim().parse::<u64>().ok()? {
            0 => Some(LockDelay::Immediate),
            secs => Some(LockDelay::After(Duration::from_secs(secs))),
        }
    }
}

impl fmt::Display for LockDelay {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LockDelay::Never => f.write_str("never"),
            LockDelay::Immediate => f.write_str("immediately"),
            LockDelay::After(delay) => write!(f, "after {}s", delay.as_secs()),
        }
    }
}

/// Single-shot timer that locks the screen a while after the screen saver turned on. Arming it
/// again replaces the pending timer.
#[derive(Debug, Default)]
pub struct AutoLock {
    pending: Option<TimerId>,
}

impl AutoLock {
    pub fn new() -> AutoLock {
        AutoLock { pending: None }
    }

    pub fn arm(&mut self, timers: &mut Timers, delay: Duration) -> TimerId {
        self.cancel(timers);
        let id = timers.schedule(delay, TimerOwner::AutoLock);
        debug!("Locking in {}s unless the screen saver turns off", delay.as_secs());
        self.pending = Some(id);
        id
    }

    /// Cancels the pending timer. Returns whether one was pending.
    pub fn cancel(&mut self, timers: &mut Timers) -> bool {
        match self.pending.take() {
            Some(id) => {
                debug!("Cancelling pending lock");
                timers.cancel(id);
                true
            }
            None => false,
        }
    }

    /// Called when timer `id` fired. Returns whether it was the pending auto-lock timer, clearing
    /// it if so.
    pub fn fired(&mut self, id: TimerId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[test]
    fn test_parse_lock_delay() {
        assert_eq!(LockDelay::parse("0"), Some(LockDelay::Immediate));
        assert_eq!(
            LockDelay::parse(" 5 "),
            Some(LockDelay::After(Duration::from_secs(5)))
        );
        assert_eq!(LockDelay::parse("-1"), None);
        assert_eq!(LockDelay::parse("five"), None);
    }

    #[test]
    fn test_rearming_replaces_timer() {
        let mut timers = Timers::new();
        let mut auto_lock = AutoLock::new();
        let first = auto_lock.arm(&mut timers, Duration::from_secs(5));
        let second = auto_lock.arm(&mut timers, Duration::from_secs(5));
        assert_ne!(first, second);
        assert!(!timers.is_pending(first));
        assert_eq!(timers.len(), 1);

        let due = timers.take_due(Instant::now() + Duration::from_secs(6));
        assert_eq!(due, vec![(second, TimerOwner::AutoLock)]);
        assert!(!auto_lock.fired(first));
        assert!(auto_lock.fired(second));
        assert!(!auto_lock.is_pending());
    }

    #[test]
    fn test_cancel_when_idle() {
        let mut timers = Timers::new();
        let mut auto_lock = AutoLock::new();
        assert!(!auto_lock.cancel(&mut timers));
        auto_lock.arm(&mut timers, Duration::from_secs(1));
        assert!(auto_lock.cancel(&mut timers));
        assert!(timers.is_empty());
    }
}
