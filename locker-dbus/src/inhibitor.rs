//! Model for systemd-logind inhibitor locks

use std::fmt;
use std::os::unix::io::AsRawFd;

use dbus::arg::OwnedFd;
use nix::unistd;

use crate::error::BusError;

/// A logind event which can be inhibited (by taking an inhibitor lock)
#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash)]
pub enum InhibitEvent {
    Shutdown,
    Sleep,
    Idle,
    HandlePowerKey,
    HandleSuspendKey,
    HandleHibernateKey,
    HandleLidSwitch,
}

impl InhibitEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            InhibitEvent::Shutdown => "shutdown",
            InhibitEvent::Sleep => "sleep",
            InhibitEvent::Idle => "idle",
            InhibitEvent::HandlePowerKey => "handle-power-key",
            InhibitEvent::HandleSuspendKey => "handle-suspend-key",
            InhibitEvent::HandleHibernateKey => "handle-hibernate-key",
            InhibitEvent::HandleLidSwitch => "handle-lid-switch",
        }
    }
}

impl fmt::Display for InhibitEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of events to inhibit, in logind's colon-separated form.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct InhibitEventSet(String);

impl InhibitEventSet {
    /// Creates a new, empty event set
    pub fn new() -> InhibitEventSet {
        InhibitEventSet(String::new())
    }

    /// Creates a new event set containing one event.
    pub fn with_event(event: InhibitEvent) -> InhibitEventSet {
        let mut set = InhibitEventSet::new();
        set.add(event);
        set
    }

    /// Add an event to the set. Events already in the set are skipped.
    pub fn add(&mut self, event: InhibitEvent) -> &mut InhibitEventSet {
        if !self.as_str().split(':').any(|name| name == event.as_str()) {
            self.0.push_str(event.as_str());
            self.0.push(':');
        }
        self
    }

    pub fn as_str(&self) -> &str {
        self.0.trim_end_matches(':')
    }
}

#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash)]
pub enum InhibitMode {
    /// An inhibitor lock which prevents the event from occurring.
    Block,
    /// An inhibitor lock which delays the inhibited event for a short period of time.
    Delay,
}

impl InhibitMode {
    pub fn as_str(self) -> &'static str {
        match self {
            InhibitMode::Block => "block",
            InhibitMode::Delay => "delay",
        }
    }
}

impl fmt::Display for InhibitMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RAII handle on an inhibitor lock. If this is dropped, the lock is released.
#[derive(Debug)]
pub struct InhibitorLock {
    fd: OwnedFd,
}

impl InhibitorLock {
    pub(crate) fn new(fd: OwnedFd) -> InhibitorLock {
        InhibitorLock { fd }
    }

    /// Releases the lock now, reporting any failure to close the descriptor.
    pub fn release(self) -> Result<(), BusError> {
        unistd::close(self.fd.into_fd()).map_err(|err| {
            BusError::inhibitor_file_error("Could not release inhibitor lock".to_string(), err)
        })
    }
}

impl fmt::Display for InhibitorLock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.fd.as_raw_fd())
    }
}
