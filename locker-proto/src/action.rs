//! Actions the locker can be asked to perform, and the lifecycle events it broadcasts.

use std::fmt;

use crate::error::ProtoError;

/// A request to the locker, either from the control utility or from a plugin.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash)]
pub enum Action {
    Activate,
    Deactivate,
    Disable,
    Enable,
    Lock,
    Cycle,
    Reload,
    ShowPreferences,
    Start,
    Stop,
    Suspend,
    Unlock,
}

impl Action {
    pub const ALL: [Action; 12] = [
        Action::Activate,
        Action::Deactivate,
        Action::Disable,
        Action::Enable,
        Action::Lock,
        Action::Cycle,
        Action::Reload,
        Action::ShowPreferences,
        Action::Start,
        Action::Stop,
        Action::Suspend,
        Action::Unlock,
    ];

    /// Wire code for this action.
    pub fn code(self) -> u32 {
        match self {
            Action::Activate => 0,
            Action::Deactivate => 1,
            Action::Disable => 2,
            Action::Enable => 3,
            Action::Lock => 4,
            Action::Cycle => 5,
            Action::Reload => 6,
            Action::ShowPreferences => 7,
            Action::Start => 8,
            Action::Stop => 9,
            Action::Suspend => 10,
            Action::Unlock => 11,
        }
    }

    /// Looks up an action by its wire code.
    ///
    /// # Errors
    /// Returns [`ProtoError::UnknownAction`] if no action uses `code`.
    pub fn from_code(code: u32) -> Result<Action, ProtoError> {
        Action::ALL
            .iter()
            .copied()
            .find(|action| action.code() == code)
            .ok_or(ProtoError::UnknownAction(code))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Activate => "activate",
            Action::Deactivate => "deactivate",
            Action::Disable => "disable",
            Action::Enable => "enable",
            Action::Lock => "lock",
            Action::Cycle => "cycle",
            Action::Reload => "reload",
            Action::ShowPreferences => "show-preferences",
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Suspend => "suspend",
            Action::Unlock => "unlock",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle notification sent to observer plugins.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash)]
pub enum Event {
    Activating,
    Activated,
    Deactivating,
    Deactivated,
    Locking,
    Locked,
    Unlocking,
    Unlocked,
    /// Sent before suspending; there is no matching post-event.
    Suspending,
    Cycling,
    Cycled,
}

impl Event {
    /// Pre-events are sent before a transition mutates any state, and observers may veto them.
    pub fn is_pre(self) -> bool {
        match self {
            Event::Activating
            | Event::Deactivating
            | Event::Locking
            | Event::Unlocking
            | Event::Suspending
            | Event::Cycling => true,
            Event::Activated
            | Event::Deactivated
            | Event::Locked
            | Event::Unlocked
            | Event::Cycled => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Event::Activating => "activating",
            Event::Activated => "activated",
            Event::Deactivating => "deactivating",
            Event::Deactivated => "deactivated",
            Event::Locking => "locking",
            Event::Locked => "locked",
            Event::Unlocking => "unlocking",
            Event::Unlocked => "unlocked",
            Event::Suspending => "suspending",
            Event::Cycling => "cycling",
            Event::Cycled => "cycled",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
