//! Exclusive keyboard and pointer grab on the primary overlay window.

use std::thread;
use std::time::Duration;

use log::{debug, warn};

use crate::display::{Display, WindowId};

const GRAB_ATTEMPTS: u32 = 5;
const GRAB_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GrabState {
    Ungrabbed,
    /// A grab session is open on `window`. The flags record which devices the server actually
    /// granted; both are released together.
    Grabbed {
        window: WindowId,
        keyboard: bool,
        pointer: bool,
    },
}

/// Devices that could not be grabbed.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct GrabFailures {
    pub keyboard: bool,
    pub pointer: bool,
}

impl GrabFailures {
    pub fn any(&self) -> bool {
        self.keyboard || self.pointer
    }
}

#[derive(Debug)]
pub struct InputGrab {
    state: GrabState,
    attempts: u32,
    retry_delay: Duration,
}

impl Default for InputGrab {
    fn default() -> Self {
        InputGrab::new()
    }
}

impl InputGrab {
    pub fn new() -> InputGrab {
        InputGrab::with_retries(GRAB_ATTEMPTS, GRAB_RETRY_DELAY)
    }

    /// Grab manager trying each device `attempts` times, sleeping `retry_delay` in between. Another
    /// client holding a grab (an open menu, say) usually lets go within a few hundred milliseconds.
    pub fn with_retries(attempts: u32, retry_delay: Duration) -> InputGrab {
        InputGrab {
            state: GrabState::Ungrabbed,
            attempts: attempts.max(1),
            retry_delay,
        }
    }

    pub fn state(&self) -> GrabState {
        self.state
    }

    pub fn is_grabbed(&self) -> bool {
        self.state != GrabState::Ungrabbed
    }

    pub fn window(&self) -> Option<WindowId> {
        match self.state {
            GrabState::Grabbed { window, .. } => Some(window),
            GrabState::Ungrabbed => None,
        }
    }

    /// Grabs the keyboard, then the pointer, on `window`. A grab already open on `window` only
    /// retries the devices the server refused last time; a grab open on another window moves to
    /// `window`.
    ///
    /// Failing to grab is not fatal: the caller reports the returned failures and carries on.
    pub fn acquire(&mut self, display: &mut dyn Display, window: WindowId) -> GrabFailures {
        let (mut keyboard, mut pointer) = match self.state {
            GrabState::Grabbed {
                window: current,
                keyboard,
                pointer,
            } if current == window => (keyboard, pointer),
            GrabState::Grabbed { .. } => {
                self.release(display);
                (false, false)
            }
            GrabState::Ungrabbed => (false, false),
        };
        if keyboard && pointer {
            return GrabFailures::default();
        }

        debug!("Grabbing input on window {:#x}", window);
        if !keyboard {
            keyboard = self.retry(|| display.grab_keyboard(window));
            if !keyboard {
                warn!("Could not grab the keyboard");
            }
        }
        if !pointer {
            pointer = self.retry(|| display.grab_pointer(window));
            if !pointer {
                warn!("Could not grab the pointer");
            }
        }

        self.state = GrabState::Grabbed {
            window,
            keyboard,
            pointer,
        };
        GrabFailures {
            keyboard: !keyboard,
            pointer: !pointer,
        }
    }

    fn retry<F: FnMut() -> bool>(&self, mut grab: F) -> bool {
        for attempt in 1..=self.attempts {
            if grab() {
                return true;
            }
            if attempt < self.attempts {
                thread::sleep(self.retry_delay);
            }
        }
        false
    }

    /// Releases both devices. Safe to call when nothing is grabbed. Returns whether a grab was
    /// open.
    pub fn release(&mut self, display: &mut dyn Display) -> bool {
        match self.state {
            GrabState::Ungrabbed => false,
            GrabState::Grabbed { window, .. } => {
                debug!("Releasing input grab on window {:#x}", window);
                display.ungrab_keyboard();
                display.ungrab_pointer();
                self.state = GrabState::Ungrabbed;
                true
            }
        }
    }
}
