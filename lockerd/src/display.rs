//! Windowing-system port used by the lock controller. The X11 implementation lives in
//! [`crate::x11`]; tests drive the controller through a fake.

use std::fmt;

use crate::error::DisplayError;
use crate::idle::IdleEvent;
use crate::plugin::{AuthInput, AuthWidget};
use crate::preferences::Preferences;

pub type WindowId = u32;

/// A screen-space rectangle.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Geometry {
        Geometry {
            x,
            y,
            width,
            height,
        }
    }

    fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Whether `other` lies entirely within this rectangle. A rectangle contains itself.
    pub fn contains(&self, other: &Geometry) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// A physical output as reported by the platform.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Monitor {
    pub geometry: Geometry,
    pub primary: bool,
}

impl Monitor {
    pub fn new(geometry: Geometry, primary: bool) -> Monitor {
        Monitor { geometry, primary }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Pixel value on a 24-bit TrueColor visual.
    pub fn pixel(self) -> u32 {
        (u32::from(self.0) << 16) | (u32::from(self.1) << 8) | u32::from(self.2)
    }
}

/// Drawing surface handed to demo plugins.
pub trait Painter {
    /// Fills `window` with a solid colour.
    fn fill(&mut self, window: WindowId, color: Rgb);
}

/// Something that happened on the display that the controller must react to.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DisplayEvent {
    Idle(IdleEvent),
    /// Monitors were added, removed or resized.
    TopologyChanged,
    /// Data words of a locker client message.
    ClientMessage([u32; 5]),
    Input(AuthInput),
    Exposed(WindowId),
}

/// Operations the controller needs from the windowing system. Requests that X11 processes
/// asynchronously return nothing; failures surface as X errors in the event stream.
pub trait Display: Painter {
    /// The root window, grabbed when no overlay window exists.
    fn root_window(&self) -> WindowId;

    /// Enumerates the physical monitors.
    fn monitors(&mut self) -> Result<Vec<Monitor>, DisplayError>;

    /// Creates an unmapped, borderless, always-on-top window covering `geometry`.
    fn create_window(&mut self, geometry: Geometry) -> Result<WindowId, DisplayError>;

    fn configure_window(&mut self, window: WindowId, geometry: Geometry);

    fn destroy_window(&mut self, window: WindowId);

    /// Maps and raises a window.
    fn show_window(&mut self, window: WindowId);

    fn hide_window(&mut self, window: WindowId);

    fn focus_window(&mut self, window: WindowId);

    /// Attempts an exclusive keyboard grab, returning whether it succeeded.
    fn grab_keyboard(&mut self, window: WindowId) -> bool;

    /// Attempts an exclusive pointer grab, returning whether it succeeded.
    fn grab_pointer(&mut self, window: WindowId) -> bool;

    fn ungrab_keyboard(&mut self);

    fn ungrab_pointer(&mut self);

    /// Presents the authentication widget on `window`.
    fn draw_widget(&mut self, window: WindowId, widget: &AuthWidget);

    /// Turns the platform screen saver on.
    fn activate_screensaver(&mut self);

    /// Restarts the platform idle timer.
    fn reset_screensaver(&mut self);

    /// Shows or, with `None`, hides the preferences.
    fn show_preferences(&mut self, preferences: Option<&Preferences>);

    /// Withdraws the registration as the active screen saver.
    fn unregister_screensaver(&mut self);

    fn flush(&mut self);
}
