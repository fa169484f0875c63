//! Plugin contracts.
//!
//! The locker is extended through three kinds of plugin: one [`Authenticator`] decides when the
//! screen may unlock, an optional [`Demo`] animates the overlay windows while the screen saver is
//! on, and any number of [`Observer`]s watch (and may veto) lifecycle transitions. Plugins are
//! created by name from a [`PluginRegistry`] and destroyed by dropping them.

use std::fmt;

use locker_proto::{Action, Event};

use crate::display::{Painter, WindowId};
use crate::error::PluginError;
use crate::monitor::OverlayWindow;
use crate::timer::TimerId;

pub use crate::plugin::helper::{Helper, Outbox};
pub use crate::plugin::registry::{AuthFactory, DemoFactory, ObserverFactory, PluginRegistry};

pub mod colors;
pub mod debug;
mod helper;
pub mod password;
mod registry;
pub mod slider;
pub mod suspend;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PluginKind {
    Authenticator,
    Demo,
    Observer,
}

impl PluginKind {
    /// Prefix of the configuration sections this kind of plugin may access.
    pub fn config_prefix(self) -> &'static str {
        match self {
            PluginKind::Authenticator => "auth",
            PluginKind::Demo => "demo",
            PluginKind::Observer => "plugin",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PluginKind::Authenticator => "authentication",
            PluginKind::Demo => "demo",
            PluginKind::Observer => "observer",
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyboard input forwarded to the authenticator while the screen is locked.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AuthInput {
    Char(char),
    Backspace,
    Escape,
    Enter,
    Left,
    Right,
}

/// What the authenticator wants shown on the primary monitor.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct AuthWidget {
    pub visible: bool,
    pub lines: Vec<String>,
}

impl AuthWidget {
    pub fn hidden() -> AuthWidget {
        AuthWidget::default()
    }

    pub fn shown(lines: Vec<String>) -> AuthWidget {
        AuthWidget {
            visible: true,
            lines,
        }
    }
}

/// Decides when the screen may be unlocked.
///
/// `action` is called at every transition with the action being performed (`Activate`,
/// `Deactivate`, `Lock`, `Unlock`, `Reload`...). Returning an error from `Activate`, `Deactivate`
/// or `Unlock` aborts the transition; in particular refusing `Unlock` keeps the screen locked.
pub trait Authenticator {
    fn widget(&self) -> AuthWidget;

    fn action(&mut self, helper: &mut Helper<'_>, action: Action) -> Result<(), PluginError>;

    fn input(&mut self, _helper: &mut Helper<'_>, _input: AuthInput) {}

    fn timeout(&mut self, _helper: &mut Helper<'_>, _timer: TimerId) {}
}

/// Animates the overlay windows while the screen saver is on.
pub trait Demo {
    fn add(&mut self, window: &OverlayWindow) -> Result<(), PluginError>;

    fn remove(&mut self, window: WindowId);

    fn reload(&mut self, _helper: &mut Helper<'_>) {}

    fn start(&mut self, _helper: &mut Helper<'_>, _painter: &mut dyn Painter) {}

    fn stop(&mut self, _helper: &mut Helper<'_>, _painter: &mut dyn Painter) {}

    fn cycle(&mut self, _helper: &mut Helper<'_>, _painter: &mut dyn Painter) {}

    fn timeout(&mut self, _helper: &mut Helper<'_>, _painter: &mut dyn Painter, _timer: TimerId) {}
}

/// Watches lifecycle events. An error returned for a pre-event vetoes a transition that was not
/// forced; errors for post-events are ignored.
pub trait Observer {
    fn event(&mut self, _helper: &mut Helper<'_>, _event: Event) -> Result<(), PluginError> {
        Ok(())
    }

    fn timeout(&mut self, _helper: &mut Helper<'_>, _timer: TimerId) {}
}

pub struct AuthSession {
    pub name: String,
    pub plugin: Box<dyn Authenticator>,
}

pub struct DemoSession {
    pub name: String,
    pub plugin: Box<dyn Demo>,
    pub running: bool,
}

pub struct ObserverSession {
    pub name: String,
    pub plugin: Box<dyn Observer>,
}
