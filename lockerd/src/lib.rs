//! Screen-locking daemon for X11.
//!
//! The [`Controller`](controller::Controller) owns the lock state machine and drives three kinds
//! of plugins: an authenticator deciding when the screen may be unlocked, an optional demo
//! animating the overlay windows, and observers notified of (and able to veto) every transition.
//! Everything platform-specific sits behind the [`Display`](display::Display),
//! [`Power`](power::Power) and [`Notifier`](notify::Notifier) ports.

pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod grab;
pub mod idle;
pub mod monitor;
pub mod notify;
pub mod plugin;
pub mod power;
pub mod preferences;
pub mod signals;
pub mod sleep;
pub mod timer;
pub mod x11;

#[cfg(test)]
pub(crate) mod testing;
