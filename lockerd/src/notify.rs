//! User-visible error reports.

use dbus::blocking::Connection;
use log::{debug, warn};

use locker_dbus::{Notifications, Urgency};

const APP_NAME: &str = "lockerd";

pub trait Notifier {
    fn notify(&mut self, summary: &str, body: &str);
}

/// Raises desktop notifications on the session bus.
pub struct DesktopNotifier {
    conn: Connection,
}

impl DesktopNotifier {
    pub fn new() -> Result<DesktopNotifier, dbus::Error> {
        Ok(DesktopNotifier {
            conn: Connection::new_session()?,
        })
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&mut self, summary: &str, body: &str) {
        match Notifications::new(&self.conn, APP_NAME).notify(summary, body, Urgency::Critical) {
            Ok(id) => debug!("Raised notification {}", id),
            Err(err) => warn!("Could not raise a notification: {}", err),
        }
    }
}

/// Fallback used without a session bus. The controller already logs every report.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, summary: &str, body: &str) {
        debug!("Not showing notification {:?}: {}", summary, body);
    }
}
