//! Client for the [desktop notification service](https://specifications.freedesktop.org/notification-spec/latest/).

use std::collections::HashMap;
use std::time::Duration;

use dbus::arg::{RefArg, Variant};
use dbus::blocking::{Connection, Proxy};

use crate::error::BusError;

const NOTIFICATIONS_NAME: &str = "org.freedesktop.Notifications";
const NOTIFICATIONS_PATH: &str = "/org/freedesktop/Notifications";
const NOTIFICATIONS_INTERFACE: &str = "org.freedesktop.Notifications";

#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash)]
pub enum Urgency {
    Low,
    Normal,
    Critical,
}

impl Urgency {
    fn as_byte(self) -> u8 {
        match self {
            Urgency::Low => 0,
            Urgency::Normal => 1,
            Urgency::Critical => 2,
        }
    }
}

/// Sends notifications on behalf of one application.
pub struct Notifications<'a> {
    conn: &'a Connection,
    app_name: String,
    timeout: Duration,
}

impl<'a> Notifications<'a> {
    pub fn new(conn: &'a Connection, app_name: &str) -> Notifications<'a> {
        Notifications {
            conn,
            app_name: app_name.to_string(),
            timeout: Duration::from_millis(500),
        }
    }

    /// Shows a notification and returns the ID the server assigned to it.
    pub fn notify(&self, summary: &str, body: &str, urgency: Urgency) -> Result<u32, BusError> {
        let mut hints: HashMap<String, Variant<Box<dyn RefArg>>> = HashMap::new();
        hints.insert(
            "urgency".to_string(),
            Variant(Box::new(urgency.as_byte()) as Box<dyn RefArg>),
        );
        let actions: Vec<&str> = Vec::new();

        let proxy = Proxy::new(
            NOTIFICATIONS_NAME,
            NOTIFICATIONS_PATH,
            self.timeout,
            self.conn,
        );
        let (id,): (u32,) = proxy.method_call(
            NOTIFICATIONS_INTERFACE,
            "Notify",
            (
                self.app_name.as_str(),
                0u32,
                "dialog-error",
                summary,
                body,
                actions,
                hints,
                -1i32,
            ),
        )?;
        Ok(id)
    }
}
