use dbus::blocking::Connection;
use dbus::message::MatchRule;
use dbus::{Message, Path};

use crate::error::BusError;

pub(crate) const SESSION_INTERFACE: &str = "org.freedesktop.login1.Session";

#[derive(Debug, Eq, PartialEq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(s: String) -> SessionId {
        SessionId(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Handle to a logind session
pub struct Session<'a> {
    conn: &'a Connection,
    path: Path<'static>,
}

impl<'a> Session<'a> {
    pub(crate) fn new(conn: &'a Connection, path: Path<'static>) -> Session<'a> {
        Session { conn, path }
    }

    /// Object path of the session.
    pub fn path(&self) -> &Path<'static> {
        &self.path
    }

    /// Register a callback to run when something (for example `loginctl lock-session`) asks the
    /// session to lock.
    pub fn on_lock<F: FnMut() + Send + 'static>(&self, cb: F) -> Result<(), BusError> {
        self.on_signal("Lock", cb)
    }

    /// Register a callback to run when something asks the session to unlock.
    pub fn on_unlock<F: FnMut() + Send + 'static>(&self, cb: F) -> Result<(), BusError> {
        self.on_signal("Unlock", cb)
    }

    fn on_signal<F: FnMut() + Send + 'static>(
        &self,
        signal: &'static str,
        mut cb: F,
    ) -> Result<(), BusError> {
        let rule = MatchRule::new_signal(SESSION_INTERFACE, signal).with_path(self.path.clone());
        match self
            .conn
            .add_match(rule, move |_: (), _: &Connection, _: &Message| {
                cb();
                true
            }) {
            Ok(_) => Ok(()),
            Err(e) => Err(BusError::match_failed(signal, e)),
        }
    }
}
