//! D-Bus clients used by the screen locker: `systemd-logind` for suspend, sleep inhibitor locks
//! and session lock requests, and the freedesktop notification service for error reporting.
use std::env;
use std::time::Duration;

use dbus::arg::OwnedFd;
use dbus::blocking::{Connection, Proxy};
use dbus::message::MatchRule;
use dbus::{Message, Path};

pub use crate::error::BusError;
use crate::inhibitor::{InhibitEventSet, InhibitMode, InhibitorLock};
pub use crate::notifications::{Notifications, Urgency};
pub use crate::session::{Session, SessionId};

mod error;
pub mod inhibitor;
mod notifications;
mod session;

const LOGIND_NAME: &str = "org.freedesktop.login1";
const LOGIND_PATH: &str = "/org/freedesktop/login1";
const MANAGER_INTERFACE: &str = "org.freedesktop.login1.Manager";

pub fn session_id() -> Result<SessionId, BusError> {
    match env::var("XDG_SESSION_ID") {
        Ok(id) => Ok(SessionId::new(id)),
        Err(_) => Err(BusError::NoSessionId),
    }
}

/// A logind client connection. This is a relatively thin wrapper over the
/// [D-Bus API](https://www.freedesktop.org/wiki/Software/systemd/logind/).
pub struct Logind<'a> {
    conn: &'a Connection,
    timeout: Duration,
}

impl<'a> Logind<'a> {
    pub fn new(conn: &'a Connection) -> Logind<'a> {
        Logind {
            conn,
            timeout: Duration::from_millis(500),
        }
    }

    /// Get a handle to a logind session by ID.
    pub fn session(&self, id: &SessionId) -> Result<Session<'a>, BusError> {
        let (path,): (Path<'static>,) =
            self.manager()
                .method_call(MANAGER_INTERFACE, "GetSession", (id.as_str(),))?;
        Ok(Session::new(self.conn, path))
    }

    /// Get a handle to the current logind session.
    pub fn current_session(&self) -> Result<Session<'a>, BusError> {
        let id = session_id()?;
        self.session(&id)
    }

    pub fn inhibit(
        &self,
        who: &str,
        why: &str,
        events: &InhibitEventSet,
        mode: InhibitMode,
    ) -> Result<InhibitorLock, BusError> {
        let (fd,): (OwnedFd,) = self.manager().method_call(
            MANAGER_INTERFACE,
            "Inhibit",
            (events.as_str(), who, why, mode.as_str()),
        )?;
        Ok(InhibitorLock::new(fd))
    }

    /// Asks logind to suspend the system. With `interactive`, polkit may prompt the user for
    /// authorization.
    pub fn suspend(&self, interactive: bool) -> Result<(), BusError> {
        let () = self
            .manager()
            .method_call(MANAGER_INTERFACE, "Suspend", (interactive,))?;
        Ok(())
    }

    /// Registers a callback for logind's `PrepareForSleep` signal. The callback receives `true`
    /// right before the system sleeps and `false` after it resumes.
    pub fn on_prepare_for_sleep<F: FnMut(bool) + Send + 'static>(
        &self,
        mut cb: F,
    ) -> Result<(), BusError> {
        let rule = MatchRule::new_signal(MANAGER_INTERFACE, "PrepareForSleep")
            .with_path(Path::from(LOGIND_PATH));
        match self.conn.add_match(
            rule,
            move |(starting,): (bool,), _: &Connection, _: &Message| {
                cb(starting);
                true
            },
        ) {
            Ok(_) => Ok(()),
            Err(e) => Err(BusError::match_failed("PrepareForSleep", e)),
        }
    }

    fn manager(&self) -> Proxy<'_, &'a Connection> {
        Proxy::new(LOGIND_NAME, LOGIND_PATH, self.timeout, self.conn)
    }
}
