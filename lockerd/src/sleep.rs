//! Locking around system sleep and logind session requests.

use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use dbus::blocking::Connection;
use log::{debug, info, warn};

use locker_dbus::inhibitor::{InhibitEvent, InhibitEventSet, InhibitMode, InhibitorLock};
use locker_dbus::{BusError, Logind, Session};
use locker_proto::Action;

use crate::controller::Controller;
use crate::display::Display;

const INHIBITOR_WHO: &str = "lockerd";
const INHIBITOR_WHY: &str = "Lock screen on sleep";

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SleepEvent {
    /// The system is about to sleep
    PreSleep,

    /// The system resumed
    PostSleep,

    /// `loginctl lock-session`
    SessionLock,

    /// `loginctl unlock-session`
    SessionUnlock,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum InhibitorChange {
    Keep,
    Release,
    Acquire,
}

/// Watches logind on the system bus.
///
/// The monitor holds a sleep delay inhibitor lock whenever the system is awake, so that the screen
/// is locked before the system actually sleeps. The lock is released once the locker is up and
/// taken again on resume.
pub struct SleepMonitor {
    conn: Connection,
    inhibitor: Option<InhibitorLock>,
    events: Receiver<SleepEvent>,
}

impl SleepMonitor {
    pub fn new() -> Result<SleepMonitor, BusError> {
        let conn = Connection::new_system()?;
        let (tx, events) = mpsc::channel();

        {
            let logind = Logind::new(&conn);
            let sleep_tx = tx.clone();
            logind.on_prepare_for_sleep(move |starting| {
                let event = if starting {
                    SleepEvent::PreSleep
                } else {
                    SleepEvent::PostSleep
                };
                // The receiver only goes away with the monitor
                let _ = sleep_tx.send(event);
            })?;

            match logind.current_session() {
                Ok(session) => subscribe_session(&session, tx)?,
                Err(err) => warn!("Not watching session lock requests: {}", err),
            }
        }

        let mut monitor = SleepMonitor {
            conn,
            inhibitor: None,
            events,
        };
        monitor.take_inhibitor()?;
        Ok(monitor)
    }

    /// Processes pending D-Bus messages without blocking and applies the resulting events.
    pub fn process<D: Display>(&mut self, controller: &mut Controller<D>) -> Result<(), BusError> {
        while self.conn.process(Duration::from_millis(0))? {}

        while let Ok(event) = self.events.try_recv() {
            match apply(controller, event) {
                InhibitorChange::Keep => (),
                InhibitorChange::Release => self.release_inhibitor(),
                InhibitorChange::Acquire => {
                    if let Err(err) = self.take_inhibitor() {
                        warn!("Could not take a new sleep inhibitor: {}", err);
                    }
                }
            }
        }
        Ok(())
    }

    fn take_inhibitor(&mut self) -> Result<(), BusError> {
        if self.inhibitor.is_some() {
            return Ok(());
        }
        let events = InhibitEventSet::with_event(InhibitEvent::Sleep);
        let lock = Logind::new(&self.conn).inhibit(
            INHIBITOR_WHO,
            INHIBITOR_WHY,
            &events,
            InhibitMode::Delay,
        )?;
        debug!("Took inhibitor lock {}", lock);
        self.inhibitor = Some(lock);
        Ok(())
    }

    fn release_inhibitor(&mut self) {
        if let Some(lock) = self.inhibitor.take() {
            debug!("Releasing inhibitor lock {}", lock);
            if let Err(err) = lock.release() {
                warn!("{}", err);
            }
        }
    }
}

fn subscribe_session(session: &Session<'_>, tx: Sender<SleepEvent>) -> Result<(), BusError> {
    debug!("Watching session {}", session.path());
    let lock_tx = tx.clone();
    session.on_lock(move || {
        let _ = lock_tx.send(SleepEvent::SessionLock);
    })?;
    session.on_unlock(move || {
        let _ = tx.send(SleepEvent::SessionUnlock);
    })
}

fn apply<D: Display>(controller: &mut Controller<D>, event: SleepEvent) -> InhibitorChange {
    match event {
        SleepEvent::PreSleep => {
            controller.prepare_for_sleep();
            InhibitorChange::Release
        }
        SleepEvent::PostSleep => {
            info!("Resumed from sleep");
            InhibitorChange::Acquire
        }
        SleepEvent::SessionLock => {
            if let Err(err) = controller.dispatch(Action::Lock, false) {
                controller.report_failure(&err);
            }
            InhibitorChange::Keep
        }
        SleepEvent::SessionUnlock => {
            // Unlocking must go through the authenticator
            info!("Ignoring session unlock request");
            InhibitorChange::Keep
        }
    }
}
