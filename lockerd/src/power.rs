//! System suspend.

use std::fs;
use std::path::PathBuf;

use dbus::blocking::Connection;
use log::{debug, info, warn};

use locker_dbus::Logind;

use crate::error::PowerError;

const SYSFS_POWER_STATE: &str = "/sys/power/state";

pub trait Power {
    /// Puts the machine to sleep. Returns once the request was accepted.
    fn suspend(&mut self) -> Result<(), PowerError>;
}

/// Suspends through systemd-logind, or the kernel directly when logind cannot be reached.
pub struct LogindPower {
    conn: Option<Connection>,
    sysfs: PathBuf,
}

impl LogindPower {
    pub fn new() -> LogindPower {
        let conn = match Connection::new_system() {
            Ok(conn) => Some(conn),
            Err(err) => {
                warn!("Could not connect to the system bus, suspending through sysfs: {}", err);
                None
            }
        };
        LogindPower {
            conn,
            sysfs: PathBuf::from(SYSFS_POWER_STATE),
        }
    }

    fn suspend_sysfs(&self) -> Result<(), PowerError> {
        debug!("Writing mem to {}", self.sysfs.display());
        fs::write(&self.sysfs, "mem").map_err(|source| PowerError::Sysfs {
            path: self.sysfs.clone(),
            source,
        })
    }
}

impl Default for LogindPower {
    fn default() -> Self {
        LogindPower::new()
    }
}

impl Power for LogindPower {
    fn suspend(&mut self) -> Result<(), PowerError> {
        info!("Suspending");
        match self.conn {
            Some(ref conn) => match Logind::new(conn).suspend(true) {
                Ok(()) => Ok(()),
                Err(err) => {
                    warn!("logind could not suspend, trying sysfs: {}", err);
                    self.suspend_sysfs().map_err(|_| PowerError::from(err))
                }
            },
            None => self.suspend_sysfs(),
        }
    }
}
