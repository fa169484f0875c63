//! D-Bus client error type
use dbus::Error as DBusError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BusError {
    #[error("XDG_SESSION_ID not set")]
    NoSessionId,

    #[error("Could not subscribe to {signal}")]
    MatchFailed {
        signal: &'static str,
        #[source]
        source: DBusError,
    },

    #[error("D-Bus operation failed")]
    DBusError {
        #[from]
        source: DBusError,
    },

    #[error("{message}")]
    InhibitorFileError {
        message: String,
        #[source]
        source: nix::Error,
    },
}

impl BusError {
    pub fn match_failed(signal: &'static str, error: DBusError) -> BusError {
        BusError::MatchFailed {
            signal,
            source: error,
        }
    }

    pub fn inhibitor_file_error(message: String, error: nix::Error) -> BusError {
        BusError::InhibitorFileError {
            message,
            source: error,
        }
    }
}
