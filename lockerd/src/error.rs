//! Locker error types
use std::io;
use std::path::PathBuf;

use locker_dbus::BusError;
use locker_proto::{Action, Event, ProtoError};
use thiserror::Error;

use crate::plugin::PluginKind;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration")]
    Parse {
        #[from]
        source: toml::de::Error,
    },

    #[error("Could not serialize configuration")]
    Serialize {
        #[from]
        source: toml::ser::Error,
    },
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum PluginError {
    #[error("No {kind} plugin named {name}")]
    NotFound { kind: PluginKind, name: String },

    #[error("{0}")]
    Failed(String),

    #[error("A {kind} plugin cannot {capability}")]
    Unsupported {
        kind: PluginKind,
        capability: &'static str,
    },
}

impl PluginError {
    pub fn failed<S: Into<String>>(message: S) -> PluginError {
        PluginError::Failed(message.into())
    }
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Could not connect to X server")]
    Connect {
        #[source]
        source: xcb::ConnError,
    },

    #[error("Could not get X11 screen {0}")]
    NoScreen(i32),

    #[error("X extension {0} not present")]
    MissingExtension(&'static str),

    #[error("X request {request} failed with error code {code}")]
    Request { request: &'static str, code: u8 },
}

impl DisplayError {
    /// Adapter for `map_err` on xcb cookies.
    pub fn request(request: &'static str) -> impl Fn(xcb::GenericError) -> DisplayError {
        move |err| DisplayError::Request {
            request,
            code: err.error_code(),
        }
    }
}

#[derive(Error, Debug)]
pub enum PowerError {
    #[error("logind refused to suspend")]
    Logind {
        #[from]
        source: BusError,
    },

    #[error("Could not write to {}", path.display())]
    Sysfs {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum LockerError {
    #[error("A plugin vetoed the transition at {0}")]
    Vetoed(Event),

    #[error("Authentication plugin refused to {action}")]
    AuthRefused {
        action: Action,
        #[source]
        source: PluginError,
    },

    #[error("Could not suspend")]
    Suspend {
        #[from]
        source: PowerError,
    },

    #[error("Invalid control message")]
    Message {
        #[from]
        source: ProtoError,
    },

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Display(#[from] DisplayError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("The locker has shut down")]
    ShutDown,
}
