//! Vocabulary shared between the `lockerd` daemon and the `lockerctl` control utility.
//!
//! The daemon listens for X11 client messages of type [`CLIENT_MESSAGE`] on the root window; each
//! message carries a [`Message`] encoded as five 32-bit words.
pub use crate::action::{Action, Event};
pub use crate::error::ProtoError;
pub use crate::message::{Message, CLIENT_MESSAGE, MESSAGE_ACTION};

mod action;
mod error;
mod message;
