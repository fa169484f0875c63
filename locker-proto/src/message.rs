//! Client-message codec.

use crate::action::Action;
use crate::error::ProtoError;

/// Name of the X11 atom used as the client message type.
pub const CLIENT_MESSAGE: &str = "LOCKER_CLIENT_MESSAGE";

/// Tag identifying an action request in the first data word.
pub const MESSAGE_ACTION: u32 = 0;

/// A control message sent to the daemon.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Message {
    /// Perform an action. `flag` is only meaningful for [`Action::ShowPreferences`], where it
    /// selects between showing and hiding the preferences.
    Action { action: Action, flag: bool },
}

impl Message {
    pub fn action(action: Action, flag: bool) -> Message {
        Message::Action { action, flag }
    }

    /// Encodes the message as the 32-bit data words of a client message.
    pub fn encode(&self) -> [u32; 5] {
        match *self {
            Message::Action { action, flag } => [MESSAGE_ACTION, action.code(), flag as u32, 0, 0],
        }
    }

    /// Decodes the 32-bit data words of a client message. Trailing words are ignored.
    pub fn decode(data: &[u32]) -> Result<Message, ProtoError> {
        if data.len() < 3 {
            return Err(ProtoError::Truncated(data.len()));
        }

        match data[0] {
            MESSAGE_ACTION => Ok(Message::Action {
                action: Action::from_code(data[1])?,
                flag: data[2] != 0,
            }),
            tag => Err(ProtoError::UnknownTag(tag)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_lock() {
        let message = Message::action(Action::Lock, false);
        assert_eq!(message.encode(), [MESSAGE_ACTION, 4, 0, 0, 0]);
    }

    #[test]
    fn test_decode_show_preferences_flag() {
        let decoded = Message::decode(&[MESSAGE_ACTION, 7, 1, 0, 0]).unwrap();
        assert_eq!(decoded, Message::action(Action::ShowPreferences, true));
    }

    #[test]
    fn test_decode_rejects_unknown_tag() {
        assert_eq!(Message::decode(&[3, 4, 0]), Err(ProtoError::UnknownTag(3)));
    }

    #[test]
    fn test_decode_rejects_short_payload() {
        assert_eq!(Message::decode(&[0, 4]), Err(ProtoError::Truncated(2)));
    }
}
