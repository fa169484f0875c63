//! Protocol error type
use thiserror::Error;

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ProtoError {
    #[error("Unknown message tag {0}")]
    UnknownTag(u32),

    #[error("Unknown action code {0}")]
    UnknownAction(u32),

    #[error("Client message too short: expected 3 words, got {0}")]
    Truncated(usize),
}
