use std::io;

use thiserror::Error;

/// Failure raised while driving an scp exchange.
#[derive(Debug, Error)]
pub enum ScpError {
    /// Reading from or writing to the underlying pipes failed.
    #[error("i/o error on scp channel: {0}")]
    Io(#[from] io::Error),
    /// The peer answered with a warning (`\x01`) or fatal (`\x02`) message.
    #[error("{message}")]
    Remote {
        /// Whether the peer flagged the message as fatal.
        fatal: bool,
        /// Text supplied by the peer, without the trailing newline.
        message: String,
    },
    /// The peer sent traffic that does not follow the scp framing rules.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The caller invoked an operation the session cannot perform right now.
    #[error("invalid scp session state: {0}")]
    InvalidState(&'static str),
}

impl ScpError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Reports whether the error originated from a message sent by the peer.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}
