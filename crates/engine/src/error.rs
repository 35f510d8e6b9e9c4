use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::ExitCode;

/// Failure raised by the pull and push engines.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The transport could not be opened or its handshake failed.
    #[error("failed to connect to {target}: {reason}")]
    Connection {
        /// Host or operand the connection was aimed at.
        target: String,
        /// Human-readable cause.
        reason: String,
    },
    /// The peer sent something the protocol does not allow at this point.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
    /// The peer reported a warning or fatal error.
    #[error("remote: {message}")]
    Remote {
        /// Text supplied by the peer.
        message: String,
    },
    /// The destination for an incoming item could not be determined.
    #[error("cannot resolve destination '{}': {reason}", path.display())]
    Resolution {
        /// Path that failed to resolve.
        path: PathBuf,
        /// Why resolution failed.
        reason: String,
    },
    /// A local filesystem operation failed.
    #[error("failed to {action} '{}': {source}", path.display())]
    Io {
        /// Operation that failed, such as `open` or `create directory`.
        action: &'static str,
        /// Path the operation targeted.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A directory was offered or selected while recursion is disabled.
    #[error("{} is a directory", path.display())]
    RecursionPolicy {
        /// Offending directory.
        path: PathBuf,
    },
    /// Directories are nested deeper than the engine allows.
    #[error("directory nesting exceeds {limit} levels at '{}'", path.display())]
    DepthExceeded {
        /// Directory that would exceed the limit.
        path: PathBuf,
        /// Configured limit.
        limit: usize,
    },
    /// Reading from or writing to the transfer channel failed.
    #[error("transfer stream failed: {source}")]
    Stream {
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl TransferError {
    /// Constructs an I/O error with action and path context.
    #[must_use]
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Constructs a protocol violation.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolViolation(message.into())
    }

    /// Returns the process exit code that reports this error.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Connection { .. } => ExitCode::StartClient,
            Self::ProtocolViolation(_) | Self::DepthExceeded { .. } => ExitCode::Protocol,
            Self::Remote { .. } => ExitCode::PartialTransfer,
            Self::Resolution { .. } | Self::RecursionPolicy { .. } => ExitCode::FileSelect,
            Self::Io { source, .. } => match ExitCode::from_io_error(source) {
                ExitCode::FileSelect => ExitCode::FileSelect,
                _ => ExitCode::FileIo,
            },
            Self::Stream { .. } => ExitCode::StreamIo,
        }
    }
}
