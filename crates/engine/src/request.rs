use std::fmt;

/// Event pulled from a [`TransferChannel`](crate::TransferChannel).
///
/// `NewFile` and `NewDirectory` must be accepted before their payload or
/// children can be read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransferRequest {
    /// The peer offers a regular file.
    NewFile {
        /// Entry name, without directory components.
        name: String,
        /// Payload length in bytes.
        size: u64,
        /// Permission bits.
        mode: u32,
    },
    /// The peer offers a directory.
    NewDirectory {
        /// Entry name, without directory components.
        name: String,
        /// Permission bits.
        mode: u32,
    },
    /// The current directory is complete.
    EndOfDirectory,
    /// The peer reported a non-fatal problem.
    Warning {
        /// Text supplied by the peer.
        message: String,
    },
    /// The channel failed or the peer reported a fatal error.
    ProtocolError {
        /// Description of the failure.
        message: String,
    },
    /// The peer has nothing more to send.
    EndOfStream,
    /// The peer sent an unrecognized request code.
    Unexpected {
        /// First byte of the unrecognized request.
        raw_code: u8,
    },
}

impl fmt::Display for TransferRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewFile { name, size, mode } => {
                write!(f, "file '{name}' ({size} bytes, mode {mode:04o})")
            }
            Self::NewDirectory { name, mode } => {
                write!(f, "directory '{name}' (mode {mode:04o})")
            }
            Self::EndOfDirectory => f.write_str("end of directory"),
            Self::Warning { message } => write!(f, "warning: {message}"),
            Self::ProtocolError { message } => write!(f, "error: {message}"),
            Self::EndOfStream => f.write_str("end of stream"),
            Self::Unexpected { raw_code } => write!(f, "unexpected request 0x{raw_code:02x}"),
        }
    }
}
