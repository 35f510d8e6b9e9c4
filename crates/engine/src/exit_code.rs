//! Process exit codes reported by `oc-scp`.
//!
//! The numeric values follow the rsync family (`errcode.h`) so that scripts
//! written against either tool can interpret failures the same way.

use std::fmt;
use std::io;

/// Exit codes returned by transfers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful completion.
    Ok = 0,
    /// Syntax or usage error.
    Syntax = 1,
    /// The peer violated the transfer protocol.
    Protocol = 2,
    /// A source or destination could not be selected.
    FileSelect = 3,
    /// The requested action is not supported.
    Unsupported = 4,
    /// The remote shell could not be started or refused the session.
    StartClient = 5,
    /// The connection to the peer broke.
    SocketIo = 10,
    /// Local filesystem error.
    FileIo = 11,
    /// The transfer stream ended or was corrupted.
    StreamIo = 12,
    /// Interrupted by a signal.
    Signal = 20,
    /// The peer reported an error; part of the transfer may be missing.
    PartialTransfer = 23,
}

impl ExitCode {
    /// Returns the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns a human-readable description of this exit code.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::Syntax => "syntax or usage error",
            Self::Protocol => "protocol violation",
            Self::FileSelect => "errors selecting input/output files, dirs",
            Self::Unsupported => "requested action not supported",
            Self::StartClient => "error starting remote shell session",
            Self::SocketIo => "error in connection IO",
            Self::FileIo => "error in file IO",
            Self::StreamIo => "error in transfer data stream",
            Self::Signal => "received SIGINT, SIGTERM, or SIGHUP",
            Self::PartialTransfer => "partial transfer",
        }
    }

    /// Creates an exit code from an i32 value.
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Ok),
            1 => Some(Self::Syntax),
            2 => Some(Self::Protocol),
            3 => Some(Self::FileSelect),
            4 => Some(Self::Unsupported),
            5 => Some(Self::StartClient),
            10 => Some(Self::SocketIo),
            11 => Some(Self::FileIo),
            12 => Some(Self::StreamIo),
            20 => Some(Self::Signal),
            23 => Some(Self::PartialTransfer),
            _ => None,
        }
    }

    /// Maps a local I/O error to an exit code.
    ///
    /// - `NotFound`, `PermissionDenied`, `AlreadyExists` → `FileSelect`
    /// - `BrokenPipe`, `ConnectionReset`, `ConnectionAborted` → `SocketIo`
    /// - `UnexpectedEof`, `InvalidData` → `StreamIo`
    /// - `Interrupted` → `Signal`
    /// - anything else → `FileIo`
    #[must_use]
    pub fn from_io_error(error: &io::Error) -> Self {
        use io::ErrorKind;

        match error.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied | ErrorKind::AlreadyExists => {
                Self::FileSelect
            }
            ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted => {
                Self::SocketIo
            }
            ErrorKind::UnexpectedEof | ErrorKind::InvalidData => Self::StreamIo,
            ErrorKind::Interrupted => Self::Signal,
            _ => Self::FileIo,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        let value = code.as_i32().clamp(0, 255) as u8;
        Self::from(value)
    }
}
