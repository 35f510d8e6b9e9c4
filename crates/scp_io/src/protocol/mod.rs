//! Control records and responses of the scp protocol.
//!
//! Every exchange is line oriented. The source announces entries with
//! control records and the sink answers each record with a single response:
//!
//! ```text
//! C0644 12 notes.txt\n   file header: mode, size, name
//! D0755 0 photos\n       directory header: mode, ignored size, name
//! E\n                    end of the current directory
//! T1700000000 0 1700000000 0\n   modification and access times
//! ```
//!
//! Responses are `\0` for success, `\x01message\n` for a warning and
//! `\x02message\n` for a fatal error. File payload follows an accepted file
//! header verbatim and is terminated by a `\0` status byte.

use memchr::memchr;

use crate::ScpError;

/// Response byte acknowledging the previous record or payload.
pub const RESPONSE_OK: u8 = 0;
/// Response byte introducing a non-fatal message.
pub const RESPONSE_WARNING: u8 = 1;
/// Response byte introducing a fatal message.
pub const RESPONSE_ERROR: u8 = 2;

/// Longest control line accepted from a peer, newline included.
pub const MAX_CONTROL_LINE: usize = 8192;

/// Permission bits carried by file and directory headers.
pub const MODE_MASK: u32 = 0o7777;

/// A control record announcing an entry or a change of directory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ControlRecord {
    /// `C` record: a regular file follows.
    File {
        /// Permission bits.
        mode: u32,
        /// Payload length in bytes.
        size: u64,
        /// Entry name without any directory component.
        name: String,
    },
    /// `D` record: the following entries belong to a new directory.
    Directory {
        /// Permission bits.
        mode: u32,
        /// Entry name without any directory component.
        name: String,
    },
    /// `E` record: the innermost directory is complete.
    EndDirectory,
    /// `T` record: timestamps for the next file or directory.
    Times {
        /// Modification time in seconds since the epoch.
        mtime: u64,
        /// Access time in seconds since the epoch.
        atime: u64,
    },
}

impl ControlRecord {
    /// Parses a control line. `line` starts with the record tag and excludes
    /// the terminating newline.
    pub fn parse(line: &[u8]) -> Result<Self, ScpError> {
        let Some((&tag, body)) = line.split_first() else {
            return Err(ScpError::protocol("empty control record"));
        };

        match tag {
            b'C' | b'D' => {
                let (mode, rest) = next_field(body, "mode")?;
                let mode = parse_mode(mode)?;
                let (size, name) = next_field(rest, "size")?;
                let size = parse_decimal(size, "size")?;
                let name = String::from_utf8_lossy(name).into_owned();
                validate_name(&name)?;

                if tag == b'C' {
                    Ok(Self::File { mode, size, name })
                } else {
                    Ok(Self::Directory { mode, name })
                }
            }
            b'E' => {
                if body.is_empty() {
                    Ok(Self::EndDirectory)
                } else {
                    Err(ScpError::protocol("trailing data after end-of-directory record"))
                }
            }
            b'T' => {
                let (mtime, rest) = next_field(body, "mtime")?;
                let (_, rest) = next_field(rest, "mtime fraction")?;
                let (atime, fraction) = next_field(rest, "atime")?;
                parse_decimal(fraction, "atime fraction")?;
                Ok(Self::Times {
                    mtime: parse_decimal(mtime, "mtime")?,
                    atime: parse_decimal(atime, "atime")?,
                })
            }
            other => Err(ScpError::protocol(format!(
                "unknown control record tag 0x{other:02x}"
            ))),
        }
    }

    /// Renders the record, newline included.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let line = match self {
            Self::File { mode, size, name } => {
                format!("C{:04o} {size} {name}\n", mode & MODE_MASK)
            }
            Self::Directory { mode, name } => format!("D{:04o} 0 {name}\n", mode & MODE_MASK),
            Self::EndDirectory => "E\n".to_owned(),
            Self::Times { mtime, atime } => format!("T{mtime} 0 {atime} 0\n"),
        };
        line.into_bytes()
    }
}

/// Answer sent by the sink after each record and after each file payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Response {
    /// Success.
    Ok,
    /// Non-fatal message; the sender decides whether to continue.
    Warning(String),
    /// Fatal message.
    Error(String),
}

impl Response {
    /// Renders the response on the wire.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Ok => vec![RESPONSE_OK],
            Self::Warning(message) => framed(RESPONSE_WARNING, message),
            Self::Error(message) => framed(RESPONSE_ERROR, message),
        }
    }

    /// Converts a non-success response into [`ScpError::Remote`].
    pub fn into_result(self) -> Result<(), ScpError> {
        match self {
            Self::Ok => Ok(()),
            Self::Warning(message) => Err(ScpError::Remote {
                fatal: false,
                message,
            }),
            Self::Error(message) => Err(ScpError::Remote {
                fatal: true,
                message,
            }),
        }
    }
}

fn framed(code: u8, message: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(message.len() + 2);
    bytes.push(code);
    bytes.extend(message.bytes().filter(|&byte| byte != b'\n'));
    bytes.push(b'\n');
    bytes
}

/// Rejects names that would escape the directory they are announced in.
pub fn validate_name(name: &str) -> Result<(), ScpError> {
    if name.is_empty() {
        return Err(ScpError::protocol("empty entry name"));
    }
    if name == "." || name == ".." {
        return Err(ScpError::protocol(format!("refusing entry name '{name}'")));
    }
    if name.contains('/') || name.contains('\n') {
        return Err(ScpError::protocol(format!(
            "entry name '{}' contains a separator",
            name.escape_debug()
        )));
    }
    Ok(())
}

/// Quotes a path for the remote shell that runs the peer `scp`.
#[must_use]
pub fn quote_remote_path(path: &str) -> String {
    let mut quoted = String::with_capacity(path.len() + 2);
    quoted.push('\'');
    for ch in path.chars() {
        if ch == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}

fn next_field<'a>(input: &'a [u8], what: &str) -> Result<(&'a [u8], &'a [u8]), ScpError> {
    match memchr(b' ', input) {
        Some(index) => Ok((&input[..index], &input[index + 1..])),
        None => Err(ScpError::protocol(format!(
            "control record ends before its {what} field"
        ))),
    }
}

fn parse_mode(digits: &[u8]) -> Result<u32, ScpError> {
    if digits.is_empty() || digits.len() > 4 || !digits.iter().all(|d| (b'0'..=b'7').contains(d))
    {
        return Err(ScpError::protocol(format!(
            "invalid mode '{}'",
            String::from_utf8_lossy(digits)
        )));
    }
    Ok(digits
        .iter()
        .fold(0u32, |mode, digit| (mode << 3) | u32::from(digit - b'0')))
}

fn parse_decimal(digits: &[u8], what: &str) -> Result<u64, ScpError> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(ScpError::protocol(format!(
            "invalid {what} '{}'",
            String::from_utf8_lossy(digits)
        )));
    }
    digits.iter().try_fold(0u64, |value, digit| {
        value
            .checked_mul(10)
            .and_then(|value| value.checked_add(u64::from(digit - b'0')))
            .ok_or_else(|| ScpError::protocol(format!("{what} overflows 64 bits")))
    })
}

#[cfg(test)]
mod tests;
