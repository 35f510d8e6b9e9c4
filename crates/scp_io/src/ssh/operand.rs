//! Parsing of `[user@]host:path` operands.

use std::fmt;

use thiserror::Error;

/// Remote endpoint named on the command line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemoteOperand {
    /// Login user, when given as `user@`.
    pub user: Option<String>,
    /// Host name or address, without IPv6 brackets.
    pub host: String,
    /// Path on the remote side. An empty path is reported as `.`.
    pub path: String,
}

impl fmt::Display for RemoteOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{user}@")?;
        }
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.path)
        } else {
            write!(f, "{}:{}", self.host, self.path)
        }
    }
}

/// Failure to interpret an operand as a remote endpoint.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum OperandError {
    /// The operand names a local path.
    #[error("'{0}' is not a remote operand")]
    NotRemote(String),
    /// `@` was present with nothing before it.
    #[error("empty user name in '{0}'")]
    EmptyUser(String),
    /// Nothing was left for the host once user and brackets were removed.
    #[error("empty host name in '{0}'")]
    EmptyHost(String),
}

/// Reports whether `operand` refers to a remote host.
///
/// An operand is remote when a `:` appears before any `/`. A leading `:`
/// stays local, and the colons inside a bracketed IPv6 literal are skipped.
/// On Windows, drive prefixes such as `C:\` are local as well; elsewhere
/// `h:/x` names host `h`.
#[must_use]
pub fn operand_is_remote(operand: &str) -> bool {
    split_remote(operand).is_some()
}

/// Splits a remote operand into user, host, and path.
pub fn parse_ssh_operand(operand: &str) -> Result<RemoteOperand, OperandError> {
    let (login, path) =
        split_remote(operand).ok_or_else(|| OperandError::NotRemote(operand.to_owned()))?;

    let (user, host) = match login.rfind('@') {
        Some(index) => (Some(&login[..index]), &login[index + 1..]),
        None => (None, login),
    };
    if user.is_some_and(str::is_empty) {
        return Err(OperandError::EmptyUser(operand.to_owned()));
    }

    let host = host
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        return Err(OperandError::EmptyHost(operand.to_owned()));
    }

    Ok(RemoteOperand {
        user: user.map(str::to_owned),
        host: host.to_owned(),
        path: if path.is_empty() { ".".to_owned() } else { path.to_owned() },
    })
}

fn split_remote(operand: &str) -> Option<(&str, &str)> {
    let search_from = match operand.find('[') {
        Some(open) if !operand[..open].contains([':', '/']) => {
            open + operand[open..].find(']')?
        }
        _ => 0,
    };

    let colon = search_from + operand[search_from..].find(':')?;
    if colon == 0 || operand[..colon].contains('/') || is_drive_prefix(operand, colon) {
        return None;
    }
    Some((&operand[..colon], &operand[colon + 1..]))
}

#[cfg(windows)]
fn is_drive_prefix(operand: &str, colon: usize) -> bool {
    let bytes = operand.as_bytes();
    colon == 1
        && bytes[0].is_ascii_alphabetic()
        && matches!(bytes.get(2), Some(b'\\' | b'/'))
}

#[cfg(not(windows))]
const fn is_drive_prefix(_operand: &str, _colon: usize) -> bool {
    false
}
