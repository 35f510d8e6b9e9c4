//! Remote shell invocation for scp transfers.
//!
//! The transfer runs the peer `scp` through the system `ssh` client (or any
//! compatible program configured with `-S`/`OC_SCP_RSH`). Host key checking,
//! authentication, and credential prompts are left entirely to that client.

mod connection;
mod operand;

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::process::{Command, Stdio};

use thiserror::Error;

pub use connection::{SshChildHandle, SshConnection, SshReader, SshWriter};
pub use operand::{OperandError, RemoteOperand, operand_is_remote, parse_ssh_operand};

/// Program used when no remote shell override is configured.
pub const DEFAULT_REMOTE_SHELL: &str = "ssh";

/// Builder for the `ssh` subprocess that carries an scp exchange.
#[derive(Clone, Debug)]
pub struct SshCommand {
    program: OsString,
    user: Option<OsString>,
    host: OsString,
    port: Option<u16>,
    batch_mode: bool,
    options: Vec<OsString>,
    remote_args: Vec<OsString>,
    target_override: Option<OsString>,
}

impl SshCommand {
    /// Creates a builder targeting `host` with the default `ssh` program.
    #[must_use]
    pub fn new(host: impl Into<OsString>) -> Self {
        Self {
            program: OsString::from(DEFAULT_REMOTE_SHELL),
            user: None,
            host: host.into(),
            port: None,
            batch_mode: false,
            options: Vec::new(),
            remote_args: Vec::new(),
            target_override: None,
        }
    }

    /// Overrides the program spawned in place of `ssh`.
    pub fn set_program(&mut self, program: impl Into<OsString>) -> &mut Self {
        self.program = program.into();
        self
    }

    /// Sets the login user.
    pub fn set_user(&mut self, user: impl Into<OsString>) -> &mut Self {
        self.user = Some(user.into());
        self
    }

    /// Sets the TCP port passed through `-p`.
    pub const fn set_port(&mut self, port: u16) -> &mut Self {
        self.port = Some(port);
        self
    }

    /// Adds `-oBatchMode=yes` so the client never prompts interactively.
    pub const fn set_batch_mode(&mut self, enabled: bool) -> &mut Self {
        self.batch_mode = enabled;
        self
    }


    /// Appends an option placed before the target argument.
    pub fn push_option(&mut self, option: impl Into<OsString>) -> &mut Self {
        self.options.push(option.into());
        self
    }

    /// Appends a `-i <identity>` pair.
    pub fn set_identity(&mut self, identity: impl Into<OsString>) -> &mut Self {
        self.options.push(OsString::from("-i"));
        self.options.push(identity.into());
        self
    }

    /// Appends an argument placed after the target argument.
    pub fn push_remote_arg(&mut self, arg: impl Into<OsString>) -> &mut Self {
        self.remote_args.push(arg.into());
        self
    }

    /// Replaces every remote argument with `args`.
    pub fn set_remote_command<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.remote_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the computed `[user@]host` argument. An empty override omits
    /// the target entirely.
    pub fn set_target_override(&mut self, target: Option<impl Into<OsString>>) -> &mut Self {
        self.target_override = target.map(Into::into);
        self
    }

    /// Applies a remote shell specification such as `ssh -p 2222 -o Foo=bar`.
    ///
    /// The first word becomes the program and the remaining words are
    /// prepended to the option list.
    pub fn configure_remote_shell(&mut self, spec: &OsStr) -> Result<&mut Self, RemoteShellError> {
        let mut parts = parse_remote_shell(spec)?.into_iter();
        let program = parts.next().ok_or(RemoteShellError::Empty)?;
        let mut options: Vec<OsString> = parts.collect();
        options.append(&mut self.options);
        self.program = program;
        self.options = options;
        Ok(self)
    }

    /// Spawns the subprocess with piped stdin and stdout. Its stderr is
    /// inherited so the remote shell's own diagnostics reach the user.
    pub fn spawn(&self) -> io::Result<SshConnection> {
        let (program, args) = self.command_parts();
        tracing::debug!(
            target: "scp::cmd",
            program = %program.to_string_lossy(),
            args = ?args,
            "spawning remote shell"
        );

        let mut command = Command::new(&program);
        command.args(&args);
        command.stdin(Stdio::piped());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::inherit());

        let mut child = command.spawn()?;
        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("remote shell stdout was not captured"))?;

        Ok(SshConnection::new(child, stdin, stdout))
    }

    fn command_parts(&self) -> (OsString, Vec<OsString>) {
        let mut args = Vec::with_capacity(self.options.len() + self.remote_args.len() + 4);

        if self.batch_mode {
            args.push(OsString::from("-oBatchMode=yes"));
        }
        if let Some(port) = self.port {
            args.push(OsString::from("-p"));
            args.push(OsString::from(port.to_string()));
        }
        args.extend(self.options.iter().cloned());

        if let Some(target) = self.target_argument() {
            args.push(target);
        }
        args.extend(self.remote_args.iter().cloned());

        (self.program.clone(), args)
    }

    fn target_argument(&self) -> Option<OsString> {
        if let Some(target) = &self.target_override {
            return (!target.is_empty()).then(|| target.clone());
        }
        if self.host.is_empty() && self.user.is_none() {
            return None;
        }

        let mut target = OsString::new();
        if let Some(user) = &self.user {
            target.push(user);
            target.push("@");
        }
        let host = self.host.to_string_lossy();
        if host.contains(':') && !host.starts_with('[') {
            target.push("[");
            target.push(&self.host);
            target.push("]");
        } else {
            target.push(&self.host);
        }
        Some(target)
    }

    /// Exposes the program and argument vector without spawning.
    #[doc(hidden)]
    #[must_use]
    pub fn command_parts_for_testing(&self) -> (OsString, Vec<OsString>) {
        self.command_parts()
    }
}

/// Failure to interpret a remote shell specification.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum RemoteShellError {
    /// The specification contained no words.
    #[error("remote shell specification is empty")]
    Empty,
    /// A quote was opened but never closed.
    #[error("unterminated {0} quote in remote shell specification")]
    UnterminatedQuote(QuoteKind),
    /// A backslash ended the specification.
    #[error("remote shell specification ends with a backslash")]
    TrailingEscape,
}

/// Quote style referenced by [`RemoteShellError::UnterminatedQuote`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QuoteKind {
    /// `'...'`
    Single,
    /// `"..."`
    Double,
}

impl fmt::Display for QuoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Single => "single",
            Self::Double => "double",
        })
    }
}

/// Splits a remote shell specification into words using POSIX-like quoting.
///
/// Single quotes preserve their content literally, double quotes allow
/// backslash escapes, and unquoted whitespace separates words. Quoted empty
/// strings survive as empty words.
pub fn parse_remote_shell(spec: &OsStr) -> Result<Vec<OsString>, RemoteShellError> {
    let text = spec.to_string_lossy();
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(inner) => current.push(inner),
                        None => return Err(RemoteShellError::UnterminatedQuote(QuoteKind::Single)),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped) => current.push(escaped),
                            None => return Err(RemoteShellError::TrailingEscape),
                        },
                        Some(inner) => current.push(inner),
                        None => return Err(RemoteShellError::UnterminatedQuote(QuoteKind::Double)),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => return Err(RemoteShellError::TrailingEscape),
                }
            }
            ch if ch.is_whitespace() => {
                if in_word {
                    words.push(OsString::from(std::mem::take(&mut current)));
                    in_word = false;
                }
            }
            other => {
                in_word = true;
                current.push(other);
            }
        }
    }

    if in_word {
        words.push(OsString::from(current));
    }
    if words.is_empty() {
        return Err(RemoteShellError::Empty);
    }
    Ok(words)
}

#[cfg(test)]
mod tests;
