//! Engine transport backed by an `ssh` subprocess per request.

use std::ffi::OsString;
use std::io;

use engine::{ExitCode, RequestMode, TransferChannel, TransferError, TransferRequest, Transport};
use scp_io::ssh::{RemoteOperand, SshChildHandle, SshCommand, SshReader, SshWriter};
use scp_io::{PullEvent, ScpError, ScpRequest, ScpSession};

use crate::client::ClientError;
use crate::config::ClientConfig;

type Session = ScpSession<SshReader, SshWriter>;

/// Opens scp requests on one remote host.
///
/// Every request spawns its own remote shell running `scp -f` or `scp -t`.
#[derive(Clone, Debug)]
pub struct SshTransport {
    command: SshCommand,
    target: String,
}

impl SshTransport {
    /// Prepares the remote shell invocation for `remote` from `config`.
    pub fn new(remote: &RemoteOperand, config: &ClientConfig) -> Result<Self, ClientError> {
        let mut command = SshCommand::new(remote.host.as_str());
        if let Some(user) = &remote.user {
            command.set_user(user.as_str());
        }
        if let Some(shell) = config.remote_shell() {
            command.configure_remote_shell(shell).map_err(|error| {
                ClientError::new(
                    ExitCode::Syntax,
                    format!("invalid remote shell '{}': {error}", shell.to_string_lossy()),
                )
            })?;
        }
        if let Some(port) = config.port() {
            command.set_port(port);
        }
        if let Some(identity) = config.identity() {
            command.set_identity(identity);
        }
        for option in config.ssh_options() {
            command.push_option("-o");
            command.push_option(option.clone());
        }
        command.set_batch_mode(config.batch_mode());

        let target = match &remote.user {
            Some(user) => format!("{user}@{}", remote.host),
            None => remote.host.clone(),
        };
        Ok(Self { command, target })
    }

    /// Returns the `[user@]host` this transport connects to.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the program and arguments a request for `path` would run.
    #[must_use]
    pub fn command_line(
        &self,
        mode: RequestMode,
        recursive: bool,
        path: &str,
    ) -> (OsString, Vec<OsString>) {
        self.command_for(mode, recursive, path)
            .command_parts_for_testing()
    }

    fn command_for(&self, mode: RequestMode, recursive: bool, path: &str) -> SshCommand {
        let request = ScpRequest::new(mode, recursive, path);
        let mut command = self.command.clone();
        command.set_remote_command([request.remote_command()]);
        command
    }

    fn connection_error(&self, reason: String) -> TransferError {
        TransferError::Connection {
            target: self.target.clone(),
            reason,
        }
    }
}

impl Transport for SshTransport {
    type Channel = SshChannel;

    fn open_request(
        &mut self,
        mode: RequestMode,
        recursive: bool,
        path: &str,
    ) -> Result<Self::Channel, TransferError> {
        let connection = self
            .command_for(mode, recursive, path)
            .spawn()
            .map_err(|error| self.connection_error(error.to_string()))?;
        let (reader, writer, child) = connection
            .split()
            .map_err(|error| self.connection_error(error.to_string()))?;

        tracing::debug!(
            target: "scp::connect",
            host = %self.target,
            path,
            "remote shell started"
        );
        Ok(SshChannel {
            session: Some(ScpSession::new(mode, reader, writer)),
            child: Some(child),
            target: self.target.clone(),
            received_any: false,
            failure: None,
        })
    }
}

/// An scp session running over the pipes of its own remote shell.
pub struct SshChannel {
    session: Option<Session>,
    child: Option<SshChildHandle>,
    target: String,
    received_any: bool,
    failure: Option<TransferError>,
}

impl SshChannel {
    fn session(&mut self) -> Result<&mut Session, TransferError> {
        self.session
            .as_mut()
            .ok_or_else(|| TransferError::protocol("request already closed"))
    }

    /// Reaps the remote shell once its end of the stream went away and
    /// describes how it ended. `detail` is used when the shell cannot be
    /// reaped cleanly.
    fn shell_exit_reason(&mut self, stream_ended: bool, detail: String) -> String {
        let Some(child) = self.child.take() else {
            return detail;
        };
        if !stream_ended {
            let _ = child.terminate();
            return detail;
        }
        self.session = None;
        match child.wait() {
            Ok(status) if !status.success() => format!("remote shell exited with {status}"),
            Ok(_) => detail,
            Err(error) => error.to_string(),
        }
    }

    fn connection_failure(&mut self, stream_ended: bool, detail: String) -> TransferError {
        let reason = self.shell_exit_reason(stream_ended, detail);
        TransferError::Connection {
            target: self.target.clone(),
            reason,
        }
    }
}

fn is_stream_end(error: &ScpError) -> bool {
    match error {
        ScpError::Io(error) => matches!(
            error.kind(),
            io::ErrorKind::UnexpectedEof | io::ErrorKind::BrokenPipe
        ),
        ScpError::Protocol(_) => true,
        ScpError::Remote { .. } | ScpError::InvalidState(_) => false,
    }
}

impl TransferChannel for SshChannel {
    fn init(&mut self) -> Result<(), TransferError> {
        match self.session()?.init() {
            Ok(()) => Ok(()),
            Err(error @ (ScpError::Remote { .. } | ScpError::InvalidState(_))) => Err(error.into()),
            Err(error) => Err(self.connection_failure(is_stream_end(&error), error.to_string())),
        }
    }

    fn pull_request(&mut self) -> TransferRequest {
        let event = match self.session() {
            Ok(session) => session.pull_request(),
            Err(error) => {
                return TransferRequest::ProtocolError {
                    message: error.to_string(),
                };
            }
        };
        let first = !self.received_any;
        self.received_any = true;
        let failure = match event {
            Ok(PullEvent::EndOfStream) if first => {
                self.connection_failure(true, "remote shell closed the connection".to_owned())
            }
            Ok(event) => return event.into(),
            Err(error) if first && !error.is_remote() => {
                self.connection_failure(is_stream_end(&error), error.to_string())
            }
            Err(error) => {
                return TransferRequest::ProtocolError {
                    message: error.to_string(),
                };
            }
        };
        let message = failure.to_string();
        self.failure = Some(failure);
        TransferRequest::ProtocolError { message }
    }

    fn take_failure(&mut self) -> Option<TransferError> {
        self.failure.take()
    }

    fn accept_request(&mut self) -> Result<(), TransferError> {
        Ok(self.session()?.accept_request()?)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransferError> {
        Ok(self.session()?.read(buf)?)
    }

    fn push_file(&mut self, name: &str, size: u64, mode: u32) -> Result<(), TransferError> {
        Ok(self.session()?.push_file(name, size, mode)?)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransferError> {
        Ok(self.session()?.write(data)?)
    }

    fn push_directory(&mut self, name: &str, mode: u32) -> Result<(), TransferError> {
        Ok(self.session()?.push_directory(name, mode)?)
    }

    fn leave_directory(&mut self) -> Result<(), TransferError> {
        Ok(self.session()?.leave_directory()?)
    }

    /// Ends the session, closes the remote shell's input and reaps it.
    fn close(&mut self) -> Result<(), TransferError> {
        let closed = match self.session.take() {
            Some(mut session) => session.close(),
            None => Ok(()),
        };
        let Some(child) = self.child.take() else {
            return Ok(closed?);
        };
        if closed.is_err() {
            let _ = child.terminate();
            return Ok(closed?);
        }

        let status = child
            .wait()
            .map_err(|source| TransferError::Stream { source })?;
        tracing::debug!(target: "scp::connect", %status, "remote shell exited");
        if status.success() {
            Ok(())
        } else {
            Err(TransferError::Remote {
                message: format!("remote scp on {} exited with {status}", self.target),
            })
        }
    }
}
