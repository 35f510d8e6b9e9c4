//! Client orchestration: classify the operands, then run exactly one of the
//! local copy shortcut, the pull engine or the push engine.

use std::error::Error;
use std::fmt;

use engine::pull::copy_from_remote;
use engine::push::copy_to_remote;
use engine::{ExitCode, ProgressReporter, TransferError, TransferSummary};

use crate::config::ClientConfig;
use crate::endpoint::{TransferPlan, plan};
use crate::local_copy::run_local_copy;
use crate::transport::SshTransport;

/// Result of a successful invocation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClientOutcome {
    /// A pull or push completed.
    Transferred(TransferSummary),
    /// The local copy program ran; its exit status is forwarded.
    LocalCopy(i32),
}

/// Error returned when the client orchestration fails.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientError {
    exit_code: i32,
    message: String,
}

impl ClientError {
    /// Creates an error reported with `code`.
    pub fn new(code: ExitCode, message: impl Into<String>) -> Self {
        Self {
            exit_code: code.as_i32(),
            message: message.into(),
        }
    }

    /// Returns the exit code associated with this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Returns the diagnostic text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ClientError {}

impl From<TransferError> for ClientError {
    fn from(error: TransferError) -> Self {
        Self::new(error.exit_code(), error.to_string())
    }
}

/// Runs the copy described by `config`.
pub fn run_client(
    config: &ClientConfig,
    progress: &mut dyn ProgressReporter,
) -> Result<ClientOutcome, ClientError> {
    match plan(config.source(), config.destination())? {
        TransferPlan::LocalCopy { from, to } => {
            run_local_copy(config.local_copy_program(), &from, &to).map(ClientOutcome::LocalCopy)
        }
        TransferPlan::Pull {
            remote,
            destination,
        } => {
            let mut transport = SshTransport::new(&remote, config)?;
            tracing::debug!(target: "scp::connect", from = %remote, "pulling");
            let summary = copy_from_remote(
                &mut transport,
                &remote.path,
                &destination,
                config.recursive(),
                progress,
            )?;
            Ok(ClientOutcome::Transferred(summary))
        }
        TransferPlan::Push { source, remote } => {
            let mut transport = SshTransport::new(&remote, config)?;
            tracing::debug!(target: "scp::connect", to = %remote, "pushing");
            let summary = copy_to_remote(
                &mut transport,
                &source,
                &remote.path,
                config.recursive(),
                progress,
            )?;
            Ok(ClientOutcome::Transferred(summary))
        }
    }
}
