//! Classification of the two operands into a transfer plan.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use engine::ExitCode;
use scp_io::ssh::{RemoteOperand, operand_is_remote, parse_ssh_operand};

use crate::client::ClientError;

/// One side of the copy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Endpoint {
    /// A path on this host.
    Local(OsString),
    /// A path on a host reached through the remote shell.
    Remote(RemoteOperand),
}

impl Endpoint {
    /// Classifies `operand`. Operands that are not valid UTF-8 are local.
    pub fn classify(operand: &OsStr) -> Result<Self, ClientError> {
        match operand.to_str() {
            Some(text) if operand_is_remote(text) => parse_ssh_operand(text)
                .map(Self::Remote)
                .map_err(|error| ClientError::new(ExitCode::Syntax, error.to_string())),
            _ => Ok(Self::Local(operand.to_owned())),
        }
    }
}

/// What a pair of operands asks for.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransferPlan {
    /// Both sides are local.
    LocalCopy {
        /// Source path.
        from: OsString,
        /// Destination path.
        to: OsString,
    },
    /// Remote source, local destination.
    Pull {
        /// Source on the remote host.
        remote: RemoteOperand,
        /// Local destination.
        destination: PathBuf,
    },
    /// Local source, remote destination.
    Push {
        /// Local source path.
        source: String,
        /// Destination on the remote host.
        remote: RemoteOperand,
    },
}

/// Decides how `source` reaches `destination`.
///
/// Copies between two remote hosts are rejected, as are local push sources
/// that are not valid UTF-8.
pub fn plan(source: &OsStr, destination: &OsStr) -> Result<TransferPlan, ClientError> {
    match (Endpoint::classify(source)?, Endpoint::classify(destination)?) {
        (Endpoint::Local(from), Endpoint::Local(to)) => Ok(TransferPlan::LocalCopy { from, to }),
        (Endpoint::Remote(remote), Endpoint::Local(destination)) => Ok(TransferPlan::Pull {
            remote,
            destination: PathBuf::from(destination),
        }),
        (Endpoint::Local(source), Endpoint::Remote(remote)) => {
            let source = source.into_string().map_err(|source| {
                ClientError::new(
                    ExitCode::Syntax,
                    format!(
                        "source path '{}' is not valid UTF-8",
                        source.to_string_lossy()
                    ),
                )
            })?;
            Ok(TransferPlan::Push { source, remote })
        }
        (Endpoint::Remote(_), Endpoint::Remote(_)) => Err(ClientError::new(
            ExitCode::Unsupported,
            "copying between two remote hosts is not supported",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(user: Option<&str>, host: &str, path: &str) -> RemoteOperand {
        RemoteOperand {
            user: user.map(str::to_owned),
            host: host.to_owned(),
            path: path.to_owned(),
        }
    }

    #[test]
    fn local_pair_is_delegated() {
        assert_eq!(
            plan(OsStr::new("a/b"), OsStr::new("./c:d")).expect("plan"),
            TransferPlan::LocalCopy {
                from: OsString::from("a/b"),
                to: OsString::from("./c:d"),
            }
        );
    }

    #[test]
    fn remote_source_pulls() {
        assert_eq!(
            plan(OsStr::new("alice@example.com:/srv/x"), OsStr::new("out")).expect("plan"),
            TransferPlan::Pull {
                remote: remote(Some("alice"), "example.com", "/srv/x"),
                destination: PathBuf::from("out"),
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn single_letter_host_with_absolute_path_pulls() {
        assert_eq!(
            plan(OsStr::new("h:/x"), OsStr::new("out")).expect("plan"),
            TransferPlan::Pull {
                remote: remote(None, "h", "/x"),
                destination: PathBuf::from("out"),
            }
        );
    }

    #[test]
    fn remote_destination_pushes_to_home_when_path_is_empty() {
        assert_eq!(
            plan(OsStr::new("file.txt"), OsStr::new("[::1]:")).expect("plan"),
            TransferPlan::Push {
                source: "file.txt".to_owned(),
                remote: remote(None, "::1", "."),
            }
        );
    }

    #[test]
    fn two_remotes_are_unsupported() {
        let error = plan(OsStr::new("a:x"), OsStr::new("b:y")).expect_err("must fail");
        assert_eq!(error.exit_code(), ExitCode::Unsupported.as_i32());
        assert!(error.to_string().contains("two remote hosts"));
    }

    #[test]
    fn malformed_remote_is_a_syntax_error() {
        let error = plan(OsStr::new("@host:x"), OsStr::new("out")).expect_err("must fail");
        assert_eq!(error.exit_code(), ExitCode::Syntax.as_i32());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_push_source_is_rejected() {
        use std::os::unix::ffi::OsStrExt;

        let source = OsStr::from_bytes(b"caf\xe9");
        let error = plan(source, OsStr::new("host:dir")).expect_err("must fail");
        assert_eq!(error.exit_code(), ExitCode::Syntax.as_i32());
    }
}
