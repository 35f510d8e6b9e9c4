//! Local-to-local copies, delegated to `cp -R`.

use std::ffi::{OsStr, OsString};
use std::process::{Command, ExitStatus};

use engine::ExitCode;
use scp_io::ssh::parse_remote_shell;

use crate::client::ClientError;

/// Runs `program -R from to` and returns the exit status to forward.
///
/// `program` may carry its own arguments (`cp -p`), split with the same
/// quoting rules as a remote shell specification.
pub fn run_local_copy(program: &OsStr, from: &OsStr, to: &OsStr) -> Result<i32, ClientError> {
    let (program, args) = local_copy_command(program, from, to)?;
    tracing::debug!(
        target: "scp::cmd",
        program = %program.to_string_lossy(),
        args = ?args,
        "local copy"
    );

    let status = Command::new(&program).args(&args).status().map_err(|error| {
        ClientError::new(
            ExitCode::StartClient,
            format!("failed to run '{}': {error}", program.to_string_lossy()),
        )
    })?;
    Ok(forwarded_status(status))
}

fn local_copy_command(
    program: &OsStr,
    from: &OsStr,
    to: &OsStr,
) -> Result<(OsString, Vec<OsString>), ClientError> {
    let mut words = parse_remote_shell(program)
        .map_err(|error| {
            ClientError::new(
                ExitCode::Syntax,
                format!(
                    "invalid local copy program '{}': {error}",
                    program.to_string_lossy()
                ),
            )
        })?
        .into_iter();
    let program = words
        .next()
        .ok_or_else(|| ClientError::new(ExitCode::Syntax, "local copy program is empty"))?;

    let mut args: Vec<OsString> = words.collect();
    args.push(OsString::from("-R"));
    args.push(from.to_owned());
    args.push(to.to_owned());
    Ok((program, args))
}

fn forwarded_status(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => ExitCode::Signal.as_i32(),
    }
}
