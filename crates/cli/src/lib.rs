#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` implements the command-line front-end of `oc-scp`. It parses the
//! options, classifies the two operands as local or remote, and hands control
//! to exactly one of the local copy shortcut (`cp -R`), the pull engine or
//! the push engine.
//!
//! # Design
//!
//! [`run`] accepts an iterator of arguments together with handles for
//! standard output and error and returns the process exit code. A
//! [`clap`](https://docs.rs/clap/) command definition performs the parse;
//! environment defaults (`OC_SCP_RSH`, `OC_SCP_CP`) are merged into a
//! [`ClientConfig`], and [`run_client`] executes the plan. Remote operands are
//! served by [`SshTransport`], which spawns one remote shell per request and
//! speaks the scp protocol over its pipes.
//!
//! # Invariants
//!
//! - `run` never panics; failures surface as non-zero exit codes together
//!   with an `oc-scp: error: ...` diagnostic.
//! - Copies between two remote hosts are rejected before anything is spawned.
//! - The load bar is drawn only when standard output is a terminal and
//!   `--quiet` is absent.
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let exit_code = cli::run(["oc-scp", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(exit_code, 0);
//! assert!(String::from_utf8(stdout).unwrap().starts_with("oc-scp "));
//! assert!(stderr.is_empty());
//! ```

mod arguments;
mod client;
mod config;
mod endpoint;
mod local_copy;
mod message;
mod progress;
mod transport;

use std::env;
use std::ffi::OsString;
use std::io::{self, Write};
use std::time::Instant;

use engine::{NoProgress, ProgressReporter};
use is_terminal::IsTerminal;
use logging::{VerbosityConfig, init_tracing};

use arguments::{ParsedArgs, parse_args, render_help};

pub use client::{ClientError, ClientOutcome, run_client};
pub use config::{CP_ENV, ClientConfig, ClientConfigBuilder, DEFAULT_LOCAL_COPY_PROGRAM, RSH_ENV};
pub use endpoint::{Endpoint, TransferPlan, plan};
pub use local_copy::run_local_copy;
pub use progress::{BAR_WIDTH, LoadBar, render_bar};
pub use transport::{SshChannel, SshTransport};

/// Version reported by `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum exit code representable by a Unix process.
const MAX_EXIT_CODE: i32 = u8::MAX as i32;

/// Runs the CLI using the provided argument iterator and output handles.
///
/// Returns the process exit code: `0` on success, the forwarded status of
/// the local copy program, or the code mapped from the failure.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    match parse_args(arguments) {
        Ok(parsed) => execute(parsed, stdout, stderr),
        Err(error) => {
            let rendered = error.to_string();
            let first_line = rendered.lines().next().unwrap_or_default();
            let detail = first_line.strip_prefix("error: ").unwrap_or(first_line);
            let _ = message::write_error(stderr, detail);
            let _ = writeln!(stderr, "{}", message::USAGE);
            engine::ExitCode::Syntax.as_i32()
        }
    }
}

fn execute<Out, Err>(parsed: ParsedArgs, stdout: &mut Out, stderr: &mut Err) -> i32
where
    Out: Write,
    Err: Write,
{
    if parsed.show_help {
        return match stdout.write_all(render_help().as_bytes()) {
            Ok(()) => 0,
            Err(_) => 1,
        };
    }
    if parsed.show_version {
        return match writeln!(stdout, "oc-scp {VERSION}") {
            Ok(()) => 0,
            Err(_) => 1,
        };
    }

    let ParsedArgs {
        recursive,
        port,
        identity,
        ssh_options,
        rsh,
        batch_mode,
        quiet,
        verbosity,
        operands,
        ..
    } = parsed;

    let [source, destination]: [OsString; 2] = match operands.try_into() {
        Ok(pair) => pair,
        Err(operands) => {
            let operands: Vec<OsString> = operands;
            let _ = message::write_error(
                stderr,
                format_args!("expected exactly two operands, got {}", operands.len()),
            );
            let _ = writeln!(stderr, "{}", message::USAGE);
            return engine::ExitCode::Syntax.as_i32();
        }
    };

    let config = ClientConfig::builder()
        .operands(source, destination)
        .recursive(recursive)
        .port(port)
        .identity(identity)
        .ssh_options(ssh_options)
        .remote_shell(rsh)
        .remote_shell_fallback(env::var_os(RSH_ENV))
        .batch_mode(batch_mode)
        .local_copy_program(env::var_os(CP_ENV))
        .verbosity(verbosity)
        .quiet(quiet)
        .build();

    let _ = init_tracing(VerbosityConfig::from_verbose_level(verbosity).with_quiet(quiet));

    let started = Instant::now();
    let show_bar = !config.quiet() && io::stdout().is_terminal();
    let result = if show_bar {
        let mut bar = LoadBar::new(&mut *stdout);
        run_client(&config, &mut bar as &mut dyn ProgressReporter)
    } else {
        run_client(&config, &mut NoProgress)
    };

    match result {
        Ok(ClientOutcome::Transferred(summary)) => {
            tracing::info!(
                target: "scp::stats",
                elapsed_ms = started.elapsed().as_millis(),
                "transfer finished"
            );
            if config.verbosity() > 0 && !config.quiet() {
                let _ = message::write_summary(stdout, &summary);
            }
            0
        }
        Ok(ClientOutcome::LocalCopy(status)) => status,
        Err(error) => {
            let _ = message::write_error(stderr, &error);
            error.exit_code()
        }
    }
}

/// Converts a numeric exit code into an [`std::process::ExitCode`].
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    std::process::ExitCode::from(clamp_status(status))
}

fn clamp_status(status: i32) -> u8 {
    u8::try_from(status.clamp(0, MAX_EXIT_CODE)).unwrap_or(u8::MAX)
}
