#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `engine` drives file transfers for `oc-scp`. It owns the two transfer
//! directions and the pieces they share:
//!
//! - [`pull::copy_from_remote`] consumes requests from a [`TransferChannel`]
//!   and materializes files and directories on the local filesystem.
//! - [`push::copy_to_remote`] walks a local file or tree and announces every
//!   entry through the channel.
//! - [`resolve::resolve_destination`] decides where an incoming item lands.
//! - [`ProgressReporter`] receives byte counts while file bodies move.
//!
//! # Design
//!
//! The engines never talk to the network directly. A [`Transport`] opens a
//! request and hands back a [`TransferChannel`]; the implementation for
//! [`scp_io::ScpSession`] lives in [`channel`], and tests substitute a
//! scripted channel. State shared by one top-level copy is threaded through a
//! [`TransferContext`] that each recursive call borrows mutably.
//!
//! Directories are processed depth first on the call stack, bounded by
//! [`MAX_DIRECTORY_DEPTH`]. Child paths are always built by joining onto the
//! parent path; the process working directory is never changed.
//!
//! # Errors
//!
//! Every operation returns [`TransferError`]. Each variant maps to an
//! [`ExitCode`] through [`TransferError::exit_code`]. The first failure
//! inside a directory aborts that directory and every enclosing one; the
//! only best-effort skip is a push of an entry that is neither a regular file
//! nor a directory.

pub mod channel;
mod context;
mod error;
mod exit_code;
pub mod fs;
pub mod progress;
pub mod pull;
pub mod push;
mod request;
pub mod resolve;
mod summary;
#[cfg(test)]
mod test_utils;

pub use channel::{TransferChannel, Transport};
pub use context::{MAX_DIRECTORY_DEPTH, TransferContext};
pub use error::TransferError;
pub use exit_code::ExitCode;
pub use progress::{NoProgress, ProgressReporter};
pub use request::TransferRequest;
pub use summary::TransferSummary;

/// Chunk size used when streaming file bodies.
pub const TRANSFER_BUFFER_SIZE: usize = 16 * 1024;

/// Direction of a request opened through a [`Transport`].
pub use scp_io::ScpMode as RequestMode;
