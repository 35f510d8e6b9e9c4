#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `scp_io` owns everything that touches the wire for `oc-scp`: spawning the
//! remote shell that carries the transfer, parsing `[user@]host:path`
//! operands, and speaking the classic scp control protocol over the pipes of
//! that remote shell.
//!
//! # Design
//!
//! - [`ssh::SshCommand`] assembles an `ssh` invocation and spawns it as a
//!   subprocess. The resulting [`ssh::SshConnection`] implements
//!   [`std::io::Read`] and [`std::io::Write`] and can be split into
//!   independent halves.
//! - [`protocol`] encodes and decodes the control records (`C`, `D`, `E`,
//!   `T`) and the single-byte responses that frame every scp exchange.
//! - [`session::ScpSession`] layers the request state machine on top of any
//!   reader/writer pair. A session is created in either read (sink) or write
//!   (source) mode and only permits the operations that make sense for that
//!   mode and its current state.
//!
//! # Invariants
//!
//! - File payload is never read before the announcing request was accepted.
//! - A session never writes more payload bytes than it announced.
//! - Names in control records never contain a path separator and are never
//!   `.` or `..`.
//!
//! # Errors
//!
//! Every fallible operation returns [`ScpError`], which distinguishes local
//! I/O failures, messages reported by the peer, malformed protocol traffic,
//! and calls made in the wrong session state.

mod error;
pub mod protocol;
pub mod session;
pub mod ssh;

pub use error::ScpError;
pub use session::{PullEvent, ScpMode, ScpRequest, ScpSession};
