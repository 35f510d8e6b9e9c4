#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` turns the `-v` count of `oc-scp` into per-category diagnostic
//! levels and renders the tracing events emitted by the other workspace
//! crates as `oc-scp: ...` lines on standard error.
//!
//! # Design
//!
//! Crates log with the plain `tracing` macros and a `scp::<category>` target
//! (`scp::connect`, `scp::cmd`, `scp::proto`, `scp::recv`, `scp::send`,
//! `scp::name`, `scp::nonreg`, `scp::stats`). [`LogFlag::from_target`] maps
//! the target to a category, [`VerbosityConfig`] holds the level enabled for
//! each category, and [`ScpLayer`] writes the events that pass.
//!
//! # Invariants
//!
//! - Events whose target maps to no category are written only at `WARN` or
//!   `ERROR`.
//! - Quiet mode never hides warnings or errors.
//!
//! # Examples
//!
//! ```
//! use logging::{LogFlag, VerbosityConfig};
//!
//! let config = VerbosityConfig::from_verbose_level(1);
//! assert!(config.enabled(LogFlag::Stats, 1));
//! assert!(!config.enabled(LogFlag::Proto, 3));
//! ```

mod config;
mod levels;
mod tracing_bridge;

pub use config::VerbosityConfig;
pub use levels::{LogFlag, LogLevels};
pub use tracing_bridge::{DIAGNOSTIC_PREFIX, LOG_ENV, ScpLayer, init_tracing};
