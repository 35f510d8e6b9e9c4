//! Diagnostics written by the front-end.

use std::fmt::Display;
use std::io::{self, Write};

use engine::TransferSummary;
use logging::DIAGNOSTIC_PREFIX;

/// Usage line printed after operand errors.
pub const USAGE: &str = "Usage: oc-scp [OPTIONS] FROM TO";

/// Writes `oc-scp: error: <message>`.
pub fn write_error<W: Write + ?Sized>(writer: &mut W, message: impl Display) -> io::Result<()> {
    writeln!(writer, "{DIAGNOSTIC_PREFIX}: error: {message}")
}

/// Writes the line printed after a successful transfer at `-v`.
pub fn write_summary<W: Write + ?Sized>(
    writer: &mut W,
    summary: &TransferSummary,
) -> io::Result<()> {
    write!(
        writer,
        "{DIAGNOSTIC_PREFIX}: transfer complete: {} {}, {} {}, {} {}",
        summary.files(),
        plural(summary.files(), "file", "files"),
        summary.directories(),
        plural(summary.directories(), "directory", "directories"),
        summary.bytes(),
        plural(summary.bytes(), "byte", "bytes"),
    )?;
    if summary.skipped() > 0 {
        write!(writer, ", {} skipped", summary.skipped())?;
    }
    writeln!(writer)
}

const fn plural(count: u64, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}
