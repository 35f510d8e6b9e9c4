//! crates/logging/src/config.rs
//! Verbosity configuration derived from the `-v` count.

use super::levels::{LogFlag, LogLevels};

/// Per-category levels plus the quiet switch.
///
/// Tracing levels map onto category levels as `ERROR`/`WARN`/`INFO` → 1,
/// `DEBUG` → 2 and `TRACE` → 3, so a category set to 2 shows debug events
/// but not trace events.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct VerbosityConfig {
    /// Category levels.
    pub levels: LogLevels,
    /// Suppresses informational output; warnings and errors still print.
    pub quiet: bool,
}

impl VerbosityConfig {
    /// Builds the configuration for `level` repetitions of `-v`.
    ///
    /// | `-v` | adds |
    /// |------|------|
    /// | 0 | nonreg warnings |
    /// | 1 | names, stats |
    /// | 2 | connection setup, ssh command line, pushed entries |
    /// | 3+ | received requests and wire records |
    #[must_use]
    pub fn from_verbose_level(level: u8) -> Self {
        let mut levels = LogLevels::default();
        levels.raise(LogFlag::Nonreg, 1);

        if level >= 1 {
            levels.raise(LogFlag::Name, 2);
            levels.raise(LogFlag::Stats, 1);
        }
        if level >= 2 {
            levels.raise(LogFlag::Connect, 2);
            levels.raise(LogFlag::Cmd, 2);
            levels.raise(LogFlag::Send, 2);
        }
        if level >= 3 {
            levels.raise(LogFlag::Recv, 3);
            levels.raise(LogFlag::Proto, 3);
        }

        Self {
            levels,
            quiet: false,
        }
    }

    /// Returns a copy with the quiet switch set.
    #[must_use]
    pub const fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Returns `true` when an event of `level` in `flag` passes the
    /// category table. The quiet switch is applied by the layer, which knows
    /// the event's severity.
    #[must_use]
    pub const fn enabled(&self, flag: LogFlag, level: u8) -> bool {
        self.levels.enabled(flag, level)
    }
}
