//! crates/logging/src/levels.rs
//! Diagnostic categories and the per-category level table.

/// Diagnostic categories selectable through `-v`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LogFlag {
    /// Request setup and connection establishment.
    Connect,
    /// Remote shell command lines.
    Cmd,
    /// Wire-level control records.
    Proto,
    /// Requests received while pulling.
    Recv,
    /// Entries announced while pushing.
    Send,
    /// Names of materialized files and directories.
    Name,
    /// Skipped non-regular entries.
    Nonreg,
    /// Transfer totals.
    Stats,
}

impl LogFlag {
    /// Every category, in display order.
    pub const ALL: [Self; 8] = [
        Self::Connect,
        Self::Cmd,
        Self::Proto,
        Self::Recv,
        Self::Send,
        Self::Name,
        Self::Nonreg,
        Self::Stats,
    ];

    /// Short lowercase name, which is also the last segment of the
    /// matching tracing target.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Cmd => "cmd",
            Self::Proto => "proto",
            Self::Recv => "recv",
            Self::Send => "send",
            Self::Name => "name",
            Self::Nonreg => "nonreg",
            Self::Stats => "stats",
        }
    }

    /// Maps a tracing target such as `scp::recv` to its category.
    ///
    /// Only the final `::` segment is compared, so `scp::recv` and a bare
    /// `recv` both resolve while `receiver_stats` does not.
    #[must_use]
    pub fn from_target(target: &str) -> Option<Self> {
        let segment = target.rsplit("::").next().unwrap_or(target);
        Self::ALL.into_iter().find(|flag| flag.name() == segment)
    }
}

/// Level enabled for each category; zero means silent.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct LogLevels {
    /// Level for [`LogFlag::Connect`].
    pub connect: u8,
    /// Level for [`LogFlag::Cmd`].
    pub cmd: u8,
    /// Level for [`LogFlag::Proto`].
    pub proto: u8,
    /// Level for [`LogFlag::Recv`].
    pub recv: u8,
    /// Level for [`LogFlag::Send`].
    pub send: u8,
    /// Level for [`LogFlag::Name`].
    pub name: u8,
    /// Level for [`LogFlag::Nonreg`].
    pub nonreg: u8,
    /// Level for [`LogFlag::Stats`].
    pub stats: u8,
}

impl LogLevels {
    /// Returns the level configured for `flag`.
    #[must_use]
    pub const fn get(&self, flag: LogFlag) -> u8 {
        match flag {
            LogFlag::Connect => self.connect,
            LogFlag::Cmd => self.cmd,
            LogFlag::Proto => self.proto,
            LogFlag::Recv => self.recv,
            LogFlag::Send => self.send,
            LogFlag::Name => self.name,
            LogFlag::Nonreg => self.nonreg,
            LogFlag::Stats => self.stats,
        }
    }

    /// Sets the level for `flag`.
    pub const fn set(&mut self, flag: LogFlag, level: u8) {
        match flag {
            LogFlag::Connect => self.connect = level,
            LogFlag::Cmd => self.cmd = level,
            LogFlag::Proto => self.proto = level,
            LogFlag::Recv => self.recv = level,
            LogFlag::Send => self.send = level,
            LogFlag::Name => self.name = level,
            LogFlag::Nonreg => self.nonreg = level,
            LogFlag::Stats => self.stats = level,
        }
    }

    /// Raises `flag` to at least `level`.
    pub fn raise(&mut self, flag: LogFlag, level: u8) {
        if self.get(flag) < level {
            self.set(flag, level);
        }
    }

    /// Returns `true` when events of `level` in `flag` are enabled.
    #[must_use]
    pub const fn enabled(&self, flag: LogFlag, level: u8) -> bool {
        level > 0 && self.get(flag) >= level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_resolve_by_last_segment() {
        assert_eq!(LogFlag::from_target("scp::recv"), Some(LogFlag::Recv));
        assert_eq!(LogFlag::from_target("scp::nonreg"), Some(LogFlag::Nonreg));
        assert_eq!(LogFlag::from_target("cmd"), Some(LogFlag::Cmd));
        assert_eq!(LogFlag::from_target("engine::pull"), None);
        assert_eq!(LogFlag::from_target("scp::receiver"), None);
    }

    #[test]
    fn every_flag_round_trips_through_its_name() {
        for flag in LogFlag::ALL {
            let target = format!("scp::{}", flag.name());
            assert_eq!(LogFlag::from_target(&target), Some(flag));
        }
    }

    #[test]
    fn set_and_get_address_the_same_slot() {
        let mut levels = LogLevels::default();
        for (index, flag) in LogFlag::ALL.into_iter().enumerate() {
            let level = u8::try_from(index + 1).expect("small index");
            levels.set(flag, level);
            assert_eq!(levels.get(flag), level);
        }
    }

    #[test]
    fn raise_never_lowers() {
        let mut levels = LogLevels::default();
        levels.set(LogFlag::Name, 2);
        levels.raise(LogFlag::Name, 1);
        assert_eq!(levels.name, 2);
        levels.raise(LogFlag::Name, 3);
        assert_eq!(levels.name, 3);
    }

    #[test]
    fn level_zero_is_never_enabled() {
        let levels = LogLevels::default();
        assert!(!levels.enabled(LogFlag::Stats, 0));
        assert!(!levels.enabled(LogFlag::Stats, 1));
    }
}
