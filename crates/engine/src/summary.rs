/// Counts accumulated by one top-level transfer.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TransferSummary {
    files: u64,
    directories: u64,
    bytes: u64,
    skipped: u64,
}

impl TransferSummary {
    /// Number of regular files transferred.
    #[must_use]
    pub const fn files(&self) -> u64 {
        self.files
    }

    /// Number of directories transferred.
    #[must_use]
    pub const fn directories(&self) -> u64 {
        self.directories
    }

    /// Payload bytes transferred.
    #[must_use]
    pub const fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Entries skipped because they were neither regular files nor directories.
    #[must_use]
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }

    pub(crate) const fn record_file(&mut self, bytes: u64) {
        self.files += 1;
        self.bytes += bytes;
    }

    pub(crate) const fn record_directory(&mut self) {
        self.directories += 1;
    }

    pub(crate) const fn record_skipped(&mut self) {
        self.skipped += 1;
    }
}
