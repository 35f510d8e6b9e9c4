use std::path::Path;

use crate::{ProgressReporter, TransferChannel, TransferError, TransferSummary};

/// Deepest directory nesting either engine follows.
pub const MAX_DIRECTORY_DEPTH: usize = 256;

/// State threaded through one top-level pull or push.
///
/// The context borrows the channel and the progress reporter; both outlive
/// the transfer. It is created by [`copy_from_remote`](crate::pull::copy_from_remote)
/// or [`copy_to_remote`](crate::push::copy_to_remote) and passed by `&mut`
/// into every recursive call.
pub struct TransferContext<'a, C: ?Sized> {
    channel: &'a mut C,
    source_root: String,
    recursive: bool,
    progress: &'a mut dyn ProgressReporter,
    summary: TransferSummary,
    depth: usize,
}

impl<'a, C: TransferChannel + ?Sized> TransferContext<'a, C> {
    /// Creates a context for a transfer rooted at `source_root`.
    pub fn new(
        channel: &'a mut C,
        source_root: impl Into<String>,
        recursive: bool,
        progress: &'a mut dyn ProgressReporter,
    ) -> Self {
        Self {
            channel,
            source_root: source_root.into(),
            recursive,
            progress,
            summary: TransferSummary::default(),
            depth: 0,
        }
    }

    /// Channel carrying the transfer.
    pub fn channel(&mut self) -> &mut C {
        self.channel
    }

    /// Source operand the transfer started from.
    #[must_use]
    pub fn source_root(&self) -> &str {
        &self.source_root
    }

    /// Whether directories may be transferred.
    #[must_use]
    pub const fn recursive(&self) -> bool {
        self.recursive
    }

    pub(crate) const fn set_recursive(&mut self, recursive: bool) {
        self.recursive = recursive;
    }

    /// Counts accumulated so far.
    #[must_use]
    pub const fn summary(&self) -> TransferSummary {
        self.summary
    }

    pub(crate) const fn summary_mut(&mut self) -> &mut TransferSummary {
        &mut self.summary
    }

    /// Current directory nesting.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn report_progress(&mut self, bytes_so_far: u64, total: u64, label: &str) {
        self.progress.report(bytes_so_far, total, label);
    }

    /// Records entry into `path`, failing once the nesting limit is reached.
    pub(crate) fn enter_directory(&mut self, path: &Path) -> Result<(), TransferError> {
        if self.depth >= MAX_DIRECTORY_DEPTH {
            return Err(TransferError::DepthExceeded {
                path: path.to_path_buf(),
                limit: MAX_DIRECTORY_DEPTH,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) const fn leave_directory(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

/// Logs the final counts of a transfer and returns them.
pub(crate) fn log_totals<C: TransferChannel + ?Sized>(
    ctx: &TransferContext<'_, C>,
) -> TransferSummary {
    let summary = ctx.summary();
    tracing::info!(
        target: "scp::stats",
        source = ctx.source_root(),
        files = summary.files(),
        directories = summary.directories(),
        bytes = summary.bytes(),
        skipped = summary.skipped(),
        "transfer totals"
    );
    summary
}
