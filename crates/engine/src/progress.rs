//! Progress reporting hook.

/// Receives byte counts while a file body moves.
///
/// `label` names the file being transferred: the destination path when
/// pulling, the source path when pushing.
pub trait ProgressReporter {
    /// Reports that `bytes_so_far` of `total` bytes have moved.
    fn report(&mut self, bytes_so_far: u64, total: u64, label: &str);
}

impl<F> ProgressReporter for F
where
    F: FnMut(u64, u64, &str),
{
    fn report(&mut self, bytes_so_far: u64, total: u64, label: &str) {
        self(bytes_so_far, total, label);
    }
}

/// Reporter that discards every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&mut self, _bytes_so_far: u64, _total: u64, _label: &str) {}
}
