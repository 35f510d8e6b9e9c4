//! Collaborator traits between the engines and the wire.

mod scp;

use crate::{RequestMode, TransferError, TransferRequest};

/// One open transfer request, seen from the engine.
///
/// A read-mode channel supports [`pull_request`](Self::pull_request),
/// [`accept_request`](Self::accept_request) and [`read`](Self::read); a
/// write-mode channel supports the `push_*`, [`write`](Self::write) and
/// [`leave_directory`](Self::leave_directory) operations.
pub trait TransferChannel {
    /// Performs the opening handshake.
    fn init(&mut self) -> Result<(), TransferError>;

    /// Returns the next event. Channel failures surface as
    /// [`TransferRequest::ProtocolError`].
    fn pull_request(&mut self) -> TransferRequest;

    /// Takes the error behind the last [`TransferRequest::ProtocolError`]
    /// when the channel kept it, so the engine can report the original
    /// failure instead of the peer message.
    fn take_failure(&mut self) -> Option<TransferError> {
        None
    }

    /// Accepts the pending `NewFile` or `NewDirectory` request.
    fn accept_request(&mut self) -> Result<(), TransferError>;

    /// Reads payload of the accepted file. Returns `Ok(0)` once the file is
    /// complete.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransferError>;

    /// Announces a regular file of `size` bytes.
    fn push_file(&mut self, name: &str, size: u64, mode: u32) -> Result<(), TransferError>;

    /// Writes payload of the announced file.
    fn write(&mut self, data: &[u8]) -> Result<usize, TransferError>;

    /// Announces a directory; subsequent entries belong to it.
    fn push_directory(&mut self, name: &str, mode: u32) -> Result<(), TransferError>;

    /// Closes the innermost announced directory.
    fn leave_directory(&mut self) -> Result<(), TransferError>;

    /// Ends the request.
    fn close(&mut self) -> Result<(), TransferError>;
}

/// Opens transfer requests against a peer.
pub trait Transport {
    /// Channel type produced by [`open_request`](Self::open_request).
    type Channel: TransferChannel;

    /// Opens a request for `path` on the peer.
    fn open_request(
        &mut self,
        mode: RequestMode,
        recursive: bool,
        path: &str,
    ) -> Result<Self::Channel, TransferError>;
}
