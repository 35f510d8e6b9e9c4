//! Pull engine: receives files and directories from the peer.
//!
//! ```text
//! INIT -> AWAITING_REQUEST -> { DIR_ACCEPTED | FILE_ACCEPTED } -> AWAITING_REQUEST -> END
//! ```
//!
//! Any error moves the transfer to a failed state; files written so far stay
//! on disk.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::context::log_totals;
use crate::fs::{FileType, file_type, mkdir_if_needed, set_permissions};
use crate::resolve::{resolve_destination, strip_trailing_separator};
use crate::{
    ProgressReporter, RequestMode, TRANSFER_BUFFER_SIZE, TransferChannel, TransferContext,
    TransferError, TransferRequest, TransferSummary, Transport,
};

/// Copies `source` on the peer to `destination` on the local filesystem.
///
/// The request is always opened recursion-capable. The first event decides
/// the shape of the transfer: a file forces non-recursive handling, after
/// which the peer must end the stream; a directory is accepted only when
/// `recursive` is set.
pub fn copy_from_remote<T>(
    transport: &mut T,
    source: &str,
    destination: &Path,
    recursive: bool,
    progress: &mut dyn ProgressReporter,
) -> Result<TransferSummary, TransferError>
where
    T: Transport + ?Sized,
{
    let mut channel = transport.open_request(RequestMode::Read, true, source)?;
    tracing::debug!(
        target: "scp::connect",
        source,
        destination = %destination.display(),
        "pull request opened"
    );

    let result = receive(&mut channel, source, destination, recursive, progress);
    let closed = channel.close();
    let summary = result?;
    closed?;
    Ok(summary)
}

fn receive<C: TransferChannel>(
    channel: &mut C,
    source: &str,
    destination: &Path,
    recursive: bool,
    progress: &mut dyn ProgressReporter,
) -> Result<TransferSummary, TransferError> {
    channel.init()?;
    let mut ctx = TransferContext::new(
        channel,
        strip_trailing_separator(source),
        recursive,
        progress,
    );

    let first = ctx.channel().pull_request();
    if matches!(first, TransferRequest::NewFile { .. }) {
        ctx.set_recursive(false);
        handle_request(&mut ctx, first, destination)?;
        expect_end_of_stream(&mut ctx)?;
    } else {
        handle_request(&mut ctx, first, destination)?;
        loop {
            match ctx.channel().pull_request() {
                TransferRequest::EndOfStream => break,
                request => handle_request(&mut ctx, request, destination)?,
            }
        }
    }

    Ok(log_totals(&ctx))
}

/// Dispatches one request received while a file or directory is expected.
pub fn handle_request<C: TransferChannel + ?Sized>(
    ctx: &mut TransferContext<'_, C>,
    request: TransferRequest,
    destination_root: &Path,
) -> Result<(), TransferError> {
    tracing::trace!(target: "scp::recv", %request, "request received");

    match request {
        TransferRequest::NewDirectory { name, mode } => {
            if !ctx.recursive() {
                return Err(TransferError::RecursionPolicy { path: name.into() });
            }
            ctx.channel().accept_request()?;

            let target = resolve_destination(&name, destination_root)?;
            match file_type(&target) {
                FileType::Directory | FileType::Missing => {}
                _ => {
                    return Err(TransferError::Resolution {
                        path: target,
                        reason: "exists and is not a directory".to_owned(),
                    });
                }
            }
            ctx.enter_directory(&target)?;
            mkdir_if_needed(&target)?;
            tracing::debug!(
                target: "scp::name",
                path = %target.display(),
                depth = ctx.depth(),
                "directory"
            );
            ctx.summary_mut().record_directory();

            copy_directory(ctx, &target)?;
            ctx.leave_directory();
            set_permissions(&target, mode)
        }
        TransferRequest::NewFile { name, size, mode } => {
            ctx.channel().accept_request()?;

            let target = resolve_destination(&name, destination_root)?;
            tracing::debug!(target: "scp::name", path = %target.display(), size, "file");
            copy_file_body(ctx, &target, size)?;
            set_permissions(&target, mode)?;
            ctx.summary_mut().record_file(size);
            Ok(())
        }
        TransferRequest::Warning { message } => {
            tracing::warn!(target: "scp::recv", "{message}");
            Err(TransferError::Remote { message })
        }
        TransferRequest::ProtocolError { message } => {
            tracing::error!(target: "scp::recv", "{message}");
            Err(channel_failure(ctx, message))
        }
        TransferRequest::EndOfDirectory | TransferRequest::EndOfStream => Err(
            TransferError::protocol(format!("unexpected {request} where an entry was expected")),
        ),
        TransferRequest::Unexpected { raw_code } => Err(TransferError::protocol(format!(
            "unexpected request code 0x{raw_code:02x}"
        ))),
    }
}

/// Receives the entries of an accepted directory until its end marker.
pub fn copy_directory<C: TransferChannel + ?Sized>(
    ctx: &mut TransferContext<'_, C>,
    destination_root: &Path,
) -> Result<(), TransferError> {
    loop {
        match ctx.channel().pull_request() {
            TransferRequest::EndOfDirectory => return Ok(()),
            request => handle_request(ctx, request, destination_root)?,
        }
    }
}

/// Streams the body of an accepted file into `target`.
///
/// The destination is created (or truncated) before any payload is read. A
/// zero-length file takes exactly one channel read.
pub fn copy_file_body<C: TransferChannel + ?Sized>(
    ctx: &mut TransferContext<'_, C>,
    target: &Path,
    size: u64,
) -> Result<(), TransferError> {
    let mut file = File::create(target).map_err(|error| TransferError::io("create", target, error))?;
    let label = target.display().to_string();
    let mut buffer = vec![0u8; TRANSFER_BUFFER_SIZE];

    if size == 0 {
        let read = ctx.channel().read(&mut buffer)?;
        if read != 0 {
            return Err(TransferError::protocol(format!(
                "peer sent {read} bytes for empty file '{label}'"
            )));
        }
        return Ok(());
    }

    let mut received = 0u64;
    while received < size {
        let want = usize::try_from(size - received).map_or(buffer.len(), |left| left.min(buffer.len()));
        let read = ctx.channel().read(&mut buffer[..want])?;
        if read == 0 {
            return Err(TransferError::protocol(format!(
                "premature end of '{label}' after {received} of {size} bytes"
            )));
        }

        file.write_all(&buffer[..read])
            .map_err(|error| TransferError::io("write", target, error))?;
        received += read as u64;
        ctx.report_progress(received, size, &label);
    }
    Ok(())
}

/// Requires the peer to end the stream.
pub fn expect_end_of_stream<C: TransferChannel + ?Sized>(
    ctx: &mut TransferContext<'_, C>,
) -> Result<(), TransferError> {
    match ctx.channel().pull_request() {
        TransferRequest::EndOfStream => Ok(()),
        TransferRequest::Warning { message } => Err(TransferError::Remote { message }),
        TransferRequest::ProtocolError { message } => Err(channel_failure(ctx, message)),
        other => Err(TransferError::protocol(format!(
            "expected end of stream after a single file, received {other}"
        ))),
    }
}

/// Prefers the failure the channel kept over the rendered `message`.
fn channel_failure<C: TransferChannel + ?Sized>(
    ctx: &mut TransferContext<'_, C>,
    message: String,
) -> TransferError {
    ctx.channel()
        .take_failure()
        .unwrap_or(TransferError::Remote { message })
}
