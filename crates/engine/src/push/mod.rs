//! Push engine: announces a local file or tree to the peer.
//!
//! Child paths are built by joining onto their parent; the working directory
//! of the process is never changed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::context::log_totals;
use crate::fs::{FileType, file_size, file_type, is_dot_entry, list_children, permissions};
use crate::resolve::strip_trailing_separator;
use crate::{
    ProgressReporter, RequestMode, TransferChannel, TransferContext, TransferError,
    TransferSummary, Transport,
};

/// Copies the local `source` to `destination` on the peer.
///
/// A directory requires `recursive`; a regular file silently disables it.
/// Sources that are missing or are neither files nor directories fail
/// before any request is opened.
pub fn copy_to_remote<T>(
    transport: &mut T,
    source: &str,
    destination: &str,
    recursive: bool,
    progress: &mut dyn ProgressReporter,
) -> Result<TransferSummary, TransferError>
where
    T: Transport + ?Sized,
{
    let source_root = strip_trailing_separator(source);
    let source_path = Path::new(source_root);

    let recursive = match file_type(source_path) {
        FileType::Directory if !recursive => {
            return Err(TransferError::RecursionPolicy {
                path: source_path.to_path_buf(),
            });
        }
        FileType::Directory => true,
        FileType::Regular => false,
        FileType::Missing | FileType::Unreadable => {
            let error = fs::metadata(source_path)
                .err()
                .unwrap_or_else(|| io::Error::from(io::ErrorKind::NotFound));
            return Err(TransferError::io("stat", source_path, error));
        }
        FileType::Other => {
            return Err(TransferError::io(
                "copy",
                source_path,
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "not a regular file or directory",
                ),
            ));
        }
    };

    let mut channel = transport.open_request(RequestMode::Write, recursive, destination)?;
    tracing::debug!(
        target: "scp::connect",
        source = source_root,
        destination,
        recursive,
        "push request opened"
    );

    let result = send(&mut channel, source_root, recursive, progress);
    let closed = channel.close();
    let summary = result?;
    closed?;
    Ok(summary)
}

fn send<C: TransferChannel>(
    channel: &mut C,
    source_root: &str,
    recursive: bool,
    progress: &mut dyn ProgressReporter,
) -> Result<TransferSummary, TransferError> {
    channel.init()?;
    let mut ctx = TransferContext::new(channel, source_root, recursive, progress);
    let root = PathBuf::from(source_root);

    if recursive {
        push_directory(&mut ctx, &root)?;
    } else {
        push_file(&mut ctx, &root)?;
    }
    Ok(log_totals(&ctx))
}

/// Announces the regular file at `path` and sends its content as one
/// payload.
pub fn push_file<C: TransferChannel + ?Sized>(
    ctx: &mut TransferContext<'_, C>,
    path: &Path,
) -> Result<(), TransferError> {
    let size = file_size(path)?;
    let mode = permissions(path)?;
    let name = entry_name(path)?;

    let contents = fs::read(path).map_err(|error| TransferError::io("read", path, error))?;
    if contents.len() as u64 != size {
        return Err(TransferError::io(
            "read",
            path,
            io::Error::new(
                io::ErrorKind::InvalidData,
                "file changed size while being read",
            ),
        ));
    }

    tracing::debug!(target: "scp::send", path = %path.display(), size, "file");
    ctx.channel().push_file(&name, size, mode)?;
    if size > 0 {
        let written = ctx.channel().write(&contents)?;
        if written != contents.len() {
            return Err(TransferError::protocol(format!(
                "peer accepted {written} of {size} bytes for '{}'",
                path.display()
            )));
        }
    }

    ctx.report_progress(size, size, &path.display().to_string());
    ctx.summary_mut().record_file(size);
    Ok(())
}

/// Announces the directory at `path`, then every regular file and directory
/// below it in name order.
///
/// Entries that are neither are skipped with a warning.
pub fn push_directory<C: TransferChannel + ?Sized>(
    ctx: &mut TransferContext<'_, C>,
    path: &Path,
) -> Result<(), TransferError> {
    ctx.enter_directory(path)?;
    let mode = permissions(path)?;
    let name = entry_name(path)?;

    tracing::debug!(
        target: "scp::send",
        path = %path.display(),
        depth = ctx.depth(),
        "directory"
    );
    ctx.channel().push_directory(&name, mode)?;
    ctx.summary_mut().record_directory();

    let listing = list_children(path)?;
    for child in listing.iter().filter(|name| !is_dot_entry(name)) {
        let child_path = path.join(child);
        match file_type(&child_path) {
            FileType::Regular => push_file(ctx, &child_path)?,
            FileType::Directory => push_directory(ctx, &child_path)?,
            _ => {
                tracing::warn!(
                    target: "scp::nonreg",
                    "skipping non-regular file \"{}\"",
                    child_path.display()
                );
                ctx.summary_mut().record_skipped();
            }
        }
    }

    ctx.channel().leave_directory()?;
    ctx.leave_directory();
    Ok(())
}

fn entry_name(path: &Path) -> Result<String, TransferError> {
    if let Some(name) = path.file_name() {
        return Ok(name.to_string_lossy().into_owned());
    }

    let canonical =
        fs::canonicalize(path).map_err(|error| TransferError::io("resolve", path, error))?;
    canonical
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| TransferError::Resolution {
            path: path.to_path_buf(),
            reason: "path has no final component to announce".to_owned(),
        })
}
