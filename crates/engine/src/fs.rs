//! Local filesystem collaborator used by both engines.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

use crate::TransferError;

/// Mode given to directories created while pulling, before the announced
/// bits are applied.
pub const DEFAULT_DIRECTORY_MODE: u32 = 0o755;

const PERMISSION_MASK: u32 = 0o7777;

/// Classification of a local path. Symbolic links are followed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileType {
    /// A regular file.
    Regular,
    /// A directory.
    Directory,
    /// Nothing exists at the path.
    Missing,
    /// The path exists but could not be inspected.
    Unreadable,
    /// A device, socket, FIFO, or dangling link.
    Other,
}

/// Classifies `path`.
#[must_use]
pub fn file_type(path: &Path) -> FileType {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => FileType::Regular,
        Ok(metadata) if metadata.is_dir() => FileType::Directory,
        Ok(_) => FileType::Other,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            if fs::symlink_metadata(path).is_ok() {
                FileType::Other
            } else {
                FileType::Missing
            }
        }
        Err(_) => FileType::Unreadable,
    }
}

/// Returns the permission bits of `path`.
pub fn permissions(path: &Path) -> Result<u32, TransferError> {
    let metadata = fs::metadata(path).map_err(|error| TransferError::io("stat", path, error))?;
    Ok(mode_of(&metadata))
}

#[cfg(unix)]
fn mode_of(metadata: &fs::Metadata) -> u32 {
    metadata.permissions().mode() & PERMISSION_MASK
}

#[cfg(not(unix))]
fn mode_of(metadata: &fs::Metadata) -> u32 {
    match (metadata.is_dir(), metadata.permissions().readonly()) {
        (true, _) => 0o755,
        (false, true) => 0o444,
        (false, false) => 0o644,
    }
}

/// Returns the size of `path` in bytes.
pub fn file_size(path: &Path) -> Result<u64, TransferError> {
    fs::metadata(path)
        .map(|metadata| metadata.len())
        .map_err(|error| TransferError::io("stat", path, error))
}

/// Creates `path` and any missing parents with [`DEFAULT_DIRECTORY_MODE`].
/// An existing directory is left untouched.
pub fn mkdir_if_needed(path: &Path) -> Result<(), TransferError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DEFAULT_DIRECTORY_MODE);
    builder
        .create(path)
        .map_err(|error| TransferError::io("create directory", path, error))
}

/// Applies the permission bits in `mode` to `path`.
#[cfg(unix)]
pub fn set_permissions(path: &Path, mode: u32) -> Result<(), TransferError> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode & PERMISSION_MASK))
        .map_err(|error| TransferError::io("set permissions on", path, error))
}

/// Applies the permission bits in `mode` to `path`.
///
/// Only the owner write bit has a counterpart here; it toggles the
/// read-only attribute.
#[cfg(not(unix))]
pub fn set_permissions(path: &Path, mode: u32) -> Result<(), TransferError> {
    let metadata = fs::metadata(path).map_err(|error| TransferError::io("stat", path, error))?;
    let mut permissions = metadata.permissions();
    permissions.set_readonly(mode & 0o200 == 0);
    fs::set_permissions(path, permissions)
        .map_err(|error| TransferError::io("set permissions on", path, error))
}

/// Reports whether `name` is `.` or `..`.
#[must_use]
pub fn is_dot_entry(name: &OsStr) -> bool {
    name == "." || name == ".."
}

/// Child names of a directory.
///
/// The listing always starts with `.` and `..`, followed by the remaining
/// names in byte order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DirectoryListing {
    names: Vec<OsString>,
}

impl DirectoryListing {
    fn from_children(mut children: Vec<OsString>) -> Self {
        children.sort();
        let mut names = Vec::with_capacity(children.len() + 2);
        names.push(OsString::from("."));
        names.push(OsString::from(".."));
        names.extend(children);
        Self { names }
    }

    /// Iterates over every name, `.` and `..` included.
    pub fn iter(&self) -> impl Iterator<Item = &OsStr> {
        self.names.iter().map(OsString::as_os_str)
    }

    /// Number of names, `.` and `..` included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always `false`: `.` and `..` are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Lists the children of `path`.
pub fn list_children(path: &Path) -> Result<DirectoryListing, TransferError> {
    let entries = fs::read_dir(path).map_err(|error| TransferError::io("read directory", path, error))?;
    let mut children = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|error| TransferError::io("read directory", path, error))?;
        children.push(entry.file_name());
    }
    Ok(DirectoryListing::from_children(children))
}
