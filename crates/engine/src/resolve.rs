//! Destination path resolution.

use std::path::{Path, PathBuf, is_separator};

use crate::TransferError;
use crate::fs::{FileType, file_type};

/// Removes one trailing separator. The root `/` is returned unchanged.
#[must_use]
pub fn strip_trailing_separator(path: &str) -> &str {
    match path.char_indices().next_back() {
        Some((index, ch)) if index > 0 && is_separator(ch) => &path[..index],
        _ => path,
    }
}

/// Removes every trailing separator. A path made only of separators keeps
/// its first one.
#[must_use]
pub fn trim_trailing_separators(path: &str) -> &str {
    let trimmed = path.trim_end_matches(is_separator);
    if trimmed.is_empty() && !path.is_empty() {
        &path[..1]
    } else {
        trimmed
    }
}

/// Final component of `name`, ignoring trailing separators.
#[must_use]
pub fn final_component(name: &str) -> &str {
    let trimmed = name.trim_end_matches(is_separator);
    trimmed
        .rsplit(is_separator)
        .next()
        .unwrap_or(trimmed)
}

/// Computes where an item named `item_name` lands under `destination_root`.
///
/// - an existing directory receives the item inside it;
/// - an existing regular file, or nothing at all, is the target itself,
///   unless the root ends with a separator and so must be a directory;
/// - anything else cannot be a destination.
///
/// Resolution has no side effects: calling it again on an unchanged
/// filesystem yields the same path.
pub fn resolve_destination(
    item_name: &str,
    destination_root: &Path,
) -> Result<PathBuf, TransferError> {
    let names_directory = destination_root
        .as_os_str()
        .as_encoded_bytes()
        .last()
        .is_some_and(|&byte| is_separator(char::from(byte)));
    let root = match destination_root.to_str() {
        Some(text) => PathBuf::from(trim_trailing_separators(text)),
        None => destination_root.to_path_buf(),
    };

    match file_type(&root) {
        FileType::Directory => {
            let name = final_component(item_name);
            if name.is_empty() || name == "." || name == ".." {
                return Err(TransferError::Resolution {
                    path: root,
                    reason: format!("item name '{item_name}' has no usable final component"),
                });
            }
            Ok(root.join(name))
        }
        FileType::Missing if names_directory => Err(TransferError::Resolution {
            path: destination_root.to_path_buf(),
            reason: "directory does not exist".to_owned(),
        }),
        FileType::Regular if names_directory => Err(TransferError::Resolution {
            path: destination_root.to_path_buf(),
            reason: "not a directory".to_owned(),
        }),
        FileType::Regular | FileType::Missing => Ok(root),
        FileType::Unreadable => Err(TransferError::Resolution {
            path: root,
            reason: "destination cannot be inspected".to_owned(),
        }),
        FileType::Other => Err(TransferError::Resolution {
            path: root,
            reason: "destination is neither a regular file nor a directory".to_owned(),
        }),
    }
}
