//! Filesystem operations backing the local endpoint.
//!
//! This module provides low-level operations for:
//! - Copying files with modification time preservation
//! - Copying and removing directory trees
//! - Creating parent directories on demand
//!
//! Errors are plain `io::Error`s; the local client attaches the document uri.

use std::fs;
use std::io;
use std::path::Path;

/// Copy a file from source to destination, preserving its modification time.
///
/// # Returns
/// Number of bytes copied
pub fn copy_file_with_metadata(src: &Path, dst: &Path) -> io::Result<u64> {
    ensure_parent_dir_exists(dst)?;

    let mut src_file = fs::File::open(src)?;
    let src_mtime = src_file.metadata()?.modified().ok();

    let mut dst_file = fs::File::create(dst)?;
    let bytes_copied = io::copy(&mut src_file, &mut dst_file)?;
    drop(dst_file);

    // Timestamps are best effort; the content is what matters.
    if let Some(mtime) = src_mtime {
        let _ = filetime::set_file_mtime(dst, filetime::FileTime::from_system_time(mtime));
    }

    Ok(bytes_copied)
}

/// Recursively copy the directory `src` to `dst`.
///
/// Stops at the first entry that fails to copy. Refuses, before creating
/// anything, to copy a directory into itself or one of its descendants.
///
/// # Returns
/// Total number of file bytes copied
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<u64> {
    if dst.starts_with(src) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Destination is inside the source directory",
        ));
    }
    copy_tree_unchecked(src, dst)
}

fn copy_tree_unchecked(src: &Path, dst: &Path) -> io::Result<u64> {
    fs::create_dir_all(dst)?;
    let mut total = 0;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            total += copy_tree_unchecked(&entry.path(), &target)?;
        } else {
            total += copy_file_with_metadata(&entry.path(), &target)?;
        }
    }

    Ok(total)
}

/// Remove a file, or a directory with everything below it.
pub fn remove_path(path: &Path) -> io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Ensure the parent directory of a path exists, creating it if necessary.
pub fn ensure_parent_dir_exists(path: &Path) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return Ok(()),
    };

    match fs::metadata(parent) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Parent path exists but is not a directory",
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => fs::create_dir_all(parent),
        Err(e) => Err(e),
    }
}
