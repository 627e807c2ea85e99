//! Moving one directory to its destination.
//!
//! Phase 0: rename without replacing (same filesystem).
//! Phase 1: when the rename is refused, copy the tree into a destination that
//!          is created exclusively; on any failure the partial copy is removed
//!          and the source is untouched.
//! Phase 2: delete the source. A failure here is degraded-but-safe: the data
//!          exists at the destination, so the move still counts, with a warning.
//!
//! Symlinks move as links with their stored target text unchanged, on both
//! paths. A relative link target is resolved from the link's new parent, so
//! `../x` points somewhere else once the link has moved up a level.

use anyhow::{anyhow, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::FORCE_COPY_ENV;
use crate::errors::ReorgError;
use crate::platform::{is_cross_device, rename_noreplace};
use crate::shutdown;

use super::helpers::{build_message, io_error_with_help};
use super::metadata::{preserve_metadata, preserve_xattrs};

/// How a directory reached its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMethod {
    /// Dry-run: nothing touched.
    Simulated,
    Rename,
    CopyDelete,
}

/// Successful transfer; `source_retained` carries the reason the source could not be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transferred {
    pub method: TransferMethod,
    pub source_retained: Option<String>,
}

#[derive(Debug)]
pub enum TransferFailure {
    /// Something appeared at the destination between the check and the act.
    DestinationTaken,
    /// Rename and copy both failed; the source is intact and no partial copy remains.
    Failed(anyhow::Error),
}

fn force_copy() -> bool {
    std::env::var_os(FORCE_COPY_ENV).is_some_and(|v| v == "1")
}

/// Move directory `src` to `dest`, never replacing an existing `dest`.
pub fn move_directory(src: &Path, dest: &Path) -> Result<Transferred, TransferFailure> {
    if shutdown::is_requested() {
        return Err(TransferFailure::Failed(ReorgError::Interrupted.into()));
    }

    if force_copy() {
        debug!(src = %src.display(), "{FORCE_COPY_ENV} set; skipping rename");
    } else {
        match rename_noreplace(src, dest) {
            Ok(()) => {
                info!(src = %src.display(), dest = %dest.display(), "Renamed directory atomically");
                return Ok(Transferred {
                    method: TransferMethod::Rename,
                    source_retained: None,
                });
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(TransferFailure::DestinationTaken);
            }
            Err(e) if is_cross_device(&e) => {
                info!(src = %src.display(), dest = %dest.display(), "Different filesystems; copying instead of renaming");
            }
            Err(e) => {
                warn!(error = %build_message("rename", src, &e), "Rename refused, falling back to copy+delete");
            }
        }
    }

    match copy_tree(src, dest) {
        Ok(files) => {
            info!(src = %src.display(), dest = %dest.display(), files, "Copied directory tree");
        }
        Err(CopyError::DestinationTaken) => return Err(TransferFailure::DestinationTaken),
        Err(CopyError::Failed(e)) => {
            return Err(TransferFailure::Failed(discard_partial(dest, e)));
        }
    }

    Ok(Transferred {
        method: TransferMethod::CopyDelete,
        source_retained: remove_source(src),
    })
}

/// Remove a partial destination after a failed copy, folding cleanup trouble into the error.
fn discard_partial(dest: &Path, cause: anyhow::Error) -> anyhow::Error {
    match fs::remove_dir_all(dest) {
        Ok(()) => {
            debug!(dest = %dest.display(), "Removed partial copy");
            cause
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => cause,
        Err(e) => {
            error!(dest = %dest.display(), error = %e, "Partial copy could not be removed");
            cause.context(format!("partial copy left at '{}': {e}", dest.display()))
        }
    }
}

/// Phase 2. Returns the reason when the source (or part of it) remains.
fn remove_source(src: &Path) -> Option<String> {
    let is_link = fs::symlink_metadata(src)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);
    let res = if is_link {
        fs::remove_file(src)
    } else {
        fs::remove_dir_all(src)
    };
    match res {
        Ok(()) => None,
        Err(e) => {
            let msg = build_message("remove source", src, &e);
            warn!(src = %src.display(), error = %msg, "Copied, but the source could not be removed; data is now duplicated");
            Some(msg)
        }
    }
}

enum CopyError {
    DestinationTaken,
    Failed(anyhow::Error),
}

impl From<anyhow::Error> for CopyError {
    fn from(e: anyhow::Error) -> Self {
        CopyError::Failed(e)
    }
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> io::Result<()> {
    let target = fs::read_link(src)?;
    std::os::unix::fs::symlink(target, dest)
}

#[cfg(windows)]
fn copy_symlink(src: &Path, dest: &Path) -> io::Result<()> {
    let target = fs::read_link(src)?;
    if fs::metadata(src).map(|m| m.is_dir()).unwrap_or(false) {
        std::os::windows::fs::symlink_dir(target, dest)
    } else {
        std::os::windows::fs::symlink_file(target, dest)
    }
}

/// Phase 1. Returns the number of regular files copied.
fn copy_tree(src: &Path, dest: &Path) -> Result<u64, CopyError> {
    let root_meta = fs::symlink_metadata(src).map_err(io_error_with_help("stat source", src))?;

    // A child that is itself a symlink moves as a link.
    if root_meta.file_type().is_symlink() {
        return match copy_symlink(src, dest) {
            Ok(()) => {
                preserve_metadata(dest, &root_meta);
                Ok(0)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(CopyError::DestinationTaken),
            Err(e) => Err(io_error_with_help("recreate symlink", dest)(e).into()),
        };
    }

    // Exclusive create: the existence check and the claim are one step.
    match fs::create_dir(dest) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Err(CopyError::DestinationTaken),
        Err(e) => return Err(io_error_with_help("create destination", dest)(e).into()),
    }

    // Directory attributes are applied after their contents (read-only dirs would block writes).
    let mut dirs: Vec<(PathBuf, fs::Metadata)> = vec![(dest.to_path_buf(), root_meta)];
    let mut files: u64 = 0;

    for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
        if shutdown::is_requested() {
            return Err(anyhow::Error::from(ReorgError::Interrupted).into());
        }
        let entry = entry.map_err(|e| {
            let at = e.path().map(Path::to_path_buf).unwrap_or_else(|| src.to_path_buf());
            anyhow!("walk '{}': {}", at.display(), e)
        })?;
        let rel = entry.path().strip_prefix(src).map_err(anyhow::Error::from)?;
        let out = dest.join(rel);
        let meta = entry.metadata().map_err(|e| anyhow!("stat '{}': {}", entry.path().display(), e))?;
        let ft = meta.file_type();

        if ft.is_dir() {
            fs::create_dir(&out).map_err(io_error_with_help("create directory", &out))?;
            dirs.push((out, meta));
        } else if ft.is_file() {
            fs::copy(entry.path(), &out).map_err(io_error_with_help("copy file", &out))?;
            preserve_metadata(&out, &meta);
            preserve_xattrs(entry.path(), &out);
            files += 1;
        } else if ft.is_symlink() {
            copy_symlink(entry.path(), &out).map_err(io_error_with_help("recreate symlink", &out))?;
            preserve_metadata(&out, &meta);
        } else {
            // Sockets, FIFOs and device nodes cannot be copied faithfully; deleting the
            // source afterwards would lose them.
            return Err(anyhow!("unsupported file type at '{}'", entry.path().display()).into());
        }
    }

    for (dir, meta) in dirs.iter().rev() {
        preserve_metadata(dir, meta);
    }
    preserve_xattrs(src, dest);

    Ok(files)
}
