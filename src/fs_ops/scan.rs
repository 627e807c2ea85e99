//! Discovery of collection directories and their children.
//!
//! Both listings are one level deep, keep only directories (or symlinks to
//! directories), and are sorted by name so dry-run and real-run output match
//! line for line.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::ReorgError;

/// A directory directly under the source whose name ends with the marker suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDirectory {
    path: PathBuf,
    name: OsString,
}

impl CollectionDirectory {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &OsStr {
        &self.name
    }
}

/// Exact, case-sensitive suffix match on the raw name.
pub fn is_collection_name(name: &OsStr, suffix: &str) -> bool {
    name.as_encoded_bytes().ends_with(suffix.as_bytes())
}

/// Directory, or a symlink that resolves to one.
fn is_dir_like(entry: &fs::DirEntry) -> bool {
    match entry.file_type() {
        Ok(ft) if ft.is_dir() => true,
        Ok(ft) if ft.is_symlink() => fs::metadata(entry.path()).map(|m| m.is_dir()).unwrap_or(false),
        _ => false,
    }
}

/// Sorted `(name, path)` pairs of directory-like children of `dir`.
pub(crate) fn list_subdirectories(dir: &Path) -> io::Result<Vec<(OsString, PathBuf)>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if is_dir_like(&entry) {
            out.push((entry.file_name(), entry.path()));
        }
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}

/// List collection directories directly under `source`, sorted by name.
/// An unreadable source is a structural failure; no matches is an empty list.
pub fn scan_collections(source: &Path, suffix: &str) -> Result<Vec<CollectionDirectory>, ReorgError> {
    let children = list_subdirectories(source).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ReorgError::PathNotFound {
            role: "source",
            path: source.to_path_buf(),
        },
        _ => ReorgError::PermissionDenied {
            path: source.to_path_buf(),
            context: format!("cannot list source directory: {e}"),
        },
    })?;

    let found: Vec<CollectionDirectory> = children
        .into_iter()
        .filter(|(name, _)| is_collection_name(name, suffix))
        .map(|(name, path)| CollectionDirectory { path, name })
        .collect();

    debug!(source = %source.display(), suffix, count = found.len(), "Scanned for collections");
    Ok(found)
}
