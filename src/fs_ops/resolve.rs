//! Path resolution for the source and target roots.
//! - Follows symlinks through the filesystem (not just `..` folding); source
//!   trees are often symlinked mount points.
//! - Target defaults to the resolved source (flatten in place).
//! - Target write permission is probed without creating anything, so a
//!   dry-run leaves the tree untouched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{path_traverses_symlink, Config};
use crate::errors::ReorgError;
use crate::platform::check_writable;

/// Canonical absolute directory path, plus whether symlinks were crossed to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    path: PathBuf,
    via_symlink: bool,
}

impl ResolvedPath {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn via_symlink(&self) -> bool {
        self.via_symlink
    }
}

/// Source and target roots for one run.
#[derive(Debug, Clone)]
pub struct ResolvedRoots {
    pub source: ResolvedPath,
    pub target: ResolvedPath,
}

impl ResolvedRoots {
    pub fn in_place(&self) -> bool {
        self.source.path == self.target.path
    }
}

fn classify(role: &'static str, path: &Path, e: io::Error) -> ReorgError {
    match e.kind() {
        io::ErrorKind::PermissionDenied => ReorgError::PermissionDenied {
            path: path.to_path_buf(),
            context: format!("cannot access {role} directory"),
        },
        _ => ReorgError::PathNotFound {
            role,
            path: path.to_path_buf(),
        },
    }
}

/// Resolve `input` to a canonical directory, following symlinks.
pub fn resolve_dir(input: &Path, role: &'static str) -> Result<ResolvedPath, ReorgError> {
    // fs::metadata follows links: a dangling link surfaces as NotFound here.
    let meta = fs::metadata(input).map_err(|e| classify(role, input, e))?;
    if !meta.is_dir() {
        return Err(ReorgError::NotADirectory {
            role,
            path: input.to_path_buf(),
        });
    }

    let canonical = dunce::canonicalize(input).map_err(|e| classify(role, input, e))?;
    let absolute = std::path::absolute(input).unwrap_or_else(|_| input.to_path_buf());
    let via_symlink = path_traverses_symlink(&absolute).unwrap_or(false);

    if via_symlink {
        info!(role, input = %input.display(), resolved = %canonical.display(), "Resolved through symlink");
    } else {
        debug!(role, resolved = %canonical.display(), "Resolved directory");
    }

    Ok(ResolvedPath {
        path: canonical,
        via_symlink,
    })
}

/// Fail with PermissionDenied unless the directory accepts new entries.
pub fn ensure_writable(dir: &ResolvedPath) -> Result<(), ReorgError> {
    check_writable(dir.path()).map_err(|e| ReorgError::PermissionDenied {
        path: dir.path().to_path_buf(),
        context: format!("target is not writable: {e}"),
    })?;
    debug!(target = %dir.path().display(), "Target writable");
    Ok(())
}

/// Resolve both roots from the config and verify the target is writable.
pub fn resolve_roots(cfg: &Config) -> Result<ResolvedRoots, ReorgError> {
    let source = resolve_dir(&cfg.source, "source")?;
    let target = match cfg.target.as_deref() {
        Some(t) => resolve_dir(t, "target")?,
        None => source.clone(),
    };
    ensure_writable(&target)?;
    Ok(ResolvedRoots { source, target })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_source_is_path_error() {
        let td = tempdir().unwrap();
        let err = resolve_dir(&td.path().join("absent"), "source").unwrap_err();
        assert!(matches!(err, ReorgError::PathNotFound { role: "source", .. }));
    }

    #[test]
    fn regular_file_is_not_a_directory() {
        let td = tempdir().unwrap();
        let f = td.path().join("file.txt");
        fs::write(&f, b"x").unwrap();
        let err = resolve_dir(&f, "target").unwrap_err();
        assert!(matches!(err, ReorgError::NotADirectory { role: "target", .. }));
    }

    #[test]
    fn target_defaults_to_source() {
        let td = tempdir().unwrap();
        let cfg = Config::new(td.path());
        let roots = resolve_roots(&cfg).unwrap();
        assert!(roots.in_place());
        assert_eq!(roots.source.path(), dunce::canonicalize(td.path()).unwrap());
    }

    #[test]
    fn dot_segments_are_canonicalized() {
        let td = tempdir().unwrap();
        fs::create_dir(td.path().join("a")).unwrap();
        let messy = td.path().join("a").join("..").join("a");
        let r = resolve_dir(&messy, "source").unwrap();
        assert_eq!(r.path(), dunce::canonicalize(td.path().join("a")).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_source_resolves_to_real_target() {
        let td = tempdir().unwrap();
        let base = dunce::canonicalize(td.path()).unwrap();
        let real = base.join("mount");
        fs::create_dir(&real).unwrap();
        let link = base.join("media");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let r = resolve_dir(&link, "source").unwrap();
        assert_eq!(r.path(), real.as_path());
        assert!(r.via_symlink());

        let direct = resolve_dir(&real, "source").unwrap();
        assert!(!direct.via_symlink());
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_path_error() {
        let td = tempdir().unwrap();
        let link = td.path().join("dangling");
        std::os::unix::fs::symlink(td.path().join("nowhere"), &link).unwrap();
        assert!(matches!(
            resolve_dir(&link, "source").unwrap_err(),
            ReorgError::PathNotFound { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn unwritable_target_is_permission_error() {
        use std::os::unix::fs::PermissionsExt;
        if crate::platform::running_as_root() {
            eprintln!("skipping: running as root");
            return;
        }
        let td = tempdir().unwrap();
        let target = td.path().join("ro");
        fs::create_dir(&target).unwrap();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o555)).unwrap();

        let cfg = Config::new(td.path()).with_target(&target);
        let err = resolve_roots(&cfg).unwrap_err();
        assert!(matches!(err, ReorgError::PermissionDenied { .. }));

        fs::set_permissions(&target, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
