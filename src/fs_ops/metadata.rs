//! Attribute preservation for the copy fallback.
//! - Timestamps (atime, mtime) via filetime; symlinks get their own times.
//! - Unix mode bits; the Windows READONLY attribute.
//! - Extended attributes when built with the `xattrs` feature.
//!
//! Everything here is best-effort: failures are logged and the copy stands.

use filetime::{set_file_times, set_symlink_file_times, FileTime};
use std::fs;
use std::path::Path;
use tracing::{trace, warn};

fn times_of(meta: &fs::Metadata) -> Option<(FileTime, FileTime)> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        let mt = FileTime::from_unix_time(meta.mtime(), meta.mtime_nsec() as u32);
        let at = FileTime::from_unix_time(meta.atime(), meta.atime_nsec() as u32);
        Some((at, mt))
    }
    #[cfg(not(unix))]
    {
        let at = meta.accessed().ok().map(FileTime::from_system_time)?;
        let mt = meta.modified().ok().map(FileTime::from_system_time)?;
        Some((at, mt))
    }
}

/// Copy timestamps and permissions from `src_meta` (an lstat result) onto `dest`.
pub fn preserve_metadata(dest: &Path, src_meta: &fs::Metadata) {
    let is_link = src_meta.file_type().is_symlink();

    if let Some((at, mt)) = times_of(src_meta) {
        let res = if is_link {
            set_symlink_file_times(dest, at, mt)
        } else {
            set_file_times(dest, at, mt)
        };
        match res {
            Ok(()) => trace!(path = %dest.display(), "set atime/mtime"),
            Err(e) => warn!(path = %dest.display(), error = %e, "failed to set atime/mtime on destination"),
        }
    }

    // Link permissions are not meaningful (and chmod would follow the link).
    if is_link {
        return;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = src_meta.permissions().mode() & 0o7777;
        if let Err(e) = fs::set_permissions(dest, fs::Permissions::from_mode(mode)) {
            warn!(path = %dest.display(), mode = format!("{:o}", mode), error = %e, "failed to set permissions on destination");
        }
    }

    #[cfg(windows)]
    {
        let ro = src_meta.permissions().readonly();
        if let Ok(meta) = fs::metadata(dest) {
            let mut perms = meta.permissions();
            perms.set_readonly(ro);
            if let Err(e) = fs::set_permissions(dest, perms) {
                warn!(path = %dest.display(), readonly = ro, error = %e, "failed to set readonly attribute on destination");
            }
        }
    }
}

/// Copy extended attributes from `src` to `dest` (no-op without the `xattrs` feature).
pub fn preserve_xattrs(src: &Path, dest: &Path) {
    #[cfg(feature = "xattrs")]
    {
        let names = match xattr::list(src) {
            Ok(names) => names,
            Err(e) => {
                warn!(src = %src.display(), error = %e, "failed to list xattrs");
                return;
            }
        };
        for name in names {
            let shown = name.to_string_lossy().into_owned();
            match xattr::get(src, &name) {
                Ok(value) => {
                    let value = value.unwrap_or_default();
                    if let Err(e) = xattr::set(dest, &name, &value) {
                        warn!(dest = %dest.display(), xattr = %shown, error = %e, "failed to set xattr");
                    } else {
                        trace!(dest = %dest.display(), xattr = %shown, size = value.len(), "preserved xattr");
                    }
                }
                Err(e) => warn!(src = %src.display(), xattr = %shown, error = %e, "failed to read xattr"),
            }
        }
    }
    #[cfg(not(feature = "xattrs"))]
    {
        let _ = (src, dest);
    }
}
