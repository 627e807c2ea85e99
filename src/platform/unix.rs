//! Unix implementations of platform helpers.

use std::ffi::CString;
use std::fs::{self, File, Metadata, OpenOptions};
use std::io;
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{MetadataExt, OpenOptionsExt, PermissionsExt};
use std::path::Path;

fn c_path(path: &Path) -> io::Result<CString> {
    CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains null byte"))
}

/// Open log file for appending; set 0600 only when creating a new file.
/// An existing file keeps its permissions (e.g. group-readable for log shipping).
pub fn open_log_file_secure_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let existed = path.exists();
    let f = OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o600)
        .open(path)?;
    if !existed {
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(f)
}

/// Bytes available to an unprivileged user on the filesystem holding `path` (statvfs).
pub fn free_space_bytes(path: &Path) -> io::Result<u64> {
    let cpath = c_path(path)?;
    let mut stat: MaybeUninit<libc::statvfs> = MaybeUninit::uninit();
    // SAFETY: cpath is NUL-terminated and stat points to writable storage of the right type.
    let rc = unsafe { libc::statvfs(cpath.as_ptr(), stat.as_mut_ptr()) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: statvfs returned 0, so the struct is initialized.
    let stat = unsafe { stat.assume_init() };
    Ok((stat.f_bavail as u64).saturating_mul(stat.f_frsize as u64))
}

/// On-disk footprint of an entry, the way `du` counts it (512-byte blocks).
pub fn allocated_bytes(meta: &Metadata) -> u64 {
    meta.blocks().saturating_mul(512)
}

/// Check write+search permission on a directory without creating anything.
pub fn check_writable(path: &Path) -> io::Result<()> {
    let cpath = c_path(path)?;
    // SAFETY: cpath is a valid NUL-terminated string.
    let rc = unsafe { libc::access(cpath.as_ptr(), libc::W_OK | libc::X_OK) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Rename that refuses to replace an existing destination.
/// Linux uses renameat2(RENAME_NOREPLACE); when the kernel or filesystem does
/// not support it, and on other Unixes, a plain rename is used (callers have
/// already checked the destination).
pub fn rename_noreplace(src: &Path, dst: &Path) -> io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        let s = c_path(src)?;
        let d = c_path(dst)?;
        // SAFETY: both paths are valid NUL-terminated strings; AT_FDCWD resolves them relative to cwd.
        let rc = unsafe {
            libc::syscall(
                libc::SYS_renameat2,
                libc::AT_FDCWD,
                s.as_ptr(),
                libc::AT_FDCWD,
                d.as_ptr(),
                libc::RENAME_NOREPLACE,
            )
        };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(code) if code == libc::ENOSYS || code == libc::EINVAL => {}
            _ => return Err(err),
        }
    }
    fs::rename(src, dst)
}

/// True for EXDEV ("Invalid cross-device link").
pub fn is_cross_device(e: &io::Error) -> bool {
    e.raw_os_error() == Some(libc::EXDEV)
}

/// Effective uid is root; permission tests are meaningless then.
pub fn running_as_root() -> bool {
    // SAFETY: geteuid has no preconditions.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn new_log_file_gets_0600() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("new_log.txt");
        let _f = open_log_file_secure_append(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "newly created log file should be 0600");
    }

    #[test]
    fn existing_log_file_mode_preserved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, b"hello").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();
        let _f = open_log_file_secure_append(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[test]
    fn free_space_smoke() {
        let dir = tempdir().unwrap();
        assert!(free_space_bytes(dir.path()).unwrap() > 0);
    }

    #[test]
    fn free_space_missing_path_errors() {
        let dir = tempdir().unwrap();
        assert!(free_space_bytes(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn tempdir_is_writable() {
        let dir = tempdir().unwrap();
        check_writable(dir.path()).unwrap();
    }

    #[test]
    fn readonly_dir_not_writable() {
        if running_as_root() {
            eprintln!("skipping: running as root");
            return;
        }
        let dir = tempdir().unwrap();
        let ro = dir.path().join("ro");
        fs::create_dir(&ro).unwrap();
        fs::set_permissions(&ro, fs::Permissions::from_mode(0o555)).unwrap();
        let err = check_writable(&ro).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        fs::set_permissions(&ro, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn rename_noreplace_moves_directory() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("f"), b"x").unwrap();
        let dst = dir.path().join("b");
        rename_noreplace(&src, &dst).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read(dst.join("f")).unwrap(), b"x");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn rename_noreplace_refuses_existing_empty_dir() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a");
        let dst = dir.path().join("b");
        fs::create_dir(&src).unwrap();
        fs::create_dir(&dst).unwrap();
        match rename_noreplace(&src, &dst) {
            Err(err) => {
                assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
                assert!(src.exists());
            }
            // Filesystem without RENAME_NOREPLACE: plain rename fallback ran.
            Ok(()) => eprintln!("skipping: RENAME_NOREPLACE unsupported here"),
        }
    }
}
