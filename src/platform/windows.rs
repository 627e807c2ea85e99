//! Windows implementations of platform helpers (best-effort, no ACL awareness).

use std::fs::{self, File, Metadata, OpenOptions};
use std::io;
use std::iter::once;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;

/// Open log file for appending (no symlink defense available via std on Windows).
pub fn open_log_file_secure_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Bytes available to the caller on the volume holding `path`.
pub fn free_space_bytes(path: &Path) -> io::Result<u64> {
    use windows_sys::Win32::Storage::FileSystem::GetDiskFreeSpaceExW;
    let wide: Vec<u16> = path.as_os_str().encode_wide().chain(once(0)).collect();
    let mut free_avail: u64 = 0;
    let mut total: u64 = 0;
    let mut total_free: u64 = 0;
    // SAFETY: `wide` is NUL-terminated and the out-pointers reference live u64s.
    let ok = unsafe { GetDiskFreeSpaceExW(wide.as_ptr(), &mut free_avail, &mut total, &mut total_free) };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(free_avail)
}

/// Logical length; allocation size is not exposed through std on Windows.
pub fn allocated_bytes(meta: &Metadata) -> u64 {
    meta.len()
}

/// Windows ignores READONLY on directories when creating entries, and ACLs
/// are not inspected; only reachability is checked. Denials surface per item.
pub fn check_writable(path: &Path) -> io::Result<()> {
    fs::metadata(path).map(|_| ())
}

/// MoveFileEx refuses to replace an existing directory; a file at the
/// destination is caught by the caller's collision check.
pub fn rename_noreplace(src: &Path, dst: &Path) -> io::Result<()> {
    fs::rename(src, dst)
}

/// ERROR_NOT_SAME_DEVICE
pub fn is_cross_device(e: &io::Error) -> bool {
    e.raw_os_error() == Some(17)
}

pub fn running_as_root() -> bool {
    false
}
