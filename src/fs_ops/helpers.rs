//! I/O error enrichment.
//!
//! Adapters that turn a bare `io::Error` into a message naming the operation,
//! the path, and a platform-aware hint. Use with `map_err`:
//!
//!   fs::create_dir(dest).map_err(io_error_with_help("create destination", dest))?;

use anyhow::anyhow;
use std::io;
use std::path::Path;

/// Hint for well-known raw OS error codes.
#[cfg(unix)]
fn os_hint(code: i32) -> Option<&'static str> {
    match code {
        libc::EACCES | libc::EPERM => Some("permission denied; check ownership and mode bits"),
        libc::EXDEV => Some("different filesystems; rename cannot cross them"),
        libc::EBUSY => Some("resource busy; something else is using it"),
        libc::ENOENT => Some("path not found; it may have been moved or removed"),
        libc::EEXIST | libc::ENOTEMPTY => Some("destination already exists"),
        libc::ENOSPC => Some("no space left on device"),
        libc::EROFS => Some("read-only filesystem"),
        libc::ELOOP => Some("too many levels of symbolic links"),
        libc::ENAMETOOLONG => Some("name or path too long"),
        libc::EMFILE | libc::ENFILE => Some("too many open files"),
        _ => None,
    }
}

#[cfg(windows)]
fn os_hint(code: i32) -> Option<&'static str> {
    match code {
        5 => Some("access denied; check permissions"),
        17 => Some("different volumes; rename cannot cross them"),
        32 => Some("sharing violation; file is in use"),
        2 | 3 => Some("path not found"),
        80 | 183 => Some("destination already exists"),
        112 => Some("disk full"),
        19 => Some("write-protected media"),
        206 => Some("name or path too long"),
        _ => None,
    }
}

fn kind_hint(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::PermissionDenied => Some("permission denied; check ownership and mode bits"),
        io::ErrorKind::NotFound => Some("path not found"),
        io::ErrorKind::AlreadyExists => Some("destination already exists"),
        io::ErrorKind::Interrupted => Some("interrupted"),
        _ => None,
    }
}

/// "<op> '<path>': <error> (<hint>) [os code: N]"
pub(crate) fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);
    let hint = match e.raw_os_error() {
        Some(code) => os_hint(code),
        None => kind_hint(e.kind()),
    };
    if let Some(h) = hint {
        msg.push_str(" (");
        msg.push_str(h);
        msg.push(')');
    }
    if let Some(code) = e.raw_os_error() {
        msg.push_str(&format!(" [os code: {code}]"));
    }
    msg
}

/// Adapter for `anyhow::Result` code.
pub fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| anyhow!(build_message(op, path, &e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn message_names_operation_and_path() {
        let p = PathBuf::from("/data/x");
        let e = io::Error::new(io::ErrorKind::NotFound, "gone");
        let msg = build_message("open", &p, &e);
        assert!(msg.starts_with("open '/data/x': gone"));
        assert!(msg.contains("path not found"));
    }

    #[cfg(unix)]
    #[test]
    fn raw_os_code_gets_hint_and_code() {
        let p = PathBuf::from("/mnt/a");
        let e = io::Error::from_raw_os_error(libc::EXDEV);
        let msg = build_message("rename", &p, &e);
        assert!(msg.contains("different filesystems"));
        assert!(msg.contains(&format!("[os code: {}]", libc::EXDEV)));
    }
}
