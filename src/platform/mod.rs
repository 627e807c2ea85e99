//! Platform-specific helpers.
//! Hides OS differences (Unix/Windows) behind a uniform API so the rest of
//! the codebase stays platform-agnostic.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::{
    allocated_bytes, check_writable, free_space_bytes, is_cross_device,
    open_log_file_secure_append, rename_noreplace, running_as_root,
};

#[cfg(windows)]
pub use windows::{
    allocated_bytes, check_writable, free_space_bytes, is_cross_device,
    open_log_file_secure_append, rename_noreplace, running_as_root,
};
