//! Config module.
//! Provides the run configuration, verbosity levels, validation and path-safety helpers.
//! Nothing here is persisted; a Config is built from CLI flags for each run.

pub mod paths;
pub mod types;
mod validate;

pub use paths::{path_has_symlink_ancestor, path_traverses_symlink};
pub use types::{Config, LogLevel};

/// Name suffix that marks a collection directory.
pub const MARKER_SUFFIX_DEFAULT: &str = "Collection";

/// Environment hook forcing the copy+delete transfer path (used by tests to
/// exercise the cross-filesystem branch on a single filesystem).
pub const FORCE_COPY_ENV: &str = "REORGANIZE_FORCE_COPY";
