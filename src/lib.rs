//! Core library for `reorganize`.
//!
//! Finds directories whose name ends in "Collection" directly under a source
//! directory and promotes each of their child directories one level up into a
//! target directory (the source itself by default). Collisions are skipped,
//! never merged; dry-runs go through the same code path without side effects.

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod report;
pub mod shutdown;

pub use config::{path_has_symlink_ancestor, Config, LogLevel, FORCE_COPY_ENV, MARKER_SUFFIX_DEFAULT};
pub use errors::ReorgError;
pub use fs_ops::{Confirm, FsSpaceProbe, SpaceProbe, StdinConfirm};
pub use pipeline::{reorganize, reorganize_with};
pub use report::{RunStats, RunSummary, TransferOutcome};
