//! Filesystem operations: modularized.

mod helpers;
pub mod metadata;
pub mod mover;
pub mod resolve;
pub mod scan;
pub mod space;
pub mod transfer;

pub use mover::{ChildEntry, SubdirectoryMover};
pub use resolve::{resolve_dir, resolve_roots, ResolvedPath, ResolvedRoots};
pub use scan::{is_collection_name, scan_collections, CollectionDirectory};
pub use space::{
    estimate_tree_size, is_affirmative, preflight, Confirm, FsSpaceProbe, SpaceProbe, SpaceReport, SpaceVerdict,
    StdinConfirm,
};
pub use transfer::{move_directory, TransferFailure, TransferMethod, Transferred};
