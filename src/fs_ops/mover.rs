//! Flattening one collection: each immediate child directory moves to
//! `target/<child name>`.
//!
//! Dry-run and real runs share this code path; `apply` only decides whether
//! the transfer step touches the filesystem. Destinations claimed earlier in
//! the run are remembered so a dry-run reports the same collisions a real run
//! would hit.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::ReorgError;
use crate::report::{RunReporter, TransferOutcome};
use crate::shutdown;

use super::helpers::build_message;
use super::scan::{list_subdirectories, CollectionDirectory};
use super::transfer::{move_directory, TransferFailure, TransferMethod};

/// One child of a collection and where it is headed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    source: PathBuf,
    name: OsString,
    destination: PathBuf,
}

impl ChildEntry {
    pub fn new(source: PathBuf, name: OsString, target_root: &Path) -> Self {
        let destination = target_root.join(&name);
        Self {
            source,
            name,
            destination,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn name(&self) -> &OsStr {
        &self.name
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

#[derive(Debug)]
pub struct SubdirectoryMover {
    target: PathBuf,
    apply: bool,
    claimed: HashSet<PathBuf>,
}

impl SubdirectoryMover {
    /// `apply == false` simulates every transfer.
    pub fn new(target: &Path, apply: bool) -> Self {
        Self {
            target: target.to_path_buf(),
            apply,
            claimed: HashSet::new(),
        }
    }

    /// Sorted child directories of `collection`, paired with their destinations.
    pub fn children(&self, collection: &CollectionDirectory) -> io::Result<Vec<ChildEntry>> {
        Ok(list_subdirectories(collection.path())?
            .into_iter()
            .map(|(name, path)| ChildEntry::new(path, name, &self.target))
            .collect())
    }

    /// Process every child of `collection`, reporting each outcome.
    /// Breaks when a shutdown was requested; the current item is never abandoned halfway.
    pub fn flatten(&mut self, collection: &CollectionDirectory, reporter: &mut RunReporter) -> ControlFlow<()> {
        let children = match self.children(collection) {
            Ok(children) => children,
            Err(e) => {
                reporter.record_collection_error(collection, build_message("list collection", collection.path(), &e));
                return ControlFlow::Continue(());
            }
        };
        reporter.begin_collection(collection, children.len());

        for child in &children {
            if shutdown::is_requested() {
                reporter.mark_interrupted();
                return ControlFlow::Break(());
            }
            let outcome = self.transfer(child);
            reporter.record(collection.path(), child, outcome);
        }
        ControlFlow::Continue(())
    }

    /// Decide and (when applying) perform the transfer for one child.
    pub fn transfer(&mut self, child: &ChildEntry) -> TransferOutcome {
        let dest = child.destination();

        if self.claimed.contains(dest) {
            debug!(dest = %dest.display(), "Destination claimed earlier in this run");
            return TransferOutcome::SkippedCollision;
        }
        match fs::symlink_metadata(dest) {
            Ok(_) => return TransferOutcome::SkippedCollision,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return TransferOutcome::Error {
                    reason: build_message("inspect destination", dest, &e),
                };
            }
        }

        if nests_inside_source(child) {
            return TransferOutcome::Error {
                reason: ReorgError::Transfer {
                    src: child.source().to_path_buf(),
                    dest: dest.to_path_buf(),
                    reason: "destination is inside the directory being moved".into(),
                }
                .to_string(),
            };
        }

        // An unlistable child cannot be copied, and renaming it would hide the problem.
        if let Err(e) = fs::read_dir(child.source()) {
            return TransferOutcome::SkippedUnreadable {
                reason: build_message("read directory", child.source(), &e),
            };
        }

        if !self.apply {
            self.claimed.insert(dest.to_path_buf());
            return TransferOutcome::Moved {
                method: TransferMethod::Simulated,
                source_retained: None,
            };
        }

        match move_directory(child.source(), dest) {
            Ok(done) => {
                self.claimed.insert(dest.to_path_buf());
                TransferOutcome::Moved {
                    method: done.method,
                    source_retained: done.source_retained,
                }
            }
            Err(TransferFailure::DestinationTaken) => TransferOutcome::SkippedCollision,
            Err(TransferFailure::Failed(e)) => TransferOutcome::Error {
                reason: ReorgError::Transfer {
                    src: child.source().to_path_buf(),
                    dest: dest.to_path_buf(),
                    reason: format!("{e:#}"),
                }
                .to_string(),
            },
        }
    }
}

/// True when the destination lies within the child itself, so a copy would
/// recurse into its own output. The child is resolved through its parent only:
/// a symlinked child moves as a link and never contains its destination.
fn nests_inside_source(child: &ChildEntry) -> bool {
    let source = match child.source().parent().map(dunce::canonicalize) {
        Some(Ok(parent)) => parent.join(child.name()),
        _ => child.source().to_path_buf(),
    };
    child.destination().starts_with(source)
}
