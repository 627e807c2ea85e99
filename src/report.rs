//! Run accounting and the final summary.
//!
//! The reporter is the only owner of the counters. Each child produces exactly
//! one outcome; an unreadable collection produces one error for the whole
//! directory. Per-item lines are emitted as they happen, the summary at the end.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::fs_ops::mover::ChildEntry;
use crate::fs_ops::scan::CollectionDirectory;
use crate::fs_ops::space::SpaceReport;
use crate::fs_ops::transfer::TransferMethod;
use crate::output as out;

/// Result for one child directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransferOutcome {
    Moved {
        method: TransferMethod,
        /// Set when the copy succeeded but the source could not be deleted.
        #[serde(skip_serializing_if = "Option::is_none")]
        source_retained: Option<String>,
    },
    SkippedCollision,
    SkippedUnreadable { reason: String },
    Error { reason: String },
}

/// Counters read once all collections are processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub moved: u64,
    pub skipped: u64,
    pub errors: u64,
    /// Moves whose source could not be reclaimed (subset of `moved`).
    pub source_retained: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemRecord {
    pub collection: PathBuf,
    pub source: PathBuf,
    pub destination: PathBuf,
    #[serde(flatten)]
    pub outcome: TransferOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionFailure {
    pub collection: PathBuf,
    pub reason: String,
}

/// Everything a caller needs after the run: counts, mode and per-item detail.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub dry_run: bool,
    pub source: PathBuf,
    pub target: PathBuf,
    pub marker_suffix: String,
    pub collections: u64,
    pub empty_collections: u64,
    #[serde(flatten)]
    pub stats: RunStats,
    pub interrupted: bool,
    pub no_collections: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space: Option<SpaceReport>,
    pub items: Vec<ItemRecord>,
    pub collection_failures: Vec<CollectionFailure>,
}

impl RunSummary {
    /// Exit status policy: dry-runs always succeed; real runs fail on any error or interruption.
    pub fn succeeded(&self) -> bool {
        self.dry_run || (self.stats.errors == 0 && !self.interrupted)
    }

    /// Human-readable summary lines.
    pub fn render_text(&self) -> Vec<String> {
        if self.no_collections {
            return vec![format!(
                "No directories ending in '{}' found under {}",
                self.marker_suffix,
                self.source.display()
            )];
        }

        let s = &self.stats;
        let mut lines = vec![if self.dry_run {
            format!(
                "Dry-run summary: would move={}, would skip={}, errors={}",
                s.moved, s.skipped, s.errors
            )
        } else {
            format!("Summary: moved={}, skipped={}, errors={}", s.moved, s.skipped, s.errors)
        }];

        if s.source_retained > 0 {
            lines.push(format!(
                "{} moved director{} could not be removed from the source after copying; the data exists in both places",
                s.source_retained,
                if s.source_retained == 1 { "y" } else { "ies" }
            ));
        }
        if self.interrupted {
            lines.push("Run interrupted; remaining items were not processed".to_string());
        }
        lines
    }
}

/// Single owner of RunStats for one run.
#[derive(Debug)]
pub struct RunReporter {
    dry_run: bool,
    item_lines: bool,
    stats: RunStats,
    collections: u64,
    empty_collections: u64,
    interrupted: bool,
    items: Vec<ItemRecord>,
    collection_failures: Vec<CollectionFailure>,
}

impl RunReporter {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            item_lines: true,
            stats: RunStats::default(),
            collections: 0,
            empty_collections: 0,
            interrupted: false,
            items: Vec::new(),
            collection_failures: Vec::new(),
        }
    }

    /// Per-item lines on stdout; off when stdout carries the JSON summary.
    pub fn with_item_lines(mut self, on: bool) -> Self {
        self.item_lines = on;
        self
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// A collection is about to be processed.
    pub fn begin_collection(&mut self, collection: &CollectionDirectory, children: usize) {
        self.collections += 1;
        if children == 0 {
            self.empty_collections += 1;
            info!(collection = %collection.path().display(), "Collection has no subdirectories; nothing to move");
        } else {
            info!(collection = %collection.path().display(), children, "Processing collection");
        }
    }

    /// The collection itself could not be listed: one error for the whole directory.
    pub fn record_collection_error(&mut self, collection: &CollectionDirectory, reason: String) {
        self.collections += 1;
        self.stats.errors += 1;
        error!(collection = %collection.path().display(), error = %reason, "Cannot read collection; skipping it");
        self.collection_failures.push(CollectionFailure {
            collection: collection.path().to_path_buf(),
            reason,
        });
    }

    /// Count one child outcome and report it immediately.
    pub fn record(&mut self, collection: &Path, child: &ChildEntry, outcome: TransferOutcome) {
        let src = child.source().display();
        let dest = child.destination().display();
        match &outcome {
            TransferOutcome::Moved { method, source_retained } => {
                self.stats.moved += 1;
                if self.item_lines {
                    let verb = if self.dry_run { "Would move" } else { "Moved" };
                    out::print_user(&format!("{verb} '{src}' -> '{dest}'"));
                }
                info!(src = %src, dest = %dest, method = ?method, "Moved");
                if let Some(reason) = source_retained {
                    self.stats.source_retained += 1;
                    warn!(src = %src, error = %reason, "Source not reclaimed after copy");
                }
            }
            TransferOutcome::SkippedCollision => {
                self.stats.skipped += 1;
                warn!(src = %src, dest = %dest, "Destination already exists; leaving source in place");
            }
            TransferOutcome::SkippedUnreadable { reason } => {
                self.stats.errors += 1;
                error!(src = %src, error = %reason, "Cannot read directory; leaving it in place");
            }
            TransferOutcome::Error { reason } => {
                self.stats.errors += 1;
                error!(src = %src, dest = %dest, error = %reason, "Transfer failed; source left intact");
            }
        }
        self.items.push(ItemRecord {
            collection: collection.to_path_buf(),
            source: child.source().to_path_buf(),
            destination: child.destination().to_path_buf(),
            outcome,
        });
    }

    pub fn mark_interrupted(&mut self) {
        if !self.interrupted {
            warn!("Interrupt received; stopping before the next item");
        }
        self.interrupted = true;
    }

    /// Close the run and produce the summary.
    pub fn finish(
        self,
        source: &Path,
        target: &Path,
        marker_suffix: &str,
        space: Option<SpaceReport>,
        no_collections: bool,
    ) -> RunSummary {
        RunSummary {
            dry_run: self.dry_run,
            source: source.to_path_buf(),
            target: target.to_path_buf(),
            marker_suffix: marker_suffix.to_string(),
            collections: self.collections,
            empty_collections: self.empty_collections,
            stats: self.stats,
            interrupted: self.interrupted,
            no_collections,
            space,
            items: self.items,
            collection_failures: self.collection_failures,
        }
    }
}
