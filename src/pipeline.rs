//! One reorganize run, end to end:
//! resolve roots, space preflight, scan, flatten each collection, summarize.
//!
//! Structural failures (bad roots, declined space prompt, unreadable source)
//! return `Err` before anything is moved. Per-item failures are recorded in the
//! summary and never stop the run.

use tracing::{debug, info};

use crate::config::Config;
use crate::errors::ReorgError;
use crate::fs_ops::{
    preflight, resolve_roots, scan_collections, Confirm, FsSpaceProbe, SpaceProbe, StdinConfirm, SubdirectoryMover,
};
use crate::report::{RunReporter, RunSummary};

/// Run with explicit seams for the space probe and the operator prompt.
pub fn reorganize_with(
    cfg: &Config,
    probe: &dyn SpaceProbe,
    confirm: &mut dyn Confirm,
) -> Result<RunSummary, ReorgError> {
    cfg.validate()?;
    let roots = resolve_roots(cfg)?;
    let source = roots.source.path();
    let target = roots.target.path();
    info!(
        source = %source.display(),
        target = %target.display(),
        dry_run = cfg.dry_run,
        in_place = roots.in_place(),
        "Starting reorganize"
    );

    let space = preflight(probe, source, target, cfg.dry_run, cfg.force, confirm)?;
    debug!(verdict = ?space.verdict, "Space preflight done");

    let collections = scan_collections(source, &cfg.marker_suffix)?;
    let mut reporter = RunReporter::new(cfg.dry_run).with_item_lines(!cfg.json);
    if collections.is_empty() {
        return Ok(reporter.finish(source, target, &cfg.marker_suffix, Some(space), true));
    }

    let mut mover = SubdirectoryMover::new(target, !cfg.dry_run);
    for collection in &collections {
        if mover.flatten(collection, &mut reporter).is_break() {
            break;
        }
    }

    let summary = reporter.finish(source, target, &cfg.marker_suffix, Some(space), false);
    info!(
        moved = summary.stats.moved,
        skipped = summary.stats.skipped,
        errors = summary.stats.errors,
        "Reorganize finished"
    );
    Ok(summary)
}

/// Run against the real filesystem, asking on stdin if space looks short.
pub fn reorganize(cfg: &Config) -> Result<RunSummary, ReorgError> {
    reorganize_with(cfg, &FsSpaceProbe, &mut StdinConfirm)
}
