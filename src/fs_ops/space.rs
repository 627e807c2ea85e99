//! Free-space preflight.
//!
//! Compares the on-disk size of the source tree (counted like `du`: allocated
//! blocks, hard links once) with the space available on the target filesystem.
//! The check is advisory:
//! - dry-run: warn only
//! - force: warn and proceed
//! - otherwise: ask the operator; anything but "y"/"Y" aborts before any mutation
//!
//! If either number cannot be computed the check is skipped with a warning.

use serde::Serialize;
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::errors::ReorgError;
use crate::output as out;
use crate::platform::{allocated_bytes, free_space_bytes};

/// Operator confirmation seam; the binary asks on stdin, tests script answers.
pub trait Confirm {
    /// Return true only when the operator agreed to continue.
    fn confirm(&mut self, question: &str) -> bool;
}

/// Reads one line from stdin.
#[derive(Debug, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, question: &str) -> bool {
        match out::ask(question) {
            Ok(answer) => is_affirmative(&answer),
            Err(e) => {
                warn!(error = %e, "Could not read confirmation; treating as 'no'");
                false
            }
        }
    }
}

/// Only a bare "y" or "Y" counts as yes.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y")
}

pub(crate) fn format_bytes(n: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let f = n as f64;
    if f >= GB {
        format!("{:.1} GiB", f / GB)
    } else if f >= MB {
        format!("{:.1} MiB", f / MB)
    } else if f >= KB {
        format!("{:.1} KiB", f / KB)
    } else {
        format!("{} B", n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceVerdict {
    Sufficient,
    CheckSkipped,
    /// Not enough space; continued without asking (dry-run or force).
    InsufficientWarned,
    /// Not enough space; the operator said yes.
    InsufficientConfirmed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpaceReport {
    pub required: Option<u64>,
    pub available: Option<u64>,
    pub verdict: SpaceVerdict,
}

/// Total allocated bytes under `root`, counting each hard-linked inode once.
/// Any unreadable entry fails the whole estimate.
pub fn estimate_tree_size(root: &Path) -> io::Result<u64> {
    #[cfg(unix)]
    let mut seen = std::collections::HashSet::<(u64, u64)>::new();
    let mut total: u64 = 0;

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
            io::Error::other(format!("walk '{path}': {e}"))
        })?;
        let meta = entry.metadata().map_err(io::Error::other)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            if !meta.is_dir() && meta.nlink() > 1 && !seen.insert((meta.dev(), meta.ino())) {
                continue;
            }
        }

        total = total.saturating_add(allocated_bytes(&meta));
    }
    Ok(total)
}

/// Where the two preflight numbers come from.
pub trait SpaceProbe {
    fn required_bytes(&self, source: &Path) -> io::Result<u64>;
    fn available_bytes(&self, target: &Path) -> io::Result<u64>;
}

/// Walks the source tree and asks the target filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSpaceProbe;

impl SpaceProbe for FsSpaceProbe {
    fn required_bytes(&self, source: &Path) -> io::Result<u64> {
        estimate_tree_size(source)
    }

    fn available_bytes(&self, target: &Path) -> io::Result<u64> {
        free_space_bytes(target)
    }
}

/// Run the preflight for `source` -> `target` under the given mode flags.
pub fn preflight(
    probe: &dyn SpaceProbe,
    source: &Path,
    target: &Path,
    dry_run: bool,
    force: bool,
    confirm: &mut dyn Confirm,
) -> Result<SpaceReport, ReorgError> {
    let required = match probe.required_bytes(source) {
        Ok(n) => n,
        Err(e) => {
            warn!(source = %source.display(), error = %e, "Could not estimate source size; skipping space check");
            return Ok(SpaceReport {
                required: None,
                available: None,
                verdict: SpaceVerdict::CheckSkipped,
            });
        }
    };
    let available = match probe.available_bytes(target) {
        Ok(n) => n,
        Err(e) => {
            warn!(target = %target.display(), error = %e, "Could not read free space on target; skipping space check");
            return Ok(SpaceReport {
                required: Some(required),
                available: None,
                verdict: SpaceVerdict::CheckSkipped,
            });
        }
    };
    debug!(required, available, "Space preflight");

    if available >= required {
        return Ok(SpaceReport {
            required: Some(required),
            available: Some(available),
            verdict: SpaceVerdict::Sufficient,
        });
    }

    warn!(
        required,
        available,
        target = %target.display(),
        "Target may not have enough free space: need ~{}, free {}",
        format_bytes(required),
        format_bytes(available)
    );

    let verdict = if dry_run || force {
        SpaceVerdict::InsufficientWarned
    } else {
        let question = format!(
            "Source is ~{} but only {} is free on the target. Continue anyway?",
            format_bytes(required),
            format_bytes(available)
        );
        if !confirm.confirm(&question) {
            return Err(ReorgError::SpaceDeclined {
                required,
                available,
                target: target.to_path_buf(),
            });
        }
        SpaceVerdict::InsufficientConfirmed
    };

    Ok(SpaceReport {
        required: Some(required),
        available: Some(available),
        verdict,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    struct Scripted {
        answer: bool,
        asked: usize,
    }

    impl Confirm for Scripted {
        fn confirm(&mut self, _question: &str) -> bool {
            self.asked += 1;
            self.answer
        }
    }

    #[test]
    fn affirmative_is_strict() {
        assert!(is_affirmative("y\n"));
        assert!(is_affirmative(" Y "));
        assert!(!is_affirmative("yes"));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative(""));
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MiB");
    }

    #[test]
    fn tree_size_grows_with_content() {
        let td = tempdir().unwrap();
        let empty = estimate_tree_size(td.path()).unwrap();
        // Low-compressibility bytes so compressing filesystems still allocate blocks.
        let mut x: u32 = 0x1234_5678;
        let blob: Vec<u8> = (0..256 * 1024)
            .map(|_| {
                x = x.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (x >> 24) as u8
            })
            .collect();
        fs::write(td.path().join("blob"), blob).unwrap();
        let full = estimate_tree_size(td.path()).unwrap();
        assert!(full > empty, "expected {full} > {empty}");
    }

    #[cfg(unix)]
    #[test]
    fn hard_links_counted_once() {
        let td = tempdir().unwrap();
        let a = td.path().join("a");
        fs::write(&a, vec![1u8; 128 * 1024]).unwrap();
        let once = estimate_tree_size(td.path()).unwrap();
        fs::hard_link(&a, td.path().join("b")).unwrap();
        assert_eq!(estimate_tree_size(td.path()).unwrap(), once);
    }

    struct Fixed {
        required: u64,
        available: u64,
    }

    impl SpaceProbe for Fixed {
        fn required_bytes(&self, _: &Path) -> io::Result<u64> {
            Ok(self.required)
        }
        fn available_bytes(&self, _: &Path) -> io::Result<u64> {
            Ok(self.available)
        }
    }

    const TIGHT: Fixed = Fixed { required: 10_000, available: 10 };

    fn run(probe: &dyn SpaceProbe, dry_run: bool, force: bool, c: &mut Scripted) -> Result<SpaceReport, ReorgError> {
        preflight(probe, Path::new("/src"), Path::new("/dst"), dry_run, force, c)
    }

    #[test]
    fn sufficient_space_never_prompts() {
        let td = tempdir().unwrap();
        let mut c = Scripted { answer: false, asked: 0 };
        let r = preflight(&FsSpaceProbe, td.path(), td.path(), false, false, &mut c).unwrap();
        assert_eq!(r.verdict, SpaceVerdict::Sufficient);
        assert_eq!(c.asked, 0);
    }

    #[test]
    fn missing_target_degrades_to_skipped() {
        let td = tempdir().unwrap();
        let mut c = Scripted { answer: false, asked: 0 };
        let r = preflight(&FsSpaceProbe, td.path(), &td.path().join("gone"), false, false, &mut c).unwrap();
        assert_eq!(r.verdict, SpaceVerdict::CheckSkipped);
        assert_eq!(c.asked, 0);
    }

    #[test]
    fn dry_run_warns_without_prompt() {
        let mut c = Scripted { answer: false, asked: 0 };
        let r = run(&TIGHT, true, false, &mut c).unwrap();
        assert_eq!(r.verdict, SpaceVerdict::InsufficientWarned);
        assert_eq!(c.asked, 0);
    }

    #[test]
    fn force_warns_without_prompt() {
        let mut c = Scripted { answer: false, asked: 0 };
        let r = run(&TIGHT, false, true, &mut c).unwrap();
        assert_eq!(r.verdict, SpaceVerdict::InsufficientWarned);
        assert_eq!(c.asked, 0);
    }

    #[test]
    fn interactive_no_aborts() {
        let mut c = Scripted { answer: false, asked: 0 };
        let err = run(&TIGHT, false, false, &mut c).unwrap_err();
        assert!(matches!(err, ReorgError::SpaceDeclined { required: 10_000, available: 10, .. }));
        assert_eq!(c.asked, 1);
    }

    #[test]
    fn interactive_yes_continues() {
        let mut c = Scripted { answer: true, asked: 0 };
        let r = run(&TIGHT, false, false, &mut c).unwrap();
        assert_eq!(r.verdict, SpaceVerdict::InsufficientConfirmed);
        assert_eq!(r.required, Some(10_000));
    }
}
