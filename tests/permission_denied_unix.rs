#![cfg(unix)]

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use reorganize::platform::running_as_root;
use reorganize::{reorganize_with, Config, Confirm, ReorgError, SpaceProbe};
use serial_test::serial;
use tempfile::tempdir;

struct Roomy;

impl SpaceProbe for Roomy {
    fn required_bytes(&self, _: &Path) -> io::Result<u64> {
        Ok(0)
    }
    fn available_bytes(&self, _: &Path) -> io::Result<u64> {
        Ok(u64::MAX)
    }
}

struct NeverAsked;

impl Confirm for NeverAsked {
    fn confirm(&mut self, question: &str) -> bool {
        panic!("unexpected prompt: {question}");
    }
}

fn set_mode(p: &Path, mode: u32) {
    fs::set_permissions(p, fs::Permissions::from_mode(mode)).expect("chmod");
}

#[test]
#[serial]
fn unreadable_collection_is_one_error_and_others_still_move() {
    if running_as_root() {
        eprintln!("skipping: running as root");
        return;
    }
    let td = tempdir().unwrap();
    let locked = td.path().join("LockedCollection");
    fs::create_dir_all(locked.join("A")).unwrap();
    fs::create_dir_all(locked.join("B")).unwrap();
    fs::create_dir_all(td.path().join("OpenCollection").join("C")).unwrap();
    set_mode(&locked, 0o000);

    let result = reorganize_with(&Config::new(td.path()), &Roomy, &mut NeverAsked);
    set_mode(&locked, 0o755);
    let summary = result.unwrap();

    assert_eq!(summary.stats.errors, 1);
    assert_eq!(summary.stats.moved, 1);
    assert_eq!(summary.collection_failures.len(), 1);
    assert!(td.path().join("C").is_dir());
    assert!(locked.join("A").is_dir());
    assert!(!summary.succeeded(), "a real run with errors fails");
}

#[test]
#[serial]
fn unreadable_collection_in_dry_run_still_succeeds() {
    if running_as_root() {
        eprintln!("skipping: running as root");
        return;
    }
    let td = tempdir().unwrap();
    let locked = td.path().join("LockedCollection");
    fs::create_dir_all(locked.join("A")).unwrap();
    set_mode(&locked, 0o000);

    let result = reorganize_with(&Config::new(td.path()).with_dry_run(true), &Roomy, &mut NeverAsked);
    set_mode(&locked, 0o755);
    let summary = result.unwrap();

    assert_eq!(summary.stats.errors, 1);
    assert!(summary.succeeded());
}

#[test]
#[serial]
fn unwritable_target_aborts_before_scanning() {
    if running_as_root() {
        eprintln!("skipping: running as root");
        return;
    }
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    fs::create_dir_all(src.path().join("MoviesCollection").join("Alien")).unwrap();
    set_mode(dst.path(), 0o555);

    let result = reorganize_with(&Config::new(src.path()).with_target(dst.path()), &Roomy, &mut NeverAsked);
    set_mode(dst.path(), 0o755);

    assert!(matches!(result.unwrap_err(), ReorgError::PermissionDenied { .. }));
    assert!(src.path().join("MoviesCollection").join("Alien").is_dir());
}

#[test]
#[serial]
fn target_that_is_a_file_is_rejected() {
    let src = tempdir().unwrap();
    let file = src.path().join("not-a-dir");
    fs::write(&file, b"x").unwrap();

    let err = reorganize_with(&Config::new(src.path()).with_target(&file), &Roomy, &mut NeverAsked).unwrap_err();
    assert!(matches!(err, ReorgError::NotADirectory { role: "target", .. }));
}
