// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn create_and_drop_removes_directory() {
    let base = tempfile::tempdir().unwrap();
    let path;
    {
        let workdir = ScopedWorkdir::create(base.path(), "job-1").unwrap();
        path = workdir.path().to_path_buf();
        assert!(path.is_dir());
        std::fs::write(path.join("scratch.json"), b"{}").unwrap();
    }
    assert!(!path.exists());
}

#[test]
fn explicit_remove_reports_success() {
    let base = tempfile::tempdir().unwrap();
    let workdir = ScopedWorkdir::create(base.path(), "job-2").unwrap();
    let path = workdir.path().to_path_buf();
    workdir.remove().unwrap();
    assert!(!path.exists());
}

#[test]
fn drop_tolerates_already_removed_directory() {
    let base = tempfile::tempdir().unwrap();
    let workdir = ScopedWorkdir::create(base.path(), "job-3").unwrap();
    std::fs::remove_dir_all(workdir.path()).unwrap();
    drop(workdir); // must not panic
}
