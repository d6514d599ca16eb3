use std::fs;
use std::path::Path;
use tempfile::tempdir;

use sweeper_core::config::{ClassifierSettings, ScanSettings};
use sweeper_core::scanner::{collect_descriptors, scan_repository};
use sweeper_core::{ClassifyEngine, RepoIndex, SilentReporter};

/// Layout:
///   root/
///     README.md
///     src/app.py
///     src/app.py.bak
///     tests/test_app.py
///     scripts/deploy.sh
///     target/debug/out.bin   (ignored)
///     .git/HEAD              (ignored)
///     build/run.log
fn create_test_tree(root: &Path) {
    for dir in ["src", "tests", "scripts", "target/debug", ".git", "build"] {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
    fs::write(root.join("README.md"), "# demo").unwrap();
    fs::write(root.join("src/app.py"), "print('hi')").unwrap();
    fs::write(root.join("src/app.py.bak"), "print('old')").unwrap();
    fs::write(root.join("tests/test_app.py"), "def test_app(): pass").unwrap();
    fs::write(root.join("scripts/deploy.sh"), "#!/bin/sh").unwrap();
    fs::write(root.join("target/debug/out.bin"), [0u8; 16]).unwrap();
    fs::write(root.join(".git/HEAD"), "ref: refs/heads/main").unwrap();
    fs::write(root.join("build/run.log"), "").unwrap();
}

fn settings(root: &Path) -> ScanSettings {
    ScanSettings {
        root: root.to_string_lossy().into_owned(),
        ..ScanSettings::default()
    }
}

#[test]
fn test_scan_builds_sorted_relative_index() {
    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());

    let index = scan_repository(&settings(tmp.path()), &SilentReporter).unwrap();
    let paths: Vec<&str> = index.files.iter().map(|f| f.path.as_str()).collect();

    assert_eq!(
        paths,
        vec![
            "README.md",
            "build/run.log",
            "scripts/deploy.sh",
            "src/app.py",
            "src/app.py.bak",
            "tests/test_app.py",
        ]
    );

    let readme = &index.files[0];
    assert_eq!(readme.kind, "doc");
    assert_eq!(readme.language.as_deref(), Some("markdown"));
    assert_eq!(readme.size_bytes, 6);
    assert!(readme.mtime > 0.0);

    let test_file = index.files.iter().find(|f| f.path == "tests/test_app.py").unwrap();
    assert!(test_file.is_test);
    assert_eq!(test_file.kind, "test");

    let empty_log = index.files.iter().find(|f| f.path == "build/run.log").unwrap();
    assert_eq!(empty_log.size_bytes, 0);
}

#[test]
fn test_scan_metadata_is_recorded() {
    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());

    let index = scan_repository(&settings(tmp.path()), &SilentReporter).unwrap();
    let meta = &index.scan_metadata;

    assert_eq!(meta["files_scanned"], 6);
    assert!(meta["git_commit"].is_string());
    assert!(meta["timestamp"].as_str().unwrap().ends_with('Z'));
    assert!(meta["duration_seconds"].as_f64().unwrap() >= 0.0);
    assert_eq!(
        meta["project_root"].as_str().unwrap(),
        tmp.path().to_string_lossy()
    );
}

#[test]
fn test_ignore_globs_and_include_paths() {
    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());

    let files = collect_descriptors(
        tmp.path(),
        &["src".to_string(), "build".to_string()],
        &["*.log".to_string(), "*.bak".to_string()],
    )
    .unwrap();
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["src/app.py"]);
}

#[test]
fn test_repeated_include_paths_yield_unique_files() {
    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());

    let scan = ScanSettings {
        include_paths: vec!["src".to_string(), ".".to_string(), "src".to_string()],
        ..settings(tmp.path())
    };
    let index = scan_repository(&scan, &SilentReporter).unwrap();
    assert_eq!(index.files.len(), 6);
}

#[test]
fn test_missing_include_path_is_skipped() {
    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());

    let files =
        collect_descriptors(tmp.path(), &["does_not_exist".to_string()], &[]).unwrap();
    assert!(files.is_empty());
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_skipped() {
    let tmp = tempdir().unwrap();
    create_test_tree(tmp.path());
    std::os::unix::fs::symlink(tmp.path().join("src/app.py"), tmp.path().join("link.py")).unwrap();

    let index = scan_repository(&settings(tmp.path()), &SilentReporter).unwrap();
    assert!(index.files.iter().all(|f| f.path != "link.py"));
}

#[test]
fn test_scanned_index_feeds_classification() {
    let tmp = tempdir().unwrap();
    let repo = tmp.path().join("repo");
    create_test_tree(&repo);

    let index = scan_repository(&settings(&repo), &SilentReporter).unwrap();
    let index_path = tmp.path().join("out").join("repo_index.json");
    index.save(&index_path).unwrap();

    let reloaded = RepoIndex::load(&index_path).unwrap();
    assert_eq!(reloaded.files, index.files);

    let report = ClassifyEngine::new(ClassifierSettings::default())
        .run(&index_path, None, &SilentReporter)
        .unwrap();
    assert_eq!(report.recommendations.len(), index.files.len());

    let backup = report
        .recommendations
        .iter()
        .find(|r| r.path == "src/app.py.bak")
        .unwrap();
    assert_eq!(backup.decision.as_str(), "delete");
    assert_eq!(report.summary.total_files, 6);
}
