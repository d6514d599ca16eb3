use chrono::{SecondsFormat, Utc};
use dashmap::DashMap;
use glob::Pattern;
use rayon::prelude::*;
use serde_json::{json, Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Instant, UNIX_EPOCH};
use tracing::{debug, error, info};

use super::kind::classify_kind;
use crate::config::{self, ScanSettings};
use crate::error::Error;
use crate::index::{FileDescriptor, RepoIndex};
use crate::progress::ProgressReporter;

/// Walk the configured include paths and build a repository index.
///
/// Descriptors are sorted by path so the index is stable across runs.
pub fn scan_repository(
    settings: &ScanSettings,
    reporter: &dyn ProgressReporter,
) -> Result<RepoIndex, Error> {
    let root = PathBuf::from(&settings.root);
    let include_paths = config::non_overlapping_directories(settings.include_paths.clone());
    info!("Scanning {:?} under {}", include_paths, root.display());

    reporter.on_scan_start();
    let start = Instant::now();
    let files = collect_descriptors(&root, &include_paths, &settings.ignore_patterns)?;
    let duration = start.elapsed().as_secs_f64();
    reporter.on_scan_complete(files.len(), duration);
    debug!("Scan completed in {:.2}s, {} files", duration, files.len());

    let mut scan_metadata = Map::new();
    scan_metadata.insert("project_root".to_string(), json!(root.display().to_string()));
    scan_metadata.insert(
        "timestamp".to_string(),
        json!(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    scan_metadata.insert("git_commit".to_string(), json!(git_commit(&root)));
    scan_metadata.insert(
        "duration_seconds".to_string(),
        json!((duration * 1000.0).round() / 1000.0),
    );
    scan_metadata.insert("files_scanned".to_string(), json!(files.len()));
    scan_metadata.insert(
        "include_paths".to_string(),
        Value::from(include_paths.clone()),
    );

    Ok(RepoIndex {
        scan_metadata,
        files,
    })
}

/// Parallel directory traversal. Paths are relative to `root`, `/`-separated.
/// Skips symlinks and anything matching an ignore glob.
pub fn collect_descriptors(
    root: &Path,
    include_paths: &[String],
    ignore_globs: &[String],
) -> io::Result<Vec<FileDescriptor>> {
    let map: DashMap<String, FileDescriptor> = DashMap::new();

    let ignore_patterns: Vec<Pattern> = ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect();

    include_paths.par_iter().try_for_each(|include| {
        let dir = if include.is_empty() || include == "." {
            root.to_path_buf()
        } else {
            root.join(include)
        };
        visit_dirs(root, &dir, &map, &ignore_patterns)
    })?;

    let mut files: Vec<FileDescriptor> = map.into_iter().map(|(_, file)| file).collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_ignored(rel: &str, ignore_patterns: &[Pattern]) -> bool {
    ignore_patterns.iter().any(|pattern| pattern.matches(rel))
}

fn visit_dirs(
    root: &Path,
    dir: &Path,
    map: &DashMap<String, FileDescriptor>,
    ignore_patterns: &[Pattern],
) -> io::Result<()> {
    if !dir.is_dir() {
        debug!("Skipping missing include path {}", dir.display());
        return Ok(());
    }

    let rel_dir = relative_path(root, dir);
    if !rel_dir.is_empty() && is_ignored(&rel_dir, ignore_patterns) {
        return Ok(());
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            if err.kind() == io::ErrorKind::PermissionDenied {
                error!(
                    "Access denied reading directory {}: {}",
                    dir.display(),
                    err
                );
                return Ok(());
            } else {
                return Err(io::Error::new(
                    err.kind(),
                    format!("Error reading directory {}: {}", dir.display(), err),
                ));
            }
        }
    };

    entries.par_bridge().try_for_each(|entry_result| -> io::Result<()> {
        let entry = entry_result.map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("Error reading entry in directory {}: {}", dir.display(), err),
            )
        })?;

        let path = entry.path();
        let metadata = fs::symlink_metadata(&path).map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("Error getting metadata for {}: {}", path.display(), err),
            )
        })?;

        if metadata.file_type().is_symlink() {
            return Ok(());
        }

        if metadata.is_dir() {
            visit_dirs(root, &path, map, ignore_patterns)?;
        } else if metadata.is_file() {
            let rel = relative_path(root, &path);
            if is_ignored(&rel, ignore_patterns) {
                return Ok(());
            }

            let mtime = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0);
            let kind = classify_kind(&rel);

            map.insert(
                rel.clone(),
                FileDescriptor {
                    path: rel,
                    kind: kind.kind.to_string(),
                    size_bytes: metadata.len(),
                    mtime,
                    language: kind.language.map(str::to_string),
                    is_test: kind.is_test,
                },
            );
        }
        Ok(())
    })?;

    Ok(())
}

/// Current commit of the repository at `root`, or "unknown".
fn git_commit(root: &Path) -> String {
    Command::new("git")
        .arg("-C")
        .arg(root)
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .filter(|commit| !commit.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
