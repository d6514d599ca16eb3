use std::path::Path;

use super::types::{DecisionSource, LifecycleDecision, Recommendation};

/// Directory segments that mean a file has already been archived.
const ARCHIVE_DIRS: &[&str] = &["archive", "archived", "archives", "legacy", "deprecated", "old"];

const LEGACY_MARKERS: &[&str] = &[
    "_legacy.",
    "-legacy.",
    "_old.",
    "-old.",
    "_deprecated.",
    "-deprecated.",
    "_backup.",
    "-backup.",
];

const BACKUP_SUFFIXES: &[&str] = &[".bak", ".backup", "~", ".swp", ".swo", ".orig", ".copy"];

/// Rule-based lifecycle decision for one file.
///
/// Patterns are checked before age; the first match wins. `age_days` must be computed
/// from a clock captured once per run so repeated runs give identical output.
pub fn classify_by_rules(
    path: &str,
    kind: &str,
    age_days: f64,
    deprecation_days: u32,
) -> Recommendation {
    let threshold = f64::from(deprecation_days);
    let days = age_days as i64;

    if is_archive_pattern(path) {
        return recommend(
            path,
            LifecycleDecision::Archive,
            0.95,
            vec![
                "Already in archive directory".to_string(),
                "Standard archive pattern".to_string(),
            ],
            None,
        );
    }

    if is_legacy_pattern(path) {
        return recommend(
            path,
            LifecycleDecision::Archive,
            0.90,
            vec![
                "Legacy file pattern detected".to_string(),
                "Should be preserved".to_string(),
            ],
            Some(archive_action(path)),
        );
    }

    if is_backup_pattern(path) {
        return recommend(
            path,
            LifecycleDecision::Delete,
            0.85,
            vec!["Backup file pattern".to_string(), "Safe to remove".to_string()],
            Some("Delete file (backup copy)".to_string()),
        );
    }

    if age_days >= threshold * 3.0 {
        return recommend(
            path,
            LifecycleDecision::Archive,
            0.80,
            vec![
                format!("Last modified {} days ago", days),
                format!("Exceeds 3x deprecation threshold ({} days)", deprecation_days),
                format!("File type: {}", kind),
            ],
            Some(archive_action(path)),
        );
    }

    if age_days >= threshold * 1.5 {
        return recommend(
            path,
            LifecycleDecision::Review,
            0.65,
            vec![
                format!("Last modified {} days ago", days),
                format!("Exceeds 1.5x deprecation threshold ({} days)", deprecation_days),
                format!("File type: {}", kind),
            ],
            Some("Manual review recommended".to_string()),
        );
    }

    if age_days >= threshold {
        return recommend(
            path,
            LifecycleDecision::Review,
            0.60,
            vec![
                format!("Last modified {} days ago", days),
                format!("Reaches deprecation threshold ({} days)", deprecation_days),
            ],
            None,
        );
    }

    recommend(
        path,
        LifecycleDecision::Keep,
        0.90,
        vec![
            format!("Recently modified ({} days ago)", days),
            format!("File type: {}", kind),
        ],
        None,
    )
}

fn recommend(
    path: &str,
    decision: LifecycleDecision,
    confidence: f64,
    reasons: Vec<String>,
    suggested_action: Option<String>,
) -> Recommendation {
    Recommendation {
        path: path.to_string(),
        decision,
        confidence,
        reasons,
        suggested_action,
        source: DecisionSource::Rules,
    }
}

fn archive_action(path: &str) -> String {
    let parent = Path::new(path)
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| ".".to_string());
    format!("Move to docs/archive/{}/", parent)
}

fn normalized(path: &str) -> String {
    path.replace('\\', "/").to_lowercase()
}

/// True when any directory segment of `path` is an archive-style directory.
pub fn is_archive_pattern(path: &str) -> bool {
    let lower = normalized(path);
    let mut segments: Vec<&str> = lower.split('/').collect();
    // the final segment is the file name
    segments.pop();
    segments.iter().any(|segment| ARCHIVE_DIRS.contains(segment))
}

pub fn is_legacy_pattern(path: &str) -> bool {
    let lower = normalized(path);
    LEGACY_MARKERS.iter().any(|marker| lower.contains(marker))
}

pub fn is_backup_pattern(path: &str) -> bool {
    let lower = normalized(path);
    BACKUP_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}
