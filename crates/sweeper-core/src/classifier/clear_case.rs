use crate::index::FileDescriptor;

use super::types::LifecycleDecision;

/// Substrings marking temp, log and editor backup files.
const SCRATCH_MARKERS: &[&str] = &[".log", ".tmp", ".bak", ".swp"];

/// Kinds treated as documentation or static configuration.
const DOC_KINDS: &[&str] = &["md", "markdown", "txt", "text", "doc", "json", "config"];

const RECENT_DAYS: f64 = 30.0;
const STALE_DAYS: f64 = 365.0;

/// Outcome of the metadata-only pre-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearCase {
    /// The decision is obvious; no generator call is needed.
    Clear(LifecycleDecision),
    Uncertain,
}

pub fn check_clear_case(file: &FileDescriptor, now: f64, core_prefixes: &[String]) -> ClearCase {
    let age_days = file.age_days(now);

    if age_days < RECENT_DAYS
        && core_prefixes
            .iter()
            .any(|prefix| file.path.starts_with(prefix.as_str()))
    {
        return ClearCase::Clear(LifecycleDecision::Keep);
    }

    let lower = file.path.to_lowercase();
    if SCRATCH_MARKERS.iter().any(|marker| lower.contains(marker)) || lower.ends_with('~') {
        return ClearCase::Clear(LifecycleDecision::Archive);
    }

    if age_days > STALE_DAYS && DOC_KINDS.contains(&file.kind.as_str()) {
        return ClearCase::Clear(LifecycleDecision::Review);
    }

    ClearCase::Uncertain
}
