use crate::classifier::types::DecisionSource;

/// Trait for reporting scan and classification progress.
///
/// The CLI implements it with indicatif; library callers usually pass [`SilentReporter`].
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self) {}
    fn on_scan_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_classify_start(&self, _total_files: usize, _generator_enabled: bool) {}
    fn on_classify_progress(&self, _done: usize, _total: usize, _path: &str, _source: DecisionSource) {}
    fn on_classify_complete(&self, _total_files: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
