use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::classifier::{
    check_clear_case, classify_by_rules, ClearCase, DecisionSource, GenerationAdapter,
    LifecycleDecision, Recommendation, RunStatistics, Summary,
};
use crate::config::{ClassifierSettings, Policy};
use crate::error::Error;
use crate::generator::Generator;
use crate::index::{FileDescriptor, RepoIndex};
use crate::progress::ProgressReporter;
use crate::report::{ClassificationMethod, ClassificationReport, RunMetadata};

const CLEAR_CASE_CONFIDENCE: f64 = 0.9;

/// Hybrid lifecycle classifier: rules, clear-case shortcuts and an optional generator.
pub struct ClassifyEngine {
    settings: ClassifierSettings,
    now: f64,
}

#[derive(Debug)]
pub struct ClassificationRun {
    /// One per input file, in input order.
    pub recommendations: Vec<Recommendation>,
    pub method: ClassificationMethod,
    pub policy: Policy,
    pub max_generation_calls: Option<usize>,
    pub generation_calls: usize,
    /// Present only when a generator took part in the run.
    pub stats: Option<RunStatistics>,
    pub generator_usage: Option<Value>,
    pub duration: Duration,
}

/// Path-keyed store of decisions in processing order, re-projected into input order at the end.
struct DecisionLedger<'a> {
    by_path: HashMap<&'a str, Recommendation>,
    recorded: usize,
    total: usize,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> DecisionLedger<'a> {
    fn new(total: usize, reporter: &'a dyn ProgressReporter) -> Self {
        Self {
            by_path: HashMap::with_capacity(total),
            recorded: 0,
            total,
            reporter,
        }
    }

    fn record(&mut self, path: &'a str, rec: Recommendation) {
        debug!(
            "{} -> {} ({:.2}, {:?})",
            path, rec.decision, rec.confidence, rec.source
        );
        let source = rec.source;
        if self.by_path.insert(path, rec).is_some() {
            warn!("Duplicate path in input, keeping the latest decision: {}", path);
        }
        self.recorded += 1;
        self.reporter
            .on_classify_progress(self.recorded, self.total, path, source);
    }

    fn into_input_order<F>(self, files: &[FileDescriptor], fallback: F) -> Vec<Recommendation>
    where
        F: Fn(&FileDescriptor) -> Recommendation,
    {
        files
            .iter()
            .map(|file| match self.by_path.get(file.path.as_str()) {
                Some(rec) => rec.clone(),
                None => fallback(file),
            })
            .collect()
    }
}

impl ClassifyEngine {
    pub fn new(settings: ClassifierSettings) -> Self {
        Self {
            settings,
            now: Utc::now().timestamp_millis() as f64 / 1000.0,
        }
    }

    /// Pin the clock used for file ages (POSIX seconds).
    pub fn with_now(mut self, now: f64) -> Self {
        self.now = now;
        self
    }

    /// Load the repository index at `index_path`, classify every file and build the report.
    ///
    /// Loading the index is the only step that can fail.
    pub fn run(
        &self,
        index_path: &Path,
        generator: Option<&dyn Generator>,
        reporter: &dyn ProgressReporter,
    ) -> Result<ClassificationReport, Error> {
        info!("Loading repo index from {}", index_path.display());
        let index = RepoIndex::load(index_path)?;
        let run = self.classify(&index.files, generator, reporter);
        Ok(self.build_report(
            run,
            index_path.display().to_string(),
            index.scan_metadata,
        ))
    }

    pub fn classify(
        &self,
        files: &[FileDescriptor],
        generator: Option<&dyn Generator>,
        reporter: &dyn ProgressReporter,
    ) -> ClassificationRun {
        let start = Instant::now();

        let generator = match generator {
            Some(g) if g.is_available() => Some(g),
            Some(_) => {
                info!("Generator unavailable, using rule-based classification only");
                None
            }
            None => {
                info!("Generator disabled, using rule-based classification only");
                None
            }
        };

        reporter.on_classify_start(files.len(), generator.is_some());

        let run = match generator {
            None => self.classify_with_rules(files, reporter),
            Some(generator) => {
                info!(
                    "Generation policy: {}, max calls: {}",
                    self.settings.policy.as_str(),
                    self.settings
                        .max_generation_calls
                        .map_or_else(|| "unbounded".to_string(), |n| n.to_string())
                );
                self.classify_with_generator(files, generator, reporter)
            }
        };

        let duration = start.elapsed();
        reporter.on_classify_complete(run.recommendations.len(), duration.as_secs_f64());
        ClassificationRun { duration, ..run }
    }

    fn classify_with_rules(
        &self,
        files: &[FileDescriptor],
        reporter: &dyn ProgressReporter,
    ) -> ClassificationRun {
        let mut ledger = DecisionLedger::new(files.len(), reporter);
        for file in files {
            ledger.record(&file.path, self.rules_for(file));
        }

        ClassificationRun {
            recommendations: ledger.into_input_order(files, |f| self.rules_for(f)),
            method: ClassificationMethod::RuleBased,
            policy: self.settings.policy,
            max_generation_calls: self.settings.max_generation_calls,
            generation_calls: 0,
            stats: None,
            generator_usage: None,
            duration: Duration::ZERO,
        }
    }

    fn classify_with_generator(
        &self,
        files: &[FileDescriptor],
        generator: &dyn Generator,
        reporter: &dyn ProgressReporter,
    ) -> ClassificationRun {
        let adapter = GenerationAdapter::new(self.settings.deprecation_days, self.now);
        let mut stats = RunStatistics::default();
        let mut generation_calls = 0usize;
        let mut ledger = DecisionLedger::new(files.len(), reporter);

        match self.settings.policy {
            Policy::Exhaustive => {
                for file in files {
                    stats.attempts += 1;
                    generation_calls += 1;
                    let rec = adapter
                        .attempt(file, generator, &mut stats)
                        .unwrap_or_else(|| self.rules_for(file));
                    ledger.record(&file.path, rec);
                }
            }
            Policy::Selective => {
                let mut uncertain: Vec<&FileDescriptor> = Vec::new();
                for file in files {
                    match check_clear_case(file, self.now, &self.settings.core_prefixes) {
                        ClearCase::Clear(decision) => {
                            ledger.record(&file.path, clear_case_recommendation(file, decision))
                        }
                        ClearCase::Uncertain => uncertain.push(file),
                    }
                }
                info!(
                    "{} clear cases, {} files need analysis",
                    files.len() - uncertain.len(),
                    uncertain.len()
                );

                let mut budget_logged = false;
                for file in uncertain {
                    let within_budget = self
                        .settings
                        .max_generation_calls
                        .map_or(true, |max| generation_calls < max);

                    let generated = if within_budget {
                        stats.attempts += 1;
                        generation_calls += 1;
                        adapter.attempt(file, generator, &mut stats)
                    } else {
                        if !budget_logged {
                            info!(
                                "Generation budget of {} calls exhausted, remaining files use rules",
                                generation_calls
                            );
                            budget_logged = true;
                        }
                        None
                    };

                    let rec = generated.unwrap_or_else(|| self.rules_for(file));
                    ledger.record(&file.path, rec);
                }
            }
        }

        if !stats.is_consistent() {
            warn!(
                "Generation stats mismatch: attempts={}, successes={}, fallbacks={}",
                stats.attempts, stats.successes, stats.fallbacks
            );
        }
        info!(
            "Generation: {} attempts, {} successes, {} fallbacks, {} parse failures",
            stats.attempts, stats.successes, stats.fallbacks, stats.parse_failures
        );

        ClassificationRun {
            recommendations: ledger.into_input_order(files, |f| self.rules_for(f)),
            method: ClassificationMethod::GenerationEnhanced,
            policy: self.settings.policy,
            max_generation_calls: self.settings.max_generation_calls,
            generation_calls,
            stats: Some(stats),
            generator_usage: Some(generator.usage_stats()),
            duration: Duration::ZERO,
        }
    }

    fn rules_for(&self, file: &FileDescriptor) -> Recommendation {
        classify_by_rules(
            &file.path,
            &file.kind,
            file.age_days(self.now),
            self.settings.deprecation_days,
        )
    }

    pub fn build_report(
        &self,
        run: ClassificationRun,
        source_index: String,
        scan: Map<String, Value>,
    ) -> ClassificationReport {
        let summary = Summary::from_recommendations(&run.recommendations);
        let generated = run.method == ClassificationMethod::GenerationEnhanced;

        let metadata = RunMetadata {
            source_index,
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            deprecation_days: self.settings.deprecation_days,
            confidence_threshold: self.settings.confidence_threshold,
            classification_method: run.method,
            policy: generated.then_some(run.policy),
            max_generation_calls: if generated {
                run.max_generation_calls
            } else {
                None
            },
            generation_calls: generated.then_some(run.generation_calls),
            generation_stats: run.stats,
            generator_usage: run.generator_usage,
            scan,
        };

        ClassificationReport {
            metadata,
            recommendations: run.recommendations,
            summary,
        }
    }
}

fn clear_case_recommendation(file: &FileDescriptor, decision: LifecycleDecision) -> Recommendation {
    Recommendation {
        path: file.path.clone(),
        decision,
        confidence: CLEAR_CASE_CONFIDENCE,
        reasons: vec![format!("Rule-based clear case: {}", decision)],
        suggested_action: None,
        source: DecisionSource::ClearCase,
    }
}
