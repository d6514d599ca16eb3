use serde::{Deserialize, Serialize};

use super::types::{LifecycleDecision, Recommendation};

/// Counters for one classification run. Owned by a single orchestrator call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub attempts: u64,
    pub successes: u64,
    pub fallbacks: u64,
    pub parse_attempts: u64,
    pub parse_successes: u64,
    pub parse_failures: u64,
}

impl RunStatistics {
    /// Every generation attempt ends as exactly one success or one fallback.
    pub fn is_consistent(&self) -> bool {
        self.attempts == self.successes + self.fallbacks
    }

    /// Share of extraction attempts that yielded a decision object.
    pub fn parse_success_rate(&self) -> Option<f64> {
        ratio(self.parse_successes, self.parse_attempts)
    }

    /// Share of generation attempts that ended on the rules.
    pub fn fallback_rate(&self) -> Option<f64> {
        ratio(self.fallbacks, self.attempts)
    }
}

fn ratio(part: u64, whole: u64) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionCounts {
    pub keep: usize,
    pub archive: usize,
    pub delete: usize,
    pub review: usize,
}

impl DecisionCounts {
    pub fn get(&self, decision: LifecycleDecision) -> usize {
        match decision {
            LifecycleDecision::Keep => self.keep,
            LifecycleDecision::Archive => self.archive,
            LifecycleDecision::Delete => self.delete,
            LifecycleDecision::Review => self.review,
        }
    }

    fn increment(&mut self, decision: LifecycleDecision) {
        match decision {
            LifecycleDecision::Keep => self.keep += 1,
            LifecycleDecision::Archive => self.archive += 1,
            LifecycleDecision::Delete => self.delete += 1,
            LifecycleDecision::Review => self.review += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.keep + self.archive + self.delete + self.review
    }
}

/// high >= 0.8, medium in [0.6, 0.8), low < 0.6
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceHistogram {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_files: usize,
    pub by_decision: DecisionCounts,
    pub confidence_distribution: ConfidenceHistogram,
}

impl Summary {
    pub fn from_recommendations(recommendations: &[Recommendation]) -> Summary {
        let mut by_decision = DecisionCounts::default();
        let mut histogram = ConfidenceHistogram::default();

        for rec in recommendations {
            by_decision.increment(rec.decision);
            if rec.confidence >= 0.8 {
                histogram.high += 1;
            } else if rec.confidence >= 0.6 {
                histogram.medium += 1;
            } else {
                histogram.low += 1;
            }
        }

        Summary {
            total_files: recommendations.len(),
            by_decision,
            confidence_distribution: histogram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::types::DecisionSource;

    fn rec(decision: LifecycleDecision, confidence: f64) -> Recommendation {
        Recommendation {
            path: "f".to_string(),
            decision,
            confidence,
            reasons: vec![],
            suggested_action: None,
            source: DecisionSource::Rules,
        }
    }

    #[test]
    fn consistency_check() {
        let mut stats = RunStatistics::default();
        assert!(stats.is_consistent());
        stats.attempts = 3;
        stats.successes = 2;
        assert!(!stats.is_consistent());
        stats.fallbacks = 1;
        assert!(stats.is_consistent());
    }

    #[test]
    fn rates_need_attempts() {
        let mut stats = RunStatistics::default();
        assert_eq!(stats.parse_success_rate(), None);
        assert_eq!(stats.fallback_rate(), None);

        stats.attempts = 4;
        stats.successes = 3;
        stats.fallbacks = 1;
        stats.parse_attempts = 4;
        stats.parse_successes = 3;
        stats.parse_failures = 1;
        assert_eq!(stats.parse_success_rate(), Some(0.75));
        assert_eq!(stats.fallback_rate(), Some(0.25));
    }

    #[test]
    fn summary_buckets_on_boundaries() {
        let recs = vec![
            rec(LifecycleDecision::Keep, 0.8),
            rec(LifecycleDecision::Review, 0.6),
            rec(LifecycleDecision::Review, 0.79),
            rec(LifecycleDecision::Archive, 0.59),
            rec(LifecycleDecision::Delete, 1.0),
        ];
        let summary = Summary::from_recommendations(&recs);
        assert_eq!(summary.total_files, 5);
        assert_eq!(summary.by_decision.review, 2);
        assert_eq!(summary.by_decision.get(LifecycleDecision::Delete), 1);
        assert_eq!(summary.by_decision.total(), summary.total_files);
        assert_eq!(
            summary.confidence_distribution,
            ConfidenceHistogram {
                high: 2,
                medium: 2,
                low: 1
            }
        );
    }

    #[test]
    fn empty_summary() {
        let summary = Summary::from_recommendations(&[]);
        assert_eq!(summary.total_files, 0);
        assert_eq!(summary.by_decision.total(), 0);
    }
}
