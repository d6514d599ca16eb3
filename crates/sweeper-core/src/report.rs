use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::classifier::{LifecycleDecision, Recommendation, RunStatistics, Summary};
use crate::config::Policy;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassificationMethod {
    #[serde(rename = "rule-based")]
    RuleBased,
    #[serde(rename = "generation-enhanced")]
    GenerationEnhanced,
}

impl ClassificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationMethod::RuleBased => "rule-based",
            ClassificationMethod::GenerationEnhanced => "generation-enhanced",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub source_index: String,
    pub generated_at: String,
    pub deprecation_days: u32,
    pub confidence_threshold: f64,
    pub classification_method: ClassificationMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<Policy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_generation_calls: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_calls: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_stats: Option<RunStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator_usage: Option<Value>,
    /// Scanner metadata carried over from the repository index.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub scan: Map<String, Value>,
}

/// The three-section payload written after a classification run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub metadata: RunMetadata,
    pub recommendations: Vec<Recommendation>,
    pub summary: Summary,
}

impl ClassificationReport {
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<ClassificationReport, Error> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Count and percentage of total per decision, in keep, review, archive, delete order.
    pub fn decision_shares(&self) -> Vec<(LifecycleDecision, usize, f64)> {
        let total = self.summary.total_files;
        LifecycleDecision::ALL
            .iter()
            .map(|&decision| {
                let count = self.summary.by_decision.get(decision);
                let percent = if total > 0 {
                    count as f64 * 100.0 / total as f64
                } else {
                    0.0
                };
                (decision, count, percent)
            })
            .collect()
    }

    /// Recommendations carrying `decision`, in report order.
    pub fn files_with(&self, decision: LifecycleDecision) -> Vec<&Recommendation> {
        self.recommendations
            .iter()
            .filter(|rec| rec.decision == decision)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::DecisionSource;

    fn report(method: ClassificationMethod) -> ClassificationReport {
        let recommendations = vec![Recommendation {
            path: "src/a.py".to_string(),
            decision: LifecycleDecision::Keep,
            confidence: 0.9,
            reasons: vec!["Recently modified (2 days ago)".to_string()],
            suggested_action: None,
            source: DecisionSource::Rules,
        }];
        let summary = Summary::from_recommendations(&recommendations);
        ClassificationReport {
            metadata: RunMetadata {
                source_index: "data/repo_index.json".to_string(),
                generated_at: "2024-01-01T00:00:00Z".to_string(),
                deprecation_days: 90,
                confidence_threshold: 0.7,
                classification_method: method,
                policy: None,
                max_generation_calls: None,
                generation_calls: None,
                generation_stats: None,
                generator_usage: None,
                scan: Map::new(),
            },
            recommendations,
            summary,
        }
    }

    #[test]
    fn top_level_sections() {
        let value: Value =
            serde_json::from_str(&report(ClassificationMethod::RuleBased).to_json().unwrap()).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(value["metadata"]["classification_method"], "rule-based");
        assert!(value["metadata"].get("generation_stats").is_none());
        assert!(value["metadata"].get("scan").is_none());
        assert_eq!(value["recommendations"][0]["decision"], "keep");
        assert!(value["recommendations"][0]["suggested_action"].is_null());
        assert_eq!(value["summary"]["by_decision"]["keep"], 1);
        assert_eq!(value["summary"]["confidence_distribution"]["high"], 1);
    }

    #[test]
    fn shares_and_review_listing() {
        let mut report = report(ClassificationMethod::RuleBased);
        report.recommendations.push(Recommendation {
            path: "docs/old.md".to_string(),
            decision: LifecycleDecision::Review,
            confidence: 0.6,
            reasons: vec!["Reaches deprecation threshold (90 days)".to_string()],
            suggested_action: None,
            source: DecisionSource::Rules,
        });
        report.summary = Summary::from_recommendations(&report.recommendations);

        let shares = report.decision_shares();
        let order: Vec<LifecycleDecision> = shares.iter().map(|(d, _, _)| *d).collect();
        assert_eq!(order, LifecycleDecision::ALL.to_vec());
        assert_eq!(shares[0], (LifecycleDecision::Keep, 1, 50.0));
        assert_eq!(shares[1], (LifecycleDecision::Review, 1, 50.0));
        assert_eq!(shares[3].1, 0);

        let review = report.files_with(LifecycleDecision::Review);
        assert_eq!(review.len(), 1);
        assert_eq!(review[0].path, "docs/old.md");
        assert!(report.files_with(LifecycleDecision::Delete).is_empty());
    }

    #[test]
    fn empty_report_has_zero_shares() {
        let mut report = report(ClassificationMethod::RuleBased);
        report.recommendations.clear();
        report.summary = Summary::default();
        assert!(report.decision_shares().iter().all(|(_, n, pct)| *n == 0 && *pct == 0.0));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("recs.json");
        let original = report(ClassificationMethod::GenerationEnhanced);
        original.save(&path).unwrap();
        let loaded = ClassificationReport::load(&path).unwrap();
        assert_eq!(loaded, original);
    }
}
