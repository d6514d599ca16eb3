use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle stage assigned to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleDecision {
    Keep,
    Archive,
    Delete,
    Review,
}

impl LifecycleDecision {
    pub const ALL: [LifecycleDecision; 4] = [
        LifecycleDecision::Keep,
        LifecycleDecision::Review,
        LifecycleDecision::Archive,
        LifecycleDecision::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleDecision::Keep => "keep",
            LifecycleDecision::Archive => "archive",
            LifecycleDecision::Delete => "delete",
            LifecycleDecision::Review => "review",
        }
    }

    /// Parse a label leniently (surrounding whitespace and case are ignored).
    pub fn parse(label: &str) -> Option<LifecycleDecision> {
        match label.trim().to_ascii_lowercase().as_str() {
            "keep" => Some(LifecycleDecision::Keep),
            "archive" => Some(LifecycleDecision::Archive),
            "delete" => Some(LifecycleDecision::Delete),
            "review" => Some(LifecycleDecision::Review),
            _ => None,
        }
    }

    /// delete > archive > review > keep.
    pub fn severity(&self) -> u8 {
        match self {
            LifecycleDecision::Keep => 0,
            LifecycleDecision::Review => 1,
            LifecycleDecision::Archive => 2,
            LifecycleDecision::Delete => 3,
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.severity() >= LifecycleDecision::Archive.severity()
    }
}

impl fmt::Display for LifecycleDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which path through the engine produced a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    ClearCase,
    Generated,
    Rules,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub path: String,
    pub decision: LifecycleDecision,
    pub confidence: f64,
    pub reasons: Vec<String>,
    pub suggested_action: Option<String>,
    pub source: DecisionSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_lenient_about_case_and_whitespace() {
        assert_eq!(LifecycleDecision::parse(" Archive\n"), Some(LifecycleDecision::Archive));
        assert_eq!(LifecycleDecision::parse("DELETE"), Some(LifecycleDecision::Delete));
        assert_eq!(LifecycleDecision::parse("remove"), None);
    }

    #[test]
    fn destructiveness_order() {
        use LifecycleDecision::*;
        assert!(Delete.severity() > Archive.severity());
        assert!(Archive.severity() > Review.severity());
        assert!(Review.severity() > Keep.severity());
        assert!(Delete.is_destructive() && Archive.is_destructive());
        assert!(!Review.is_destructive() && !Keep.is_destructive());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&LifecycleDecision::Review).unwrap();
        assert_eq!(json, "\"review\"");
        let json = serde_json::to_string(&DecisionSource::ClearCase).unwrap();
        assert_eq!(json, "\"clear_case\"");
    }
}
