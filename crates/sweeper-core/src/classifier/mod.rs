pub mod adapter;
pub mod clear_case;
pub mod extract;
pub mod rules;
pub mod stats;
pub mod types;

pub use adapter::GenerationAdapter;
pub use clear_case::{check_clear_case, ClearCase};
pub use extract::{extract_decision_object, Extraction};
pub use rules::classify_by_rules;
pub use stats::{RunStatistics, Summary};
pub use types::{DecisionSource, LifecycleDecision, Recommendation};
