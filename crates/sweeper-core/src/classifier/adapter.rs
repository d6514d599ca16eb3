use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::extract::{extract_decision_object, Extraction};
use super::stats::RunStatistics;
use super::types::{DecisionSource, LifecycleDecision, Recommendation};
use crate::generator::Generator;
use crate::index::FileDescriptor;

/// Generated archive/delete decisions below this confidence are downgraded to review.
pub const SAFETY_GATE_CONFIDENCE: f64 = 0.6;

/// Used when the generator omits the confidence or sends something non-numeric.
pub const DEFAULT_CONFIDENCE: f64 = 0.7;

pub const SYSTEM_PROMPT: &str = r#"You are a senior software engineer specializing in repository hygiene and lifecycle management. Your task is to classify files in a large codebase.

STRICT OUTPUT RULES:
1. You MUST output EXACTLY ONE JSON object.
2. Do NOT include markdown, explanations, comments, or multiple JSON blocks.
3. The JSON keys MUST be exactly: "decision", "confidence", "reasons", "suggested_action".
4. "decision" MUST be one of: "keep", "review", "archive", "delete".
5. "confidence" MUST be a float between 0.0 and 1.0.
6. "reasons" MUST be a short list of human-readable strings.
7. "suggested_action" MUST be a short string or null.
8. If you are uncertain, prefer "review" with a medium confidence.
"#;

/// Build the per-file user prompt.
pub fn build_user_prompt(file: &FileDescriptor, age_days: f64, deprecation_days: u32) -> String {
    format!(
        r#"Analyze the following file and decide its lifecycle status in the repository.

File information:
- Path: {path}
- Kind: {kind}
- Size: {size} bytes
- Age: {age} days since last modification
- Deprecation threshold: {deprecation_days} days

Decision labels:
1. "keep"    - Active and should remain in place.
2. "review"  - Potentially deprecated or unclear; needs human review.
3. "archive" - Historical or rarely used; move to archive but do not delete.
4. "delete"  - Temporary, backup, or clearly obsolete; safe to remove.

Important considerations:
- Be conservative. When in doubt between "delete" and "review", choose "review".
- For very old files beyond the deprecation threshold, "review" or "archive" are preferred.
- For recently modified core code files, "keep" is usually correct.

Respond with EXACTLY ONE JSON object, and NOTHING ELSE."#,
        path = file.path,
        kind = file.kind,
        size = file.size_bytes,
        age = age_days as i64,
        deprecation_days = deprecation_days,
    )
}

/// Turns one file into a validated recommendation via a generator, or `None` so the
/// caller falls back to the rules.
pub struct GenerationAdapter {
    deprecation_days: u32,
    now: f64,
}

impl GenerationAdapter {
    pub fn new(deprecation_days: u32, now: f64) -> Self {
        Self {
            deprecation_days,
            now,
        }
    }

    /// Ask the generator about `file`. Updates every counter except `attempts`,
    /// which belongs to the caller.
    pub fn attempt(
        &self,
        file: &FileDescriptor,
        generator: &dyn Generator,
        stats: &mut RunStatistics,
    ) -> Option<Recommendation> {
        let age_days = file.age_days(self.now);
        let prompt = build_user_prompt(file, age_days, self.deprecation_days);

        let response = match generator.generate(&prompt, Some(SYSTEM_PROMPT)) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                debug!("Empty generator response for {}", file.path);
                stats.fallbacks += 1;
                return None;
            }
            Err(e) => {
                warn!("Generator call failed for {}: {}", file.path, e);
                stats.fallbacks += 1;
                return None;
            }
        };

        stats.parse_attempts += 1;
        let fields = match extract_decision_object(&response) {
            Extraction::Parsed(fields) => fields,
            Extraction::Failed(reason) => {
                debug!("Could not extract a decision for {}: {:?}", file.path, reason);
                stats.parse_failures += 1;
                stats.fallbacks += 1;
                return None;
            }
        };

        stats.parse_successes += 1;
        stats.successes += 1;
        Some(recommendation_from_fields(&file.path, &fields))
    }
}

/// Validate and coerce extracted fields, then apply the safety gate.
pub fn recommendation_from_fields(path: &str, fields: &Map<String, Value>) -> Recommendation {
    let decision = fields
        .get("decision")
        .or_else(|| fields.get("recommendation"))
        .and_then(Value::as_str)
        .and_then(LifecycleDecision::parse)
        .unwrap_or(LifecycleDecision::Review);

    let confidence = fields
        .get("confidence")
        .and_then(coerce_confidence)
        .unwrap_or(DEFAULT_CONFIDENCE)
        .clamp(0.0, 1.0);

    let reasons = coerce_reasons(fields.get("reasons"));
    let suggested_action = fields.get("suggested_action").and_then(coerce_action);

    let decision = if decision.is_destructive() && confidence < SAFETY_GATE_CONFIDENCE {
        debug!(
            "Downgrading {} to review for {} (confidence {:.2})",
            decision, path, confidence
        );
        LifecycleDecision::Review
    } else {
        decision
    };

    Recommendation {
        path: path.to_string(),
        decision,
        confidence,
        reasons,
        suggested_action,
        source: DecisionSource::Generated,
    }
}

fn coerce_confidence(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn coerce_reasons(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(value_to_text).collect(),
        Some(Value::String(s)) if s.is_empty() => Vec::new(),
        Some(other) => vec![value_to_text(other)],
    }
}

fn coerce_action(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(value_to_text(other)),
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
