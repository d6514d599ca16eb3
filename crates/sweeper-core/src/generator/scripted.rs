use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Generator, GeneratorError};

/// One canned outcome of a [`ScriptedGenerator`] call.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Fail(String),
}

/// Generator that replays a fixed script of replies, cycling when exhausted.
///
/// Used by tests and for offline dry runs of the hybrid pipeline.
pub struct ScriptedGenerator {
    replies: Vec<ScriptedReply>,
    available: bool,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies,
            available: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answers with `text`.
    pub fn always(text: &str) -> Self {
        Self::new(vec![ScriptedReply::Text(text.to_string())])
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Generator for ScriptedGenerator {
    fn is_available(&self) -> bool {
        self.available
    }

    fn generate(&self, _prompt: &str, _system_prompt: Option<&str>) -> Result<String, GeneratorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.replies.is_empty() {
            return Ok(String::new());
        }
        match &self.replies[call % self.replies.len()] {
            ScriptedReply::Text(text) => Ok(text.clone()),
            ScriptedReply::Fail(reason) => Err(GeneratorError::Scripted(reason.clone())),
        }
    }

    fn usage_stats(&self) -> serde_json::Value {
        json!({
            "provider": "scripted",
            "total_requests": self.calls(),
            "cost": 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replies_cycle() {
        let generator = ScriptedGenerator::new(vec![
            ScriptedReply::Text("a".to_string()),
            ScriptedReply::Fail("boom".to_string()),
        ]);
        assert_eq!(generator.generate("p", None).unwrap(), "a");
        assert!(matches!(
            generator.generate("p", None),
            Err(GeneratorError::Scripted(_))
        ));
        assert_eq!(generator.generate("p", Some("s")).unwrap(), "a");
        assert_eq!(generator.calls(), 3);
        assert_eq!(generator.usage_stats()["total_requests"], 3);
    }

    #[test]
    fn empty_script_answers_blank() {
        let generator = ScriptedGenerator::new(vec![]);
        assert_eq!(generator.generate("p", None).unwrap(), "");
    }

    #[test]
    fn unavailable_flag() {
        assert!(!ScriptedGenerator::always("{}").unavailable().is_available());
    }
}
