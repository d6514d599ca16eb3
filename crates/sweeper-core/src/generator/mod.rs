pub mod local;
pub mod scripted;

use thiserror::Error;

pub use local::LocalGenerator;
pub use scripted::{ScriptedGenerator, ScriptedReply};

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("No generation provider is available")]
    Unavailable,

    #[error("Cannot connect to {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unreadable provider response: {0}")]
    Response(String),

    #[error("Scripted failure: {0}")]
    Scripted(String),
}

/// Text generation capability consulted for files the rules cannot settle cheaply.
///
/// Implementations enforce their own timeouts. An `Err` or an empty string both mean
/// "no answer"; callers fall back to rule-based classification.
pub trait Generator: Send + Sync {
    /// Health probe, consulted once before a run.
    fn is_available(&self) -> bool;

    fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String, GeneratorError>;

    /// Opaque usage counters, copied into run metadata.
    fn usage_stats(&self) -> serde_json::Value;
}
