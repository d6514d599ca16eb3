use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Error;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub scan: ScanSettings,
    pub output: OutputSettings,
    pub classifier: ClassifierSettings,
    pub generator: GeneratorSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Repository root; descriptor paths are relative to it.
    pub root: String,
    /// Directories under `root` to walk.
    pub include_paths: Vec<String>,
    /// Glob patterns matched against root-relative paths.
    pub ignore_patterns: Vec<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            include_paths: vec![".".to_string()],
            ignore_patterns: vec![
                ".git".to_string(),
                "target".to_string(),
                "node_modules".to_string(),
                "logs".to_string(),
                "**/__pycache__".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    pub index_path: String,
    pub recommendations_path: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            index_path: "data/sweeper/repo_index.json".to_string(),
            recommendations_path: "data/sweeper/lifecycle_recommendations.json".to_string(),
        }
    }
}

/// How the orchestrator spends generator calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Ask the generator about every file.
    #[default]
    Exhaustive,
    /// Resolve clear cases from metadata, ask the generator about the rest up to a budget.
    Selective,
}

impl Policy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::Exhaustive => "exhaustive",
            Policy::Selective => "selective",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub deprecation_days: u32,
    /// Recorded in run metadata; no decision branch reads it.
    pub confidence_threshold: f64,
    pub use_generator: bool,
    pub policy: Policy,
    pub max_generation_calls: Option<usize>,
    /// Path prefixes of actively maintained code, used by the clear-case filter.
    pub core_prefixes: Vec<String>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            deprecation_days: 90,
            confidence_threshold: 0.7,
            use_generator: false,
            policy: Policy::Exhaustive,
            max_generation_calls: None,
            core_prefixes: ["src/", "lib/", "crates/", "scripts/", "tests/"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Ollama,
    LmStudio,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::LmStudio => "lm_studio",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderSettings {
    pub provider: ProviderKind,
    pub base_url: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Lower number wins.
    #[serde(default = "default_priority")]
    pub priority: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_priority() -> u32 {
    1
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub providers: Vec<ProviderSettings>,
    pub timeout_secs: u64,
    pub health_timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
    pub default_model: String,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            providers: vec![
                ProviderSettings {
                    provider: ProviderKind::Ollama,
                    base_url: "http://localhost:11434".to_string(),
                    model: None,
                    priority: 1,
                    enabled: true,
                },
                ProviderSettings {
                    provider: ProviderKind::LmStudio,
                    base_url: "http://localhost:1234".to_string(),
                    model: None,
                    priority: 2,
                    enabled: true,
                },
            ],
            timeout_secs: 60,
            health_timeout_secs: 3,
            temperature: 0.1,
            max_tokens: 500,
            default_model: "qwen3:8b".to_string(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), Error> {
        let c = &self.classifier;
        if c.deprecation_days == 0 {
            return Err(Error::InvalidConfig(
                "classifier.deprecation_days must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&c.confidence_threshold) {
            return Err(Error::InvalidConfig(format!(
                "classifier.confidence_threshold must be within [0, 1], got {}",
                c.confidence_threshold
            )));
        }
        if c.max_generation_calls == Some(0) {
            return Err(Error::InvalidConfig(
                "classifier.max_generation_calls must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load `Sweeper.toml` (optional) overlaid with `SWEEPER__SECTION__KEY` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    load_configuration_from("Sweeper")
}

pub fn load_configuration_from(name: &str) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name(name).required(false))
        .add_source(
            Environment::with_prefix("SWEEPER")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Remove directories that are subdirectories of other directories in the list.
pub fn non_overlapping_directories(dirs: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();

    for dir in dirs {
        let dir_path = Path::new(&dir);
        let mut should_add = true;
        let result_clone = result.clone();

        for res_dir in &result_clone {
            let res_dir_path = Path::new(res_dir);

            if dir_path.starts_with(res_dir_path) {
                should_add = false;
                break;
            }

            if res_dir_path.starts_with(dir_path) {
                result.retain(|x| x != res_dir);
            }
        }

        if should_add {
            result.push(dir);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_overlapping_no_overlap() {
        let dirs = vec!["src".to_string(), "docs".to_string(), "scripts".to_string()];
        let result = non_overlapping_directories(dirs);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_non_overlapping_with_subdirectory() {
        let dirs = vec![
            "src".to_string(),
            "src/classifier".to_string(),
            "docs".to_string(),
        ];
        let result = non_overlapping_directories(dirs);
        assert_eq!(result, vec!["src".to_string(), "docs".to_string()]);
    }

    #[test]
    fn test_non_overlapping_parent_after_children() {
        let dirs = vec![
            "src/a".to_string(),
            "src/b".to_string(),
            "src".to_string(),
        ];
        let result = non_overlapping_directories(dirs);
        assert_eq!(result, vec!["src".to_string()]);
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.classifier.deprecation_days, 90);
        assert_eq!(config.classifier.policy, Policy::Exhaustive);
        assert!(config.classifier.max_generation_calls.is_none());
        assert_eq!(config.generator.providers.len(), 2);
    }

    #[test]
    fn test_validate_rejects_zero_deprecation_days() {
        let mut config = AppConfig::default();
        config.classifier.deprecation_days = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_threshold_out_of_range() {
        let mut config = AppConfig::default();
        config.classifier.confidence_threshold = 1.5;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut config = AppConfig::default();
        config.classifier.max_generation_calls = Some(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[classifier]
deprecation_days = 30
policy = "selective"
max_generation_calls = 25

[[generator.providers]]
provider = "lm_studio"
base_url = "http://127.0.0.1:1234"
priority = 3
"#,
        )
        .unwrap();

        let name = path.with_extension("");
        let config = load_configuration_from(name.to_str().unwrap()).unwrap();
        assert_eq!(config.classifier.deprecation_days, 30);
        assert_eq!(config.classifier.policy, Policy::Selective);
        assert_eq!(config.classifier.max_generation_calls, Some(25));
        assert_eq!(config.classifier.confidence_threshold, 0.7);
        assert_eq!(config.generator.providers.len(), 1);
        assert_eq!(config.generator.providers[0].provider, ProviderKind::LmStudio);
        assert!(config.generator.providers[0].enabled);
        assert_eq!(config.output.index_path, "data/sweeper/repo_index.json");
    }
}
