use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{Generator, GeneratorError};
use crate::config::{GeneratorSettings, ProviderKind, ProviderSettings};

/// Multi-provider client for locally hosted models (Ollama, LM Studio).
///
/// Providers are probed in priority order when connecting; the first healthy one
/// becomes active and serves every request of the run.
pub struct LocalGenerator {
    settings: GeneratorSettings,
    active: Option<ProviderSettings>,
    client: reqwest::blocking::Client,
    health_client: reqwest::blocking::Client,
    request_count: AtomicU64,
    total_tokens: AtomicU64,
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    response: String,
}

/// Request body for the OpenAI-compatible /v1/chat/completions served by LM Studio
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: String,
}

impl LocalGenerator {
    /// Build the client without probing any provider.
    pub fn new(settings: GeneratorSettings) -> Result<Self, GeneratorError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| GeneratorError::Connection(e.to_string()))?;
        let health_client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.health_timeout_secs))
            .build()
            .map_err(|e| GeneratorError::Connection(e.to_string()))?;

        let settings = GeneratorSettings {
            providers: settings
                .providers
                .into_iter()
                .map(|mut p| {
                    p.base_url = p.base_url.trim_end_matches('/').to_string();
                    p
                })
                .collect(),
            ..settings
        };

        Ok(Self {
            settings,
            active: None,
            client,
            health_client,
            request_count: AtomicU64::new(0),
            total_tokens: AtomicU64::new(0),
        })
    }

    /// Build the client and activate the first healthy provider.
    pub fn connect(settings: GeneratorSettings) -> Result<Self, GeneratorError> {
        let mut generator = Self::new(settings)?;
        generator.select_active_provider();
        Ok(generator)
    }

    /// Enabled providers, highest priority (lowest number) first.
    pub fn candidates(&self) -> Vec<&ProviderSettings> {
        let mut candidates: Vec<&ProviderSettings> =
            self.settings.providers.iter().filter(|p| p.enabled).collect();
        candidates.sort_by_key(|p| p.priority);
        candidates
    }

    pub fn active_provider(&self) -> Option<&ProviderSettings> {
        self.active.as_ref()
    }

    fn select_active_provider(&mut self) {
        let selected = self
            .candidates()
            .into_iter()
            .find(|provider| self.check_provider_health(provider))
            .cloned();

        match &selected {
            Some(provider) => info!(
                "Active generation provider: {} ({}, model={})",
                provider.provider.as_str(),
                provider.base_url,
                self.model_for(provider)
            ),
            None => warn!("No available generation provider found"),
        }
        self.active = selected;
    }

    fn check_provider_health(&self, provider: &ProviderSettings) -> bool {
        let url = match provider.provider {
            ProviderKind::Ollama => format!("{}/api/tags", provider.base_url),
            ProviderKind::LmStudio => format!("{}/v1/models", provider.base_url),
        };
        match self.health_client.get(&url).send() {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("Health check failed for {}: {}", url, e);
                false
            }
        }
    }

    fn model_for<'a>(&'a self, provider: &'a ProviderSettings) -> &'a str {
        provider
            .model
            .as_deref()
            .unwrap_or(self.settings.default_model.as_str())
    }

    fn map_send_error(&self, e: reqwest::Error, base_url: &str) -> GeneratorError {
        if e.is_connect() {
            GeneratorError::Connection(base_url.to_string())
        } else if e.is_timeout() {
            GeneratorError::Timeout(self.settings.timeout_secs)
        } else {
            GeneratorError::Response(e.to_string())
        }
    }

    fn generate_ollama(
        &self,
        provider: &ProviderSettings,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, GeneratorError> {
        let url = format!("{}/api/generate", provider.base_url);
        let body = OllamaGenerateRequest {
            model: self.model_for(provider),
            prompt,
            system: system_prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.settings.temperature,
                num_predict: self.settings.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e, &provider.base_url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GeneratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| GeneratorError::Response(e.to_string()))?;
        Ok(parsed.response)
    }

    fn generate_lm_studio(
        &self,
        provider: &ProviderSettings,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, GeneratorError> {
        let url = format!("{}/v1/chat/completions", provider.base_url);
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });
        let body = ChatCompletionRequest {
            model: self.model_for(provider),
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e, &provider.base_url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GeneratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .map_err(|e| GeneratorError::Response(e.to_string()))?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default())
    }

    fn record_usage(&self, prompt: &str, text: &str) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        // roughly four characters per token
        let tokens = ((prompt.len() + text.len()) / 4) as u64;
        self.total_tokens.fetch_add(tokens, Ordering::Relaxed);
    }
}

impl Generator for LocalGenerator {
    fn is_available(&self) -> bool {
        self.active.is_some()
    }

    fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String, GeneratorError> {
        let provider = self.active.as_ref().ok_or(GeneratorError::Unavailable)?;

        let result = match provider.provider {
            ProviderKind::Ollama => self.generate_ollama(provider, prompt, system_prompt),
            ProviderKind::LmStudio => self.generate_lm_studio(provider, prompt, system_prompt),
        };

        match &result {
            Ok(text) => self.record_usage(prompt, text),
            Err(e) => debug!("{} generate error: {}", provider.provider.as_str(), e),
        }
        result
    }

    fn usage_stats(&self) -> serde_json::Value {
        let active = self.active.as_ref();
        json!({
            "total_requests": self.request_count.load(Ordering::Relaxed),
            "estimated_total_tokens": self.total_tokens.load(Ordering::Relaxed),
            "cost": 0.0,
            "provider": active.map(|p| p.provider.as_str()),
            "base_url": active.map(|p| p.base_url.as_str()),
            "model": active.map(|p| self.model_for(p)),
        })
    }
}
