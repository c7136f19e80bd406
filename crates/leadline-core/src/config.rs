use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{LeadlineError, Result};

/// Top-level configuration for the Leadline assistant.
///
/// Loaded from `~/.leadline/config.toml` by default. Every section is
/// optional; missing sections and fields fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadlineConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl LeadlineConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LeadlineConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| LeadlineError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Apply environment overrides that take precedence over the file.
    ///
    /// Currently only `OLLAMA_API_URL` is honoured.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("OLLAMA_API_URL") {
            if !url.trim().is_empty() {
                self.llm.api_url = url.trim().to_string();
            }
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the SQLite database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Address the HTTP server binds to.
    pub bind_address: String,
    /// HTTP listen port.
    pub port: u16,
    /// Name the assistant introduces itself with.
    pub assistant_name: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.leadline/data".to_string(),
            log_level: "info".to_string(),
            bind_address: "127.0.0.1".to_string(),
            port: 5000,
            assistant_name: "Ava".to_string(),
        }
    }
}

/// Knowledge base source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Path to a company data JSON file. The bundled dataset is used when unset.
    pub path: Option<String>,
}

/// Chat-completion endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_url: String,
    pub model: String,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    /// Total attempts per call, including the first.
    pub max_attempts: u32,
    /// First retry delay; doubles on every further retry.
    pub backoff_base_ms: u64,
    /// Request NDJSON streaming from the direct-completion backend.
    pub stream: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:11434/api/chat".to_string(),
            model: "vicuna:7b".to_string(),
            connect_timeout_secs: 5,
            read_timeout_secs: 30,
            max_attempts: 3,
            backoff_base_ms: 500,
            stream: false,
        }
    }
}

/// Sliding-window throttle for outbound model calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_calls: usize,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: 100,
            window_secs: 3600,
        }
    }
}

/// Embedding provider used for knowledge retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// "hash" (local, deterministic) or "ollama".
    pub provider: String,
    pub api_url: String,
    pub model: String,
    pub dimensions: usize,
    /// Fragments retrieved per query.
    pub top_k: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "hash".to_string(),
            api_url: "http://localhost:11434/api/embeddings".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 256,
            top_k: 2,
        }
    }
}

/// Dialogue behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Message the widget sends when a visitor opens the chat.
    pub session_start_sentinel: String,
    pub max_message_length: usize,
    /// Generated replies longer than this are cut at a sentence boundary.
    /// Zero disables truncation.
    pub max_response_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            session_start_sentinel: "START_CHAT".to_string(),
            max_message_length: 2000,
            max_response_chars: 150,
        }
    }
}

/// Where completed leads are announced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
}
