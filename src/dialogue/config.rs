//! Configuration for the dialogue subsystem.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::dialogue::errors::{DialogueError, DialogueResult};

/// Seed instruction inherited from the original deployment.
pub const DEFAULT_SEED_PROMPT: &str = "你是一位有用的助手。回答問題使用正體中文，勿使用簡體字";

/// Top-level configuration for the dialogue pipeline.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Storage settings.
    pub storage: StorageConfig,
    /// Retention window settings.
    pub window: WindowConfig,
    /// Completion model settings.
    pub llm: LlmConfig,
}

impl DialogueConfig {
    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> DialogueResult<()> {
        if self.window.tail == 0 {
            return Err(DialogueError::InvalidConfig(
                "window.tail must be > 0".to_string(),
            ));
        }

        if self.window.prune_threshold < self.window.tail + 1 {
            return Err(DialogueError::InvalidConfig(
                "window.prune_threshold must be >= window.tail + 1".to_string(),
            ));
        }

        if self.storage.seed_prompt.trim().is_empty() {
            return Err(DialogueError::InvalidConfig(
                "storage.seed_prompt must not be empty".to_string(),
            ));
        }

        if self.llm.model.is_empty() {
            return Err(DialogueError::InvalidConfig(
                "llm.model must not be empty".to_string(),
            ));
        }

        Url::parse(&self.llm.base_url)?;

        Ok(())
    }
}

/// Storage settings for the dialogue log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the `SQLite` database file.
    pub sqlite_path: PathBuf,
    /// Table name for the dialogue log.
    pub table: String,
    /// System instruction seeded into every new conversation.
    pub seed_prompt: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("dialogues.db"),
            table: "dialogues".to_string(),
            seed_prompt: DEFAULT_SEED_PROMPT.to_string(),
        }
    }
}

/// Retention window settings.
///
/// The defaults reproduce the original deployment's tuning: once a
/// conversation holds more than `prune_threshold` records, everything but
/// the seed and the `tail` most recent records is deleted, capping each
/// partition at `tail + 1` rows.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Number of most-recent records sent after the seed.
    pub tail: usize,
    /// Record count above which pruning runs.
    pub prune_threshold: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            tail: 7,
            prune_threshold: 11,
        }
    }
}

/// Completion model settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible endpoint.
    pub base_url: String,
    /// Model name to request.
    pub model: String,
    /// API key for bearer auth.
    pub api_key: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key: String::new(),
            timeout_seconds: 60,
        }
    }
}
