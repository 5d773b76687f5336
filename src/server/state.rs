//! Application state shared across request handlers.

use std::sync::Arc;

use crate::dialogue::config::{DEFAULT_SEED_PROMPT, DialogueConfig};
use crate::dialogue::errors::{DialogueError, DialogueResult};
use crate::dialogue::orchestrator::DialogueOrchestrator;
use crate::dialogue::store::{DialogueStore, SqliteDialogueStore};
use crate::llm::chat::{CompletionBackend, OpenAiChat};
use crate::platform::client::{DEFAULT_API_URL, LineReplyClient, ReplyClient};

/// Shared application state.
pub struct AppState {
    /// Webhook signing secret.
    pub channel_secret: String,
    /// Turn orchestrator over the store and completion backend.
    pub orchestrator: DialogueOrchestrator,
    /// Platform reply client.
    pub reply_client: Arc<dyn ReplyClient>,
}

impl AppState {
    /// Assemble state from explicit collaborators.
    #[must_use]
    pub fn new(
        channel_secret: impl Into<String>,
        store: Arc<dyn DialogueStore>,
        backend: Arc<dyn CompletionBackend>,
        reply_client: Arc<dyn ReplyClient>,
    ) -> Arc<Self> {
        Arc::new(Self {
            channel_secret: channel_secret.into(),
            orchestrator: DialogueOrchestrator::new(store, backend),
            reply_client,
        })
    }

    /// Build production state from the process environment.
    ///
    /// # Errors
    /// Returns an error if a required secret is missing, the configuration
    /// is invalid, or the store cannot be opened.
    pub async fn from_env() -> DialogueResult<Arc<Self>> {
        let access_token = require_env("RELAY_ACCESS_TOKEN")?;
        let channel_secret = require_env("RELAY_CHANNEL_SECRET")?;

        let mut config = DialogueConfig::default();
        config.llm.api_key = require_env("OPENAI_API_KEY")?;
        if let Ok(path) = std::env::var("RELAY_DB_PATH") {
            config.storage.sqlite_path = path.into();
        }
        if let Ok(model) = std::env::var("RELAY_MODEL") {
            config.llm.model = model;
        }
        if let Ok(base_url) = std::env::var("RELAY_OPENAI_URL") {
            config.llm.base_url = base_url;
        }
        config.storage.seed_prompt =
            std::env::var("RELAY_SEED_PROMPT").unwrap_or_else(|_| DEFAULT_SEED_PROMPT.to_string());
        config.validate()?;

        let store = SqliteDialogueStore::new(&config.storage, config.window).await?;
        let backend = OpenAiChat::new(&config.llm)?;
        let api_url =
            std::env::var("RELAY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let reply_client = LineReplyClient::new(&api_url, &access_token)?;

        Ok(Self::new(
            channel_secret,
            Arc::new(store),
            Arc::new(backend),
            Arc::new(reply_client),
        ))
    }
}

fn require_env(name: &str) -> DialogueResult<String> {
    std::env::var(name).map_err(|_| DialogueError::InvalidConfig(format!("{name} must be set")))
}
