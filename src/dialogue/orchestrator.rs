//! Orchestration of a single dialogue turn.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::dialogue::errors::DialogueResult;
use crate::dialogue::record::DialogueRole;
use crate::dialogue::store::DialogueStore;
use crate::llm::chat::CompletionBackend;

/// Coordinates store reads and writes around one completion call.
///
/// All storage access for a conversation is serialized behind a
/// per-conversation lock so concurrent webhook deliveries cannot interleave
/// their append/window/prune sequences.
pub struct DialogueOrchestrator {
    store: Arc<dyn DialogueStore>,
    backend: Arc<dyn CompletionBackend>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl DialogueOrchestrator {
    /// Build an orchestrator over the given store and completion backend.
    #[must_use]
    pub fn new(store: Arc<dyn DialogueStore>, backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            store,
            backend,
            locks: DashMap::new(),
        }
    }

    fn conversation_lock(&self, conversation_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Process one inbound question and return the generated answer.
    ///
    /// The question is appended before generation; if the completion call
    /// fails, the appended record is deleted again so the log never holds
    /// a question without its answer.
    ///
    /// # Errors
    /// Returns an error if storage access or the completion call fails.
    pub async fn process(&self, conversation_id: &str, question: &str) -> DialogueResult<String> {
        let lock = self.conversation_lock(conversation_id);
        let _guard = lock.lock().await;

        self.store.ensure_seeded(conversation_id).await?;
        let question_seq = self
            .store
            .append(conversation_id, DialogueRole::User, question)
            .await?;

        let window = self.store.context_window(conversation_id).await?;
        debug!(
            conversation = conversation_id,
            window_len = window.len(),
            "dispatching completion request"
        );

        let answer = match self.backend.complete(&window).await {
            Ok(answer) => answer,
            Err(err) => {
                if let Err(cleanup_err) = self
                    .store
                    .delete_record(conversation_id, question_seq)
                    .await
                {
                    warn!(
                        conversation = conversation_id,
                        seq = question_seq,
                        error = %cleanup_err,
                        "failed to remove orphaned question after completion failure"
                    );
                }
                return Err(err);
            }
        };

        self.store
            .append(conversation_id, DialogueRole::Assistant, &answer)
            .await?;

        Ok(answer)
    }
}
