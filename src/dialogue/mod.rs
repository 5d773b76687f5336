//! Dialogue log, retention policy, and turn orchestration.

pub mod config;
pub mod errors;
pub mod orchestrator;
pub mod record;
pub mod store;

pub use config::{DialogueConfig, LlmConfig, StorageConfig, WindowConfig};
pub use errors::{DialogueError, DialogueResult};
pub use orchestrator::DialogueOrchestrator;
pub use record::{ChatMessage, DialogueRole};
pub use store::{DialogueStore, SqliteDialogueStore};
