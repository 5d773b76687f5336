//! Completion backends.

pub mod chat;

pub use chat::{CompletionBackend, CompletionFuture, OpenAiChat};
