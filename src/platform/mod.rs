//! Messaging platform boundary: signature checks, event payloads, replies.

pub mod client;
pub mod events;
pub mod signature;

pub use client::{LineReplyClient, ReplyClient, ReplyFuture};
pub use events::{EventMessage, EventSource, WebhookEvent, WebhookPayload};
