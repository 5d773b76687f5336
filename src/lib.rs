//! Message-relay bot: webhook in, bounded conversation window through an
//! LLM completion endpoint, reply out.

#![deny(warnings)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(unused_must_use)]
#![deny(clippy::all)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::print_stdout)]
#![forbid(unsafe_op_in_unsafe_fn)]

/// Dialogue log, retention policy, and turn orchestration.
pub mod dialogue;
/// Completion backends.
pub mod llm;
/// Messaging platform boundary.
pub mod platform;
/// HTTP server and webhook routes.
#[allow(clippy::unused_async)]
pub mod server;
/// Entry helpers to start the relay bot.
pub mod start_relay_bot;
