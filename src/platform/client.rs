//! Reply delivery through the platform messaging API.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::dialogue::errors::{DialogueError, DialogueResult};

/// Default platform messaging API base URL.
pub const DEFAULT_API_URL: &str = "https://api.line.me";

/// Request timeout for reply delivery.
const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// Boxed future type for reply calls.
pub type ReplyFuture<'a> = Pin<Box<dyn Future<Output = DialogueResult<()>> + Send + 'a>>;

/// Sends a generated answer back to the originating conversation.
pub trait ReplyClient: Send + Sync {
    /// Deliver `text` as the reply identified by `reply_token`.
    ///
    /// # Errors
    /// Returns an error if the transport or the endpoint fails.
    fn reply(&self, reply_token: &str, text: &str) -> ReplyFuture<'_>;
}

#[derive(Serialize)]
struct ReplyRequest {
    #[serde(rename = "replyToken")]
    reply_token: String,
    messages: Vec<ReplyMessage>,
}

#[derive(Serialize)]
struct ReplyMessage {
    #[serde(rename = "type")]
    message_type: &'static str,
    text: String,
}

/// HTTP client for the platform's reply endpoint.
pub struct LineReplyClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl LineReplyClient {
    /// Build a reply client for the given API base URL and access token.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, access_token: &str) -> DialogueResult<Self> {
        let client = reqwest::Client::builder().timeout(REPLY_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/v2/bot/message/reply", base_url.trim_end_matches('/')),
            access_token: access_token.to_string(),
        })
    }
}

impl ReplyClient for LineReplyClient {
    fn reply(&self, reply_token: &str, text: &str) -> ReplyFuture<'_> {
        let chars = text.len();
        let request = ReplyRequest {
            reply_token: reply_token.to_string(),
            messages: vec![ReplyMessage {
                message_type: "text",
                text: text.to_string(),
            }],
        };

        Box::pin(async move {
            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.access_token)
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(DialogueError::Reply {
                    status: status.as_u16(),
                    body,
                });
            }

            debug!(chars, "reply delivered");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_request_shape() {
        let request = ReplyRequest {
            reply_token: "token-1".to_string(),
            messages: vec![ReplyMessage {
                message_type: "text",
                text: "four".to_string(),
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["replyToken"], "token-1");
        assert_eq!(json["messages"][0]["type"], "text");
        assert_eq!(json["messages"][0]["text"], "four");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = LineReplyClient::new("https://api.line.me/", "token").unwrap();
        assert_eq!(client.endpoint, "https://api.line.me/v2/bot/message/reply");
    }
}
