//! Messaging platform abstraction
//!
//! 監視処理はこのtraitを通してのみプラットフォームにアクセスする。
//! 実装は`bot_api`（HTTPゲートウェイ）と、テスト用のスクリプト化実装。

pub mod bot_api;

pub use bot_api::BotApiClient;

use async_trait::async_trait;
use botstatus_common::types::MessageRef;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by a messaging platform call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlatformError {
    /// Flood control: the platform asks the caller to wait before retrying
    #[error("Rate limited: retry after {retry_after:?}")]
    RateLimited {
        /// Wait suggested by the platform
        retry_after: Duration,
    },

    /// Edit produced identical content
    #[error("Message is not modified")]
    NotModified,

    /// Peer, chat or message does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Session is not allowed to perform the call
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Session is invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request did not complete in time
    #[error("Request timed out")]
    Timeout,

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Any other error reported by the platform
    #[error("Platform error {code}: {description}")]
    Api {
        /// Platform error code
        code: i64,
        /// Platform error description
        description: String,
    },

    /// Response could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Operations the monitor needs from the messaging platform.
///
/// All calls are fallible and expected to have bounded latency. One shared
/// handle is used for the whole process.
#[async_trait]
pub trait MessagingPlatform: Send + Sync {
    /// Verify the session and return the account's display label.
    async fn verify_session(&self) -> Result<String, PlatformError>;

    /// Send `text` to the conversation with `handle`.
    async fn send_message(&self, handle: &str, text: &str) -> Result<MessageRef, PlatformError>;

    /// Most recent message in the conversation with `handle`, if any.
    async fn latest_message(&self, handle: &str) -> Result<Option<MessageRef>, PlatformError>;

    /// Replace the text of an existing message.
    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<(), PlatformError>;

    /// Mark the conversation with `handle` as read.
    async fn mark_read(&self, handle: &str) -> Result<(), PlatformError>;

    /// Plain-text display name for `handle`.
    ///
    /// The report escapes it, so it must not contain markup.
    async fn resolve_display_name(&self, handle: &str) -> Result<String, PlatformError>;
}
