//! HTTP gateway client
//!
//! ユーザーセッションを保持するHTTPゲートウェイに対して、
//! Telegram Bot API形式のエンベロープ（`ok` / `result` / `error_code` /
//! `description` / `parameters.retry_after`）でメソッドを呼び出す。
//!
//! 呼び出しは `POST {base_url}/{method}` にJSONボディを送り、
//! セッションは `Authorization: Bearer` ヘッダーで渡す。

use super::{MessagingPlatform, PlatformError};
use async_trait::async_trait;
use botstatus_common::types::MessageRef;
use chrono::DateTime;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Wait used when a 429 carries no usable retry hint.
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// Response envelope shared by every gateway method
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message_id: i64,
    date: i64,
}

impl ApiMessage {
    fn into_ref(self) -> Result<MessageRef, PlatformError> {
        let date = DateTime::from_timestamp(self.date, 0).ok_or_else(|| {
            PlatformError::InvalidResponse(format!("message date out of range: {}", self.date))
        })?;
        Ok(MessageRef::new(self.message_id, date))
    }
}

#[derive(Debug, Deserialize)]
struct ApiPeer {
    first_name: Option<String>,
    last_name: Option<String>,
    title: Option<String>,
    username: Option<String>,
}

impl ApiPeer {
    fn display_name(&self) -> String {
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            return title.to_string();
        }
        let full = match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) if !last.is_empty() => format!("{} {}", first, last),
            (Some(first), _) => first.to_string(),
            (None, Some(last)) => last.to_string(),
            (None, None) => String::new(),
        };
        if !full.is_empty() {
            return full;
        }
        self.username
            .as_deref()
            .map(|u| format!("@{}", u))
            .unwrap_or_default()
    }
}

/// Gateway client implementing [`MessagingPlatform`].
#[derive(Clone)]
pub struct BotApiClient {
    client: Client,
    base_url: String,
    session: String,
}

impl BotApiClient {
    /// Create a client for the gateway at `base_url` authenticated with `session`.
    pub fn new(
        base_url: impl Into<String>,
        session: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PlatformError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PlatformError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            session: session.into(),
        })
    }

    /// Gateway base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> Result<T, PlatformError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), method);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.session))
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;

        let envelope: ApiEnvelope<T> = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(PlatformError::InvalidResponse(format!(
                    "{}: {}",
                    method, e
                )));
            }
            Err(_) => {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                return Err(classify_error(i64::from(status.as_u16()), &text, None));
            }
        };

        if envelope.ok {
            return envelope.result.ok_or_else(|| {
                PlatformError::InvalidResponse(format!("{}: missing result", method))
            });
        }

        let code = envelope
            .error_code
            .unwrap_or_else(|| i64::from(status.as_u16()));
        let description = envelope.description.unwrap_or_default();
        let retry_after = envelope.parameters.and_then(|p| p.retry_after);

        debug!(method, code, description = %description, "Gateway call failed");
        Err(classify_error(code, &description, retry_after))
    }
}

fn map_transport_error(e: reqwest::Error) -> PlatformError {
    if e.is_timeout() {
        PlatformError::Timeout
    } else {
        PlatformError::Http(e.to_string())
    }
}

/// Map a platform error code/description pair onto [`PlatformError`].
fn classify_error(code: i64, description: &str, retry_after: Option<u64>) -> PlatformError {
    if let Some(secs) = retry_after {
        return PlatformError::RateLimited {
            retry_after: Duration::from_secs(secs),
        };
    }

    let lower = description.to_ascii_lowercase();
    if lower.contains("message is not modified") {
        return PlatformError::NotModified;
    }

    match code {
        429 => PlatformError::RateLimited {
            retry_after: Duration::from_secs(
                parse_retry_hint(&lower).unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            ),
        },
        401 => PlatformError::Unauthorized(description.to_string()),
        403 => PlatformError::Forbidden(description.to_string()),
        404 => PlatformError::NotFound(description.to_string()),
        400 if lower.contains("not found") || lower.contains("invalid") => {
            PlatformError::NotFound(description.to_string())
        }
        _ => PlatformError::Api {
            code,
            description: description.to_string(),
        },
    }
}

/// Extract `N` from descriptions like `Too Many Requests: retry after N`.
fn parse_retry_hint(description: &str) -> Option<u64> {
    let (_, tail) = description.rsplit_once("retry after")?;
    tail.trim()
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .and_then(|n| n.parse().ok())
}

#[async_trait]
impl MessagingPlatform for BotApiClient {
    async fn verify_session(&self) -> Result<String, PlatformError> {
        let me: ApiPeer = self.call("getMe", json!({})).await?;
        Ok(me.display_name())
    }

    async fn send_message(&self, handle: &str, text: &str) -> Result<MessageRef, PlatformError> {
        let message: ApiMessage = self
            .call("sendMessage", json!({ "chat_id": handle, "text": text }))
            .await?;
        message.into_ref()
    }

    async fn latest_message(&self, handle: &str) -> Result<Option<MessageRef>, PlatformError> {
        let messages: Vec<ApiMessage> = self
            .call("getHistory", json!({ "chat_id": handle, "limit": 1 }))
            .await?;
        messages.into_iter().next().map(ApiMessage::into_ref).transpose()
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<(), PlatformError> {
        let _: Value = self
            .call(
                "editMessageText",
                json!({
                    "chat_id": chat_id,
                    "message_id": message_id,
                    "text": text,
                    "parse_mode": "HTML",
                    "disable_web_page_preview": true,
                }),
            )
            .await?;
        Ok(())
    }

    async fn mark_read(&self, handle: &str) -> Result<(), PlatformError> {
        let _: Value = self
            .call("readHistory", json!({ "chat_id": handle }))
            .await?;
        Ok(())
    }

    async fn resolve_display_name(&self, handle: &str) -> Result<String, PlatformError> {
        let peer: ApiPeer = self.call("getChat", json!({ "chat_id": handle })).await?;
        Ok(peer.display_name())
    }
}
