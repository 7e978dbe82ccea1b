//! レポート配信
//!
//! 各配信先の既存メッセージを編集してレポートを反映する。
//!
//! - レート制限: 提示された待機時間×倍率（デフォルト1.2）だけ待って再試行。
//!   再試行回数と累計待機時間に上限があり、超えた場合は
//!   [`PublishError::RateLimitExhausted`] として配信失敗にする。
//! - 内容が同一（not modified）: 成功として扱う。
//! - その他のエラー: ログに残してその配信先をスキップし、次へ進む。
//! - 配信先の間には固定の待機を入れる。

use crate::error::{MonitorError, PublishError};
use crate::platform::{MessagingPlatform, PlatformError};
use crate::shutdown::ShutdownController;
use botstatus_common::config::MonitorSettings;
use botstatus_common::error::CommonError;
use botstatus_common::types::DestinationChannel;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Rate-limit retry budget for one destination
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Multiplier applied to the platform's suggested wait
    pub backoff_factor: f64,
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Cumulative wait allowed across retries
    pub max_total_wait: Duration,
}

impl RetryPolicy {
    /// Build the policy from settings
    pub fn from_settings(settings: &MonitorSettings) -> Self {
        Self {
            backoff_factor: settings.rate_limit_backoff_factor,
            max_retries: settings.max_rate_limit_retries,
            max_total_wait: settings.max_rate_limit_wait(),
        }
    }

    /// Wait before retrying after the platform asked for `retry_after`
    pub fn backoff(&self, retry_after: Duration) -> Duration {
        Duration::try_from_secs_f64(retry_after.as_secs_f64() * self.backoff_factor)
            .unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&MonitorSettings::default())
    }
}

/// Result of delivering to one destination
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryStatus {
    /// Message text replaced
    Edited,
    /// Platform reported identical content; nothing to do
    Unchanged,
    /// Destination skipped
    Failed(PublishError),
}

impl DeliveryStatus {
    /// Edited or unchanged
    pub fn is_success(&self) -> bool {
        !matches!(self, DeliveryStatus::Failed(_))
    }
}

/// Per-destination delivery record
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryOutcome {
    /// Target destination
    pub destination: DestinationChannel,
    /// Final status
    pub status: DeliveryStatus,
    /// Edit calls made
    pub attempts: u32,
}

/// Deliveries made in one publish pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishRun {
    /// One outcome per attempted destination, in configuration order
    pub outcomes: Vec<DeliveryOutcome>,
    /// True when shutdown stopped the pass before every destination
    pub interrupted: bool,
}

impl PublishRun {
    /// Destinations that now show the report
    pub fn delivered_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_success()).count()
    }
}

/// Report publisher
#[derive(Clone)]
pub struct Publisher {
    platform: Arc<dyn MessagingPlatform>,
    destinations: Vec<DestinationChannel>,
    pause: Duration,
    retry: RetryPolicy,
    shutdown: ShutdownController,
}

impl Publisher {
    /// Create a publisher; an empty destination list is rejected.
    pub fn new(
        platform: Arc<dyn MessagingPlatform>,
        destinations: Vec<DestinationChannel>,
        settings: &MonitorSettings,
        shutdown: ShutdownController,
    ) -> Result<Self, MonitorError> {
        if destinations.is_empty() {
            return Err(CommonError::NoDestinations.into());
        }
        Ok(Self {
            platform,
            destinations,
            pause: settings.publish_pause(),
            retry: RetryPolicy::from_settings(settings),
            shutdown,
        })
    }

    /// Override the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Deliver `text` to every destination in order.
    pub async fn publish(&self, text: &str) -> Result<PublishRun, MonitorError> {
        if self.destinations.is_empty() {
            return Err(CommonError::NoDestinations.into());
        }

        let mut run = PublishRun::default();
        for (index, destination) in self.destinations.iter().enumerate() {
            if index > 0 {
                if self.shutdown.is_shutdown_requested() {
                    run.interrupted = true;
                    warn!(
                        delivered = run.outcomes.len(),
                        total = self.destinations.len(),
                        "Publish stopped by shutdown request"
                    );
                    break;
                }
                sleep(self.pause).await;
            }

            info!(
                "Updating Channel ID : {} & Message ID : {}",
                destination.chat_id, destination.message_id
            );
            run.outcomes.push(self.deliver(destination, text).await);
        }
        Ok(run)
    }

    /// Edit one destination, retrying on rate limits within the policy budget.
    pub async fn deliver(&self, destination: &DestinationChannel, text: &str) -> DeliveryOutcome {
        let mut attempts = 0u32;
        let mut waited = Duration::ZERO;

        let status = loop {
            attempts += 1;
            match self
                .platform
                .edit_message_text(destination.chat_id, destination.message_id, text)
                .await
            {
                Ok(()) => break DeliveryStatus::Edited,
                Err(PlatformError::NotModified) => break DeliveryStatus::Unchanged,
                Err(PlatformError::RateLimited { retry_after }) => {
                    let wait = self.retry.backoff(retry_after);
                    if attempts > self.retry.max_retries
                        || waited.saturating_add(wait) > self.retry.max_total_wait
                    {
                        break DeliveryStatus::Failed(PublishError::RateLimitExhausted {
                            attempts,
                            waited,
                        });
                    }
                    warn!(
                        destination = %destination.key,
                        retry_after_secs = retry_after.as_secs_f64(),
                        wait_secs = wait.as_secs_f64(),
                        attempt = attempts,
                        "Rate limited, backing off"
                    );
                    sleep(wait).await;
                    waited += wait;
                }
                Err(e) => break DeliveryStatus::Failed(PublishError::Platform(e)),
            }
        };

        if let DeliveryStatus::Failed(e) = &status {
            error!(
                destination = %destination.key,
                chat_id = destination.chat_id,
                message_id = destination.message_id,
                error = %e,
                "Failed to update status message"
            );
        }

        DeliveryOutcome {
            destination: destination.clone(),
            status,
            attempts,
        }
    }
}
