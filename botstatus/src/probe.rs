//! ボット死活プローブ
//!
//! 各ボットに `/start` を送り、会話履歴の最新メッセージを短い間隔で確認する。
//! 送信したメッセージ以外が最新になった時点で応答ありと判定し、
//! `settle_timeout` を過ぎても変化が無ければ応答なしとする。
//!
//! 1台の失敗（タイムアウト・未登録・権限エラー）はそのボットの
//! 「応答なし」として記録され、他のボットのプローブは継続する。

use crate::platform::{MessagingPlatform, PlatformError};
use crate::shutdown::ShutdownController;
use botstatus_common::config::MonitorSettings;
use botstatus_common::types::{BotEntry, MessageRef, ProbeResult};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Classify one probe from the stimulus and the latest message seen.
///
/// Identical identities mean nothing arrived after the stimulus. Otherwise the
/// latency is the latest message time minus `started_at`, floored at zero.
pub fn classify(
    handle: &str,
    stimulus: &MessageRef,
    latest: &MessageRef,
    started_at: DateTime<Utc>,
) -> ProbeResult {
    if latest.id == stimulus.id {
        return ProbeResult::unreachable(handle);
    }
    let latency = (latest.date - started_at).to_std().unwrap_or(Duration::ZERO);
    ProbeResult::reachable(handle, latency)
}

/// Results of probing the whole fleet once
#[derive(Debug, Clone, Default)]
pub struct ProbeRun {
    /// Per-bot results in configuration order
    pub results: Vec<(BotEntry, ProbeResult)>,
    /// True when shutdown stopped the run before every bot was probed
    pub interrupted: bool,
}

impl ProbeRun {
    /// Number of reachable bots
    pub fn reachable_count(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_reachable()).count()
    }
}

/// ボット死活プローブエンジン
#[derive(Clone)]
pub struct ProbeEngine {
    platform: Arc<dyn MessagingPlatform>,
    stimulus_text: String,
    settle_timeout: Duration,
    poll_interval: Duration,
    concurrency: usize,
    shutdown: ShutdownController,
}

impl ProbeEngine {
    /// 設定からプローブエンジンを作成
    pub fn new(
        platform: Arc<dyn MessagingPlatform>,
        settings: &MonitorSettings,
        shutdown: ShutdownController,
    ) -> Self {
        Self {
            platform,
            stimulus_text: settings.stimulus_text.clone(),
            settle_timeout: settings.settle_timeout(),
            poll_interval: settings.poll_interval(),
            concurrency: settings.probe_concurrency.max(1),
            shutdown,
        }
    }

    /// 全ボットをプローブ
    ///
    /// 結果は設定順に並ぶ。`probe_concurrency` が1より大きい場合も順序は保たれる。
    /// シャットダウン要求後は新しいボットのプローブを開始しない。
    pub async fn probe_all(&self, bots: &[BotEntry]) -> ProbeRun {
        let engine = self;
        let results: Vec<(BotEntry, ProbeResult)> = stream::iter(bots.iter().cloned())
            .take_while(|_| futures::future::ready(!engine.shutdown.is_shutdown_requested()))
            .map(|bot| async move {
                let result = engine.probe_bot(&bot).await;
                info!(
                    bot = %bot.handle,
                    status = %result.status(),
                    "Checked {} & Status : {}",
                    bot.handle,
                    result.status().symbol()
                );
                (bot, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let interrupted = results.len() < bots.len();
        if interrupted {
            warn!(
                probed = results.len(),
                total = bots.len(),
                "Probe run stopped by shutdown request"
            );
        }

        ProbeRun {
            results,
            interrupted,
        }
    }

    /// 単一ボットのプローブ（エラーは「応答なし」に変換）
    pub async fn probe_bot(&self, bot: &BotEntry) -> ProbeResult {
        match self.try_probe(bot).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    bot_key = %bot.key,
                    bot = %bot.handle,
                    error = %e,
                    "Probe failed"
                );
                ProbeResult::unreachable(&bot.handle)
            }
        }
    }

    async fn try_probe(&self, bot: &BotEntry) -> Result<ProbeResult, PlatformError> {
        let started_at = Utc::now();
        let stimulus = self
            .platform
            .send_message(&bot.handle, &self.stimulus_text)
            .await?;

        let latest = self.await_reply(&bot.handle, &stimulus).await?;
        let result = classify(&bot.handle, &stimulus, &latest, started_at);

        if let Err(e) = self.platform.mark_read(&bot.handle).await {
            debug!(bot = %bot.handle, error = %e, "Failed to mark conversation as read");
        }

        Ok(result)
    }

    /// 応答を待つ
    ///
    /// `poll_interval` ごとに最新メッセージを取得し、送信メッセージ以外が
    /// 見えた時点で返す。`settle_timeout` 経過後は最後に取得したものを返す。
    async fn await_reply(
        &self,
        handle: &str,
        stimulus: &MessageRef,
    ) -> Result<MessageRef, PlatformError> {
        let deadline = Instant::now() + self.settle_timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            sleep(self.poll_interval.min(remaining)).await;

            let latest = self
                .platform
                .latest_message(handle)
                .await?
                .ok_or_else(|| {
                    PlatformError::InvalidResponse("conversation history is empty".to_string())
                })?;

            if latest.id != stimulus.id || Instant::now() >= deadline {
                return Ok(latest);
            }
        }
    }
}
