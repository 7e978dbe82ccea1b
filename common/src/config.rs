//! 設定管理
//!
//! MonitorConfig, MonitorSettings等の設定構造体と`config.json`の読み込み
//!
//! `config.json`の形式:
//!
//! ```json
//! {
//!   "bots": { "alpha": { "bot_uname": "@alpha_bot" } },
//!   "channels": { "main": { "chat_id": -1001234567890, "message_id": 42 } },
//!   "settings": { "check_interval_secs": 300 }
//! }
//! ```
//!
//! `bots`と`channels`は記述順を保持する（レポートの並び順になる）。

use crate::error::CommonError;
use crate::types::{BotEntry, DestinationChannel};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;

/// 監視サイクルの設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorSettings {
    /// レポート見出し（HTML）
    #[serde(default = "default_header")]
    pub header: String,

    /// タイムスタンプ表示に使うIANAタイムゾーン (デフォルト: "Asia/Kolkata")
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// 死活確認でボットに送るメッセージ (デフォルト: "/start")
    #[serde(default = "default_stimulus_text")]
    pub stimulus_text: String,

    /// サイクル間隔（秒）(デフォルト: 300)
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// 応答待ちの上限（秒）(デフォルト: 20)
    #[serde(default = "default_settle_timeout")]
    pub settle_timeout_secs: u64,

    /// 応答待ち中の履歴ポーリング間隔（ミリ秒）(デフォルト: 2000)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// 配信先間の待機（ミリ秒）(デフォルト: 1500)
    #[serde(default = "default_publish_pause")]
    pub publish_pause_ms: u64,

    /// レート制限時の待機倍率 (デフォルト: 1.2)
    #[serde(default = "default_backoff_factor")]
    pub rate_limit_backoff_factor: f64,

    /// レート制限時の再試行上限 (デフォルト: 5)
    #[serde(default = "default_max_retries")]
    pub max_rate_limit_retries: u32,

    /// レート制限待機の累計上限（秒）(デフォルト: 600)
    #[serde(default = "default_max_rate_limit_wait")]
    pub max_rate_limit_wait_secs: u64,

    /// 同時プローブ数 (デフォルト: 1 = 逐次)
    #[serde(default = "default_probe_concurrency")]
    pub probe_concurrency: usize,

    /// レポートに応答時間を表示するか (デフォルト: false)
    #[serde(default)]
    pub show_response_time: bool,

    /// レポートに稼働率バーを表示するか (デフォルト: true)
    #[serde(default = "default_true")]
    pub show_progress_bar: bool,

    /// プラットフォームAPIのリクエストタイムアウト（秒）(デフォルト: 15)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_header() -> String {
    "<b>--❤️ Our Bot Status ❤️--</b>".to_string()
}

fn default_time_zone() -> String {
    "Asia/Kolkata".to_string()
}

fn default_stimulus_text() -> String {
    "/start".to_string()
}

fn default_check_interval() -> u64 {
    300
}

fn default_settle_timeout() -> u64 {
    20
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_publish_pause() -> u64 {
    1500
}

fn default_backoff_factor() -> f64 {
    1.2
}

fn default_max_retries() -> u32 {
    5
}

fn default_max_rate_limit_wait() -> u64 {
    600
}

fn default_probe_concurrency() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    15
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            header: default_header(),
            time_zone: default_time_zone(),
            stimulus_text: default_stimulus_text(),
            check_interval_secs: default_check_interval(),
            settle_timeout_secs: default_settle_timeout(),
            poll_interval_ms: default_poll_interval(),
            publish_pause_ms: default_publish_pause(),
            rate_limit_backoff_factor: default_backoff_factor(),
            max_rate_limit_retries: default_max_retries(),
            max_rate_limit_wait_secs: default_max_rate_limit_wait(),
            probe_concurrency: default_probe_concurrency(),
            show_response_time: false,
            show_progress_bar: true,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl MonitorSettings {
    /// サイクル間隔
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// 応答待ちの上限
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_secs(self.settle_timeout_secs)
    }

    /// 履歴ポーリング間隔
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 配信先間の待機
    pub fn publish_pause(&self) -> Duration {
        Duration::from_millis(self.publish_pause_ms)
    }

    /// レート制限待機の累計上限
    pub fn max_rate_limit_wait(&self) -> Duration {
        Duration::from_secs(self.max_rate_limit_wait_secs)
    }

    /// リクエストタイムアウト
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// タイムゾーンを解決
    pub fn tz(&self) -> Result<Tz, CommonError> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|_| CommonError::UnknownTimeZone(self.time_zone.clone()))
    }

    /// レポートに記載する更新間隔（分、切り上げ）
    pub fn refresh_minutes(&self) -> u64 {
        self.check_interval_secs.div_ceil(60)
    }
}

/// 監視設定全体
///
/// 起動時に一度だけ構築し、以後は読み取り専用で共有する。
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// 監視対象ボット（設定順）
    pub bots: Vec<BotEntry>,
    /// 配信先（設定順）
    pub destinations: Vec<DestinationChannel>,
    /// サイクル設定
    pub settings: MonitorSettings,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    bots: Map<String, Value>,
    #[serde(default)]
    channels: Map<String, Value>,
    #[serde(default)]
    settings: MonitorSettings,
}

#[derive(Debug, Deserialize)]
struct RawBot {
    bot_uname: String,
}

#[derive(Debug, Deserialize)]
struct RawChannel {
    chat_id: RawId,
    message_id: RawId,
}

/// 数値・数値文字列のどちらも受け付けるID
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

impl RawId {
    fn resolve(self, field: &str, key: &str) -> Result<i64, CommonError> {
        match self {
            RawId::Int(v) => Ok(v),
            RawId::Text(s) => s.trim().parse().map_err(|_| {
                CommonError::Validation(format!(
                    "channel '{}': {} is not an integer: {:?}",
                    key, field, s
                ))
            }),
        }
    }
}

impl MonitorConfig {
    /// 設定を組み立てる
    pub fn new(
        bots: Vec<BotEntry>,
        destinations: Vec<DestinationChannel>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            bots,
            destinations,
            settings,
        }
    }

    /// JSON文字列から設定を読み込む
    pub fn from_json_str(json: &str) -> Result<Self, CommonError> {
        let raw: RawConfig = serde_json::from_str(json)?;

        let mut bots = Vec::with_capacity(raw.bots.len());
        for (key, value) in raw.bots {
            let bot: RawBot = serde_json::from_value(value).map_err(|e| {
                CommonError::Config(format!("bot '{}' is not valid: {}", key, e))
            })?;
            bots.push(BotEntry::new(key, bot.bot_uname.trim()));
        }

        let mut destinations = Vec::with_capacity(raw.channels.len());
        for (key, value) in raw.channels {
            let channel: RawChannel = serde_json::from_value(value).map_err(|e| {
                CommonError::Config(format!("channel '{}' is not valid: {}", key, e))
            })?;
            let chat_id = channel.chat_id.resolve("chat_id", &key)?;
            let message_id = channel.message_id.resolve("message_id", &key)?;
            destinations.push(DestinationChannel::new(key, chat_id, message_id));
        }

        Ok(Self::new(bots, destinations, raw.settings))
    }

    /// ファイルから設定を読み込む
    pub fn from_path(path: &Path) -> Result<Self, CommonError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// 起動前の検証
    ///
    /// 配信先が無い設定は致命的エラーとする。
    pub fn validate(&self) -> Result<(), CommonError> {
        if self.destinations.is_empty() {
            return Err(CommonError::NoDestinations);
        }
        if let Some(bot) = self.bots.iter().find(|b| b.handle.is_empty()) {
            return Err(CommonError::Validation(format!(
                "bot '{}' has an empty bot_uname",
                bot.key
            )));
        }
        let s = &self.settings;
        s.tz()?;
        if s.check_interval_secs == 0 {
            return Err(CommonError::Validation(
                "check_interval_secs must be greater than 0".to_string(),
            ));
        }
        if s.settle_timeout_secs == 0 || s.poll_interval_ms == 0 {
            return Err(CommonError::Validation(
                "settle_timeout_secs and poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if s.probe_concurrency == 0 {
            return Err(CommonError::Validation(
                "probe_concurrency must be at least 1".to_string(),
            ));
        }
        if !s.rate_limit_backoff_factor.is_finite() || s.rate_limit_backoff_factor < 1.0 {
            return Err(CommonError::Validation(
                "rate_limit_backoff_factor must be a finite number of at least 1.0".to_string(),
            ));
        }
        Ok(())
    }
}
