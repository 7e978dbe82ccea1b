//! 共通型定義
//!
//! BotEntry, DestinationChannel, ProbeResult等のコアデータ型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// 監視対象ボット
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BotEntry {
    /// 設定上のキー（内部識別子）
    pub key: String,
    /// メッセージ送信先のハンドル（例: `@example_bot`）
    pub handle: String,
}

impl BotEntry {
    /// 新しいBotEntryを作成
    pub fn new(key: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            handle: handle.into(),
        }
    }
}

/// レポート配信先
///
/// `chat_id`のチャンネルにある既存メッセージ`message_id`を上書き編集する。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DestinationChannel {
    /// 設定上のキー
    pub key: String,
    /// チャンネルID
    pub chat_id: i64,
    /// 編集対象メッセージID
    pub message_id: i64,
}

impl DestinationChannel {
    /// 新しいDestinationChannelを作成
    pub fn new(key: impl Into<String>, chat_id: i64, message_id: i64) -> Self {
        Self {
            key: key.into(),
            chat_id,
            message_id,
        }
    }
}

/// プラットフォーム上のメッセージ参照
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageRef {
    /// メッセージID（会話内で単調増加）
    pub id: i64,
    /// 送信日時
    pub date: DateTime<Utc>,
}

impl MessageRef {
    /// 新しいMessageRefを作成
    pub fn new(id: i64, date: DateTime<Utc>) -> Self {
        Self { id, date }
    }
}

/// ボットの稼働状態
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    /// 応答あり
    Reachable,
    /// 応答なし（タイムアウト・エラー含む）
    Unreachable,
}

impl ProbeStatus {
    /// レポートに表示するステータス記号
    pub fn symbol(&self) -> &'static str {
        match self {
            ProbeStatus::Reachable => "✅",
            ProbeStatus::Unreachable => "❌",
        }
    }

    /// 文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStatus::Reachable => "reachable",
            ProbeStatus::Unreachable => "unreachable",
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1サイクル分のプローブ結果
///
/// `latency`は`status`が`Reachable`のときのみ存在する。
/// この不変条件を守るため、フィールドは非公開でコンストラクタ経由でのみ作成する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    handle: String,
    status: ProbeStatus,
    latency: Option<Duration>,
}

impl ProbeResult {
    /// 応答ありの結果を作成
    pub fn reachable(handle: impl Into<String>, latency: Duration) -> Self {
        Self {
            handle: handle.into(),
            status: ProbeStatus::Reachable,
            latency: Some(latency),
        }
    }

    /// 応答なしの結果を作成
    pub fn unreachable(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            status: ProbeStatus::Unreachable,
            latency: None,
        }
    }

    /// ボットのハンドル
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// 稼働状態
    pub fn status(&self) -> ProbeStatus {
        self.status
    }

    /// 応答時間（応答ありの場合のみ）
    pub fn latency(&self) -> Option<Duration> {
        self.latency
    }

    /// 応答ありかどうか
    pub fn is_reachable(&self) -> bool {
        self.status == ProbeStatus::Reachable
    }
}
