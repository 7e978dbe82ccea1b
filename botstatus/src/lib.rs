//! Bot status monitor
//!
//! ボット群の死活を定期的に確認し、チャンネルの既存メッセージを編集して
//! ステータスレポートを公開する

#![warn(missing_docs)]

/// 共通型定義（botstatus-commonの再エクスポート）
pub use botstatus_common as common;

/// CLIインターフェース
pub mod cli;

/// 環境変数・config.jsonの読み込み
pub mod config;

/// 監視サイクル（プローブ → レポート → 配信）
pub mod cycle;

/// エラー型
pub mod error;

/// 所要時間・サイズ・稼働率バーの整形
pub mod format;

/// ロギング初期化ユーティリティ
pub mod logging;

/// メッセージングプラットフォーム抽象とHTTPゲートウェイ実装
pub mod platform;

/// ボット死活プローブ
pub mod probe;

/// レポート配信（レート制限リトライ付き）
pub mod publish;

/// ステータスレポート生成
pub mod report;

/// グレースフルシャットダウン
pub mod shutdown;
