//! ボット監視の共通層
//!
//! 監視対象・配信先・プローブ結果のデータ型と設定スキーマ

#![warn(missing_docs)]

/// 設定スキーマ（config.json）
pub mod config;

/// エラー型
pub mod error;

/// 共通型定義
pub mod types;
