//! エラー型定義
//!
//! 設定読み込み・検証で使う共通エラー型（thiserror使用）

use thiserror::Error;

/// Common layer error type
#[derive(Debug, Error)]
pub enum CommonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// No destination channel is configured, so a report has nowhere to go
    #[error("No destination channels configured")]
    NoDestinations,

    /// Unknown IANA time zone name
    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),
}
