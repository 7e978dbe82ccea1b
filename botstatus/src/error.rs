//! エラー型定義
//!
//! 統一エラー型（thiserror使用）

use crate::platform::PlatformError;
use botstatus_common::error::CommonError;
use std::time::Duration;
use thiserror::Error;

/// Delivery failure for a single destination
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PublishError {
    /// Rate-limit retries exceeded the configured attempt or wait budget
    #[error("Rate limit retry budget exhausted after {attempts} attempts ({waited:?} waited)")]
    RateLimitExhausted {
        /// Edit attempts made
        attempts: u32,
        /// Total time spent waiting on rate limits
        waited: Duration,
    },

    /// Platform rejected the edit
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Monitor error type
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Platform error outside the per-bot / per-destination isolation boundary
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Remote configuration download failed
    #[error("Configuration download failed: {0}")]
    Download(String),

    /// Startup session check failed
    #[error("Session verification failed: {0}")]
    Session(PlatformError),
}

impl MonitorError {
    /// True when the error is the fatal "nowhere to publish" configuration error
    pub fn is_no_destinations(&self) -> bool {
        matches!(self, MonitorError::Common(CommonError::NoDestinations))
    }
}

/// Result alias used throughout the crate
pub type MonitorResult<T> = Result<T, MonitorError>;
