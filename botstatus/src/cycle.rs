//! 監視サイクル
//!
//! プローブ → レポート生成 → 配信 を1サイクルとして実行し、
//! 前回の開始から `check_interval` ごとに次のサイクルを開始する。
//! サイクル間の待機はシャットダウンで中断できる。

use crate::error::MonitorResult;
use crate::format::{format_duration, format_size};
use crate::platform::MessagingPlatform;
use crate::probe::ProbeEngine;
use crate::publish::{DeliveryOutcome, Publisher};
use crate::report::ReportBuilder;
use crate::shutdown::ShutdownController;
use botstatus_common::config::MonitorConfig;
use botstatus_common::error::CommonError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

/// Outcome of one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSummary {
    /// Reachable bot count
    pub reachable: usize,
    /// Probed bot count
    pub total: usize,
    /// Per-destination results, in configuration order
    pub deliveries: Vec<DeliveryOutcome>,
    /// Wall time of the cycle
    pub elapsed: Duration,
    /// True when shutdown cut the cycle short
    pub interrupted: bool,
}

impl CycleSummary {
    /// Destinations that now show the report
    pub fn delivered(&self) -> usize {
        self.deliveries
            .iter()
            .filter(|d| d.status.is_success())
            .count()
    }
}

/// 監視サイクルのオーケストレーター
pub struct CycleOrchestrator {
    config: Arc<MonitorConfig>,
    platform: Arc<dyn MessagingPlatform>,
    engine: ProbeEngine,
    builder: ReportBuilder,
    publisher: Publisher,
    shutdown: ShutdownController,
}

impl CycleOrchestrator {
    /// Validate `config` and wire the cycle components.
    ///
    /// A configuration without destinations is rejected before any platform
    /// call is made.
    pub fn new(
        config: Arc<MonitorConfig>,
        platform: Arc<dyn MessagingPlatform>,
        shutdown: ShutdownController,
    ) -> MonitorResult<Self> {
        if config.destinations.is_empty() {
            return Err(CommonError::NoDestinations.into());
        }
        config.validate()?;

        let settings = &config.settings;
        let engine = ProbeEngine::new(platform.clone(), settings, shutdown.clone());
        let builder = ReportBuilder::new(settings)?;
        let publisher = Publisher::new(
            platform.clone(),
            config.destinations.clone(),
            settings,
            shutdown.clone(),
        )?;

        Ok(Self {
            config,
            platform,
            engine,
            builder,
            publisher,
            shutdown,
        })
    }

    /// Run one probe → report → publish cycle.
    ///
    /// If shutdown interrupts probing the partial report is not published.
    pub async fn run_cycle(&self) -> MonitorResult<CycleSummary> {
        let started = Instant::now();
        info!(
            bots = self.config.bots.len(),
            destinations = self.config.destinations.len(),
            "Starting status cycle"
        );

        let run = self.engine.probe_all(&self.config.bots).await;
        let reachable = run.reachable_count();
        let total = run.results.len();

        if run.interrupted {
            warn!(
                probed = total,
                "Shutdown requested during probing, report not published"
            );
            return Ok(CycleSummary {
                reachable,
                total,
                deliveries: Vec::new(),
                elapsed: started.elapsed(),
                interrupted: true,
            });
        }

        let report = self
            .builder
            .build(&run.results, self.platform.as_ref(), Utc::now())
            .await;
        let text = report.render();
        info!(
            reachable,
            total,
            size = %format_size(Some(text.len() as u64)),
            "Status report built"
        );

        let published = self.publisher.publish(&text).await?;
        let elapsed = started.elapsed();
        let summary = CycleSummary {
            reachable,
            total,
            deliveries: published.outcomes,
            elapsed,
            interrupted: published.interrupted,
        };

        info!(
            reachable,
            total,
            delivered = summary.delivered(),
            destinations = self.config.destinations.len(),
            elapsed = %format_duration(elapsed),
            "Status cycle completed"
        );
        Ok(summary)
    }

    /// Start a cycle every `check_interval` until shutdown is requested.
    ///
    /// Cycles start on a fixed schedule measured from the previous start.
    /// A cycle that overruns the interval delays the next one; missed ticks
    /// are not replayed.
    pub async fn run(&self) {
        let interval = self.config.settings.check_interval();
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = interval.as_secs(),
            "Bot status monitor started"
        );

        loop {
            // `interval()` ticks immediately on the first call, so the first
            // cycle runs at startup.
            tokio::select! {
                biased;
                _ = self.shutdown.wait() => break,
                _ = timer.tick() => {}
            }

            if let Err(e) = self.run_cycle().await {
                error!("Status cycle error: {}", e);
            }
        }

        info!("Bot status monitor stopped");
    }
}
