//! CLI module for botstatus
//!
//! Provides the command-line interface for the status monitor.

pub mod check_config;
pub mod once;
pub mod run;

use crate::config::{
    load_monitor_config, PlatformConfig, DEFAULT_CONFIG_PATH, DEFAULT_ENV_PATH,
};
use crate::cycle::CycleOrchestrator;
use crate::error::MonitorError;
use crate::platform::{BotApiClient, MessagingPlatform};
use crate::shutdown::ShutdownController;
use botstatus_common::config::MonitorConfig;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Bot status monitor - Periodic health report for a fleet of chat bots
#[derive(Parser, Debug)]
#[command(name = "botstatus")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    BOTSTATUS_SESSION       Session credential for the gateway (required; legacy: PYRO_SESSION)
    BOTSTATUS_API_URL       Gateway base URL (default: http://127.0.0.1:8081; legacy: API_URL)
    BOTSTATUS_CONFIG        Path to config.json (default: config.json)
    BOTSTATUS_CONFIG_URL    Download config.json from this URL at startup (legacy: CONFIG_JSON_URL)
    BOTSTATUS_ENV_FILE      Path to the .env file loaded at startup (default: .env)
    BOTSTATUS_ENV_URL       Download the .env file from this URL at startup (legacy: CONFIG_ENV_URL)
    BOTSTATUS_CHECK_INTERVAL
                            Seconds between cycle starts (default: 300; legacy: CHECK_INTERVAL)
    BOTSTATUS_HEADER_MSG    Report header, HTML allowed (legacy: HEADER_MSG)
    BOTSTATUS_TIME_ZONE     IANA time zone for the footer (default: Asia/Kolkata; legacy: TIME_ZONE)
    BOTSTATUS_LOG_LEVEL     Log level (default: info; RUST_LOG takes precedence)
"#)]
pub struct Cli {
    /// Path to config.json
    #[arg(short, long, global = true, env = "BOTSTATUS_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Path to the .env file (values in it override the environment)
    #[arg(long, global = true, env = "BOTSTATUS_ENV_FILE", default_value = DEFAULT_ENV_PATH)]
    pub env_file: PathBuf,

    /// Subcommand to execute (default: run)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe and publish every check interval until stopped
    Run(run::RunArgs),
    /// Run a single cycle and print the summary
    Once(once::OnceArgs),
    /// Validate config.json and print the resolved configuration
    CheckConfig(check_config::CheckConfigArgs),
}

/// Load the configuration, open the gateway session and wire a cycle
/// orchestrator.
///
/// Every failure here is a startup failure: no bot is probed and no channel
/// is edited.
pub(crate) async fn connect(
    config_path: &Path,
    shutdown: ShutdownController,
    adjust: impl FnOnce(&mut MonitorConfig),
) -> Result<CycleOrchestrator, MonitorError> {
    let mut config = load_monitor_config(config_path).await?;
    adjust(&mut config);
    config.validate()?;

    let platform_config = PlatformConfig::from_env()?;
    let client = BotApiClient::new(
        &platform_config.api_url,
        &platform_config.session,
        config.settings.request_timeout(),
    )?;

    let account = client
        .verify_session()
        .await
        .map_err(MonitorError::Session)?;
    info!(
        account = %account,
        api_url = %client.base_url(),
        bots = config.bots.len(),
        destinations = config.destinations.len(),
        "Session verified"
    );

    let platform: Arc<dyn MessagingPlatform> = Arc::new(client);
    CycleOrchestrator::new(Arc::new(config), platform, shutdown)
}
