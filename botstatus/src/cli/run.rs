//! run サブコマンド
//!
//! シャットダウン要求まで監視サイクルを繰り返します。

use super::connect;
use crate::shutdown::ShutdownController;
use clap::Args;
use std::path::Path;

/// run サブコマンドの引数
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Override the check interval in seconds
    #[arg(short, long)]
    pub interval: Option<u64>,
}

/// Execute the run command
pub async fn execute(
    args: &RunArgs,
    config_path: &Path,
    shutdown: ShutdownController,
) -> Result<(), anyhow::Error> {
    let interval = args.interval;
    let orchestrator = connect(config_path, shutdown, |config| {
        if let Some(secs) = interval {
            config.settings.check_interval_secs = secs;
        }
    })
    .await?;

    orchestrator.run().await;
    Ok(())
}
