//! once subcommand
//!
//! Runs a single cycle and prints what happened to each destination.

use super::connect;
use crate::cycle::CycleSummary;
use crate::format::format_duration;
use crate::publish::DeliveryStatus;
use crate::shutdown::ShutdownController;
use clap::Args;
use std::path::Path;

/// Arguments for the once subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct OnceArgs {
    /// Exit with an error when any destination could not be updated
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}

/// Execute the once command
pub async fn execute(
    args: &OnceArgs,
    config_path: &Path,
    shutdown: ShutdownController,
) -> Result<(), anyhow::Error> {
    let orchestrator = connect(config_path, shutdown, |_| {}).await?;
    let summary = orchestrator.run_cycle().await?;

    print!("{}", render_summary(&summary));

    let failed = summary.deliveries.len() - summary.delivered();
    if args.strict && failed > 0 {
        anyhow::bail!("{} destination(s) could not be updated", failed);
    }
    Ok(())
}

fn render_summary(summary: &CycleSummary) -> String {
    let mut out = format!(
        "Available bots: {} out of {} ({})\n",
        summary.reachable,
        summary.total,
        format_duration(summary.elapsed)
    );
    if summary.interrupted {
        out.push_str("Cycle interrupted by shutdown\n");
    }
    out.push_str("DESTINATION\tCHAT\tMESSAGE\tSTATUS\tATTEMPTS\n");
    for delivery in &summary.deliveries {
        let status = match &delivery.status {
            DeliveryStatus::Edited => "edited".to_string(),
            DeliveryStatus::Unchanged => "unchanged".to_string(),
            DeliveryStatus::Failed(e) => format!("failed: {}", e),
        };
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\n",
            delivery.destination.key,
            delivery.destination.chat_id,
            delivery.destination.message_id,
            status,
            delivery.attempts
        ));
    }
    out
}
