//! check-config サブコマンド
//!
//! config.jsonを検証し、環境変数を反映した最終設定を表示します。
//! プラットフォームには接続しません。

use crate::config::load_monitor_config;
use botstatus_common::config::MonitorConfig;
use clap::Args;
use serde_json::json;
use std::path::Path;

/// check-config サブコマンドの引数
#[derive(Args, Debug, Clone, Default)]
pub struct CheckConfigArgs {
    /// Print the resolved configuration as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Execute the check-config command
pub async fn execute(args: &CheckConfigArgs, config_path: &Path) -> Result<(), anyhow::Error> {
    let config = load_monitor_config(config_path).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolved_json(&config))?);
    } else {
        print!("{}", render_table(&config));
    }
    Ok(())
}

fn resolved_json(config: &MonitorConfig) -> serde_json::Value {
    let bots: serde_json::Map<String, serde_json::Value> = config
        .bots
        .iter()
        .map(|b| (b.key.clone(), json!({ "bot_uname": b.handle })))
        .collect();
    let channels: serde_json::Map<String, serde_json::Value> = config
        .destinations
        .iter()
        .map(|d| {
            (
                d.key.clone(),
                json!({ "chat_id": d.chat_id, "message_id": d.message_id }),
            )
        })
        .collect();
    json!({
        "bots": bots,
        "channels": channels,
        "settings": config.settings,
    })
}

fn render_table(config: &MonitorConfig) -> String {
    let mut out = format!("Configuration OK ({})\n\n", config.settings.time_zone);
    out.push_str("BOT\tHANDLE\n");
    for bot in &config.bots {
        out.push_str(&format!("{}\t{}\n", bot.key, bot.handle));
    }
    out.push_str("\nCHANNEL\tCHAT\tMESSAGE\n");
    for dest in &config.destinations {
        out.push_str(&format!(
            "{}\t{}\t{}\n",
            dest.key, dest.chat_id, dest.message_id
        ));
    }
    out.push_str(&format!(
        "\nCheck interval: {}s, settle timeout: {}s\n",
        config.settings.check_interval_secs, config.settings.settle_timeout_secs
    ));
    out
}
