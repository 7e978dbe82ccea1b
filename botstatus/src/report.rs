//! Status report aggregation
//!
//! Turns one cycle's probe results into the HTML message published to every
//! destination. Bot lines keep configuration order, so two cycles with the same
//! results render identical text apart from the timestamp footer.

use crate::format::{format_duration, format_progress_bar, DEFAULT_PROGRESS_WIDTH};
use crate::platform::MessagingPlatform;
use botstatus_common::config::MonitorSettings;
use botstatus_common::error::CommonError;
use botstatus_common::types::{BotEntry, ProbeResult};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fmt::Write;
use tracing::debug;

/// Formatted report for one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Header line (HTML)
    pub header: String,
    /// Reachable bot count
    pub reachable: usize,
    /// Probed bot count
    pub total: usize,
    /// Availability bar, when enabled
    pub progress_bar: Option<String>,
    /// One rendered line per bot, in configuration order
    pub lines: Vec<String>,
    /// Generation time in the configured zone
    pub generated_at: DateTime<Tz>,
    /// Zone label shown in the footer
    pub time_zone: String,
    /// Refresh cadence stated in the footer
    pub refresh_minutes: u64,
}

impl CycleReport {
    /// Everything above the timestamp footer
    pub fn body(&self) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "{}\n\n• <b>Available Bots :</b> {} out of {}\n",
            self.header, self.reachable, self.total
        );
        if let Some(bar) = &self.progress_bar {
            let _ = writeln!(out, "{}", bar);
        }
        out.push_str("\n<blockquote>");
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("</blockquote>\n");
        out
    }

    /// Timestamp footer and refresh notice
    pub fn footer(&self) -> String {
        format!(
            "--Last checked on--: \n{}\n{} ({})\n\n<b>Refreshes Automatically After Every {} Min.</b>",
            self.generated_at.format("%d %b %Y"),
            self.generated_at.format("%I:%M %p"),
            self.time_zone,
            self.refresh_minutes
        )
    }

    /// Full message text
    pub fn render(&self) -> String {
        let mut out = self.body();
        out.push_str(&self.footer());
        out
    }
}

/// Builds [`CycleReport`]s from probe results.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    header: String,
    tz: Tz,
    time_zone: String,
    refresh_minutes: u64,
    show_response_time: bool,
    show_progress_bar: bool,
}

impl ReportBuilder {
    /// Create a builder from settings; fails on an unknown time zone.
    pub fn new(settings: &MonitorSettings) -> Result<Self, CommonError> {
        Ok(Self {
            header: settings.header.clone(),
            tz: settings.tz()?,
            time_zone: settings.time_zone.clone(),
            refresh_minutes: settings.refresh_minutes(),
            show_response_time: settings.show_response_time,
            show_progress_bar: settings.show_progress_bar,
        })
    }

    /// Aggregate `results` into a report generated at `now`.
    ///
    /// Display names are resolved per bot; a failed or empty resolution falls
    /// back to the bot's handle.
    pub async fn build(
        &self,
        results: &[(BotEntry, ProbeResult)],
        resolver: &dyn MessagingPlatform,
        now: DateTime<Utc>,
    ) -> CycleReport {
        let total = results.len();
        let reachable = results.iter().filter(|(_, r)| r.is_reachable()).count();

        let mut lines = Vec::with_capacity(total);
        for (bot, result) in results {
            let name = match resolver.resolve_display_name(&bot.handle).await {
                Ok(name) if !name.trim().is_empty() => name,
                Ok(_) => bot.handle.clone(),
                Err(e) => {
                    debug!(bot = %bot.handle, error = %e, "Display name lookup failed");
                    bot.handle.clone()
                }
            };
            lines.push(self.render_line(&name, result));
        }

        CycleReport {
            header: self.header.clone(),
            reachable,
            total,
            progress_bar: self.show_progress_bar.then(|| {
                format_progress_bar(reachable as u64, total as u64, DEFAULT_PROGRESS_WIDTH)
            }),
            lines,
            generated_at: now.with_timezone(&self.tz),
            time_zone: self.time_zone.clone(),
            refresh_minutes: self.refresh_minutes,
        }
    }

    fn render_line(&self, name: &str, result: &ProbeResult) -> String {
        let mut line = format!(
            "- <b>{}: {}</b>",
            escape_html(name),
            result.status().symbol()
        );
        if self.show_response_time {
            if let Some(latency) = result.latency() {
                let _ = write!(line, " <code>{}</code>", format_duration(latency));
            }
        }
        line
    }
}

/// Escape text for the platform's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
