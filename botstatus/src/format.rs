//! Human-readable rendering of durations, byte sizes and ratios.
//!
//! Pure functions with no I/O; used by the report builder and cycle logs.

use std::fmt::Write;
use std::time::Duration;

/// Units used by [`format_duration`], largest first, in milliseconds.
const PERIODS: [(&str, u128); 5] = [
    ("d", 86_400_000),
    ("h", 3_600_000),
    ("m", 60_000),
    ("s", 1_000),
    ("ms", 1),
];

/// Units used by [`format_size`].
const SIZE_UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];

/// Default number of segments in [`format_progress_bar`].
pub const DEFAULT_PROGRESS_WIDTH: usize = 12;

const FILLED_GLYPH: char = '●';
const EMPTY_GLYPH: char = '○';

/// Render a duration as its non-zero components, e.g. `1h5m3s` or `2s350ms`.
///
/// Sub-millisecond precision is dropped; anything below 1ms renders as `0ms`.
pub fn format_duration(d: Duration) -> String {
    let mut remaining = d.as_millis();
    let mut out = String::new();

    for (name, unit) in PERIODS {
        if remaining >= unit {
            let value = remaining / unit;
            remaining %= unit;
            let _ = write!(out, "{}{}", value, name);
        }
    }

    if out.is_empty() {
        "0ms".to_string()
    } else {
        out
    }
}

/// Render a byte count scaled by 1024 into the largest unit where the value is at least 1.
///
/// The base unit renders as an integer (`512B`), larger units with two decimals
/// (`1.50KB`). `None` renders as `0B`.
pub fn format_size(bytes: Option<u64>) -> String {
    let Some(bytes) = bytes else {
        return "0B".to_string();
    };

    let index = size_unit_index(bytes);
    if index == 0 {
        return format!("{}B", bytes);
    }

    let value = bytes as f64 / 1024f64.powi(index as i32);
    format!("{:.2}{}", value, SIZE_UNITS[index])
}

/// Index into the unit table for `bytes`: `floor(log1024(bytes))`, clamped to the table.
fn size_unit_index(bytes: u64) -> usize {
    let mut scaled = bytes;
    let mut index = 0;
    while scaled >= 1024 && index < SIZE_UNITS.len() - 1 {
        scaled /= 1024;
        index += 1;
    }
    index
}

/// Render `current / total` as a fixed-width bar followed by the percentage.
///
/// The percentage is clamped to `[0, 100]`; `total == 0` renders as 0%.
/// A segment is filled for every whole `100 / width` percent.
pub fn format_progress_bar(current: u64, total: u64, width: usize) -> String {
    let pct = if total == 0 {
        0.0
    } else {
        (current as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
    };

    let step = (100 / width.max(1)).max(1);
    let filled = (pct as usize / step).min(width);

    let mut bar = String::with_capacity(width * FILLED_GLYPH.len_utf8() + 12);
    bar.push('[');
    bar.extend(std::iter::repeat(FILLED_GLYPH).take(filled));
    bar.extend(std::iter::repeat(EMPTY_GLYPH).take(width - filled));
    let _ = write!(bar, "] {:.2}%", pct);
    bar
}
