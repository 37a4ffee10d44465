//! Terminal rendering for snapshots and service replies.

use chrono::{DateTime, NaiveDateTime};
use scrivo_core::{HistoryEntry, ServiceHealth, Transcription};

/// Print a completed transcription: header line, full text, and optionally
/// per-segment timings.
pub fn transcription(result: &Transcription, show_segments: bool) {
    println!(
        "{} [{}] ({} model)",
        result.filename, result.language, result.model_size
    );
    println!();
    println!("{}", result.text.trim());
    if show_segments && !result.segments.is_empty() {
        println!();
        for segment in &result.segments {
            println!(
                "  {} - {}  {}",
                format_clock(segment.start),
                format_clock(segment.end),
                segment.text.trim()
            );
        }
    }
}

pub fn history(entries: &[HistoryEntry]) {
    for entry in entries {
        println!(
            "{}  {}  [{}] {}  {}",
            format_timestamp(&entry.timestamp),
            entry.filename,
            entry.language,
            entry.model_size,
            summarize(&entry.text, 60)
        );
    }
}

pub fn health(health: &ServiceHealth) {
    println!(
        "status: {} (service time {})",
        health.status,
        format_timestamp(&health.timestamp)
    );
}

/// `mm:ss.cc` clock for a segment boundary in seconds.
fn format_clock(seconds: f32) -> String {
    let total = seconds.max(0.0) as f64;
    let minutes = (total / 60.0).floor() as u64;
    format!("{minutes:02}:{:05.2}", total - minutes as f64 * 60.0)
}

/// Service timestamps are ISO instants; the backend omits the zone
/// designator, so fall back to a naive parse and then to the raw string.
fn format_timestamp(raw: &str) -> String {
    const DISPLAY: &str = "%Y-%m-%d %H:%M";
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format(DISPLAY).to_string())
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|dt| dt.format(DISPLAY).to_string())
        })
        .unwrap_or_else(|_| raw.to_string())
}

fn summarize(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_formats_minutes_and_fractional_seconds() {
        assert_eq!(format_clock(0.0), "00:00.00");
        assert_eq!(format_clock(1.2), "00:01.20");
        assert_eq!(format_clock(75.5), "01:15.50");
        assert_eq!(format_clock(-3.0), "00:00.00");
    }

    #[test]
    fn timestamps_parse_with_and_without_a_zone_designator() {
        assert_eq!(format_timestamp("2024-01-01T00:00:00Z"), "2024-01-01 00:00");
        assert_eq!(
            format_timestamp("2024-01-01T12:30:45.123456"),
            "2024-01-01 12:30"
        );
        assert_eq!(format_timestamp("not a timestamp"), "not a timestamp");
    }

    #[test]
    fn summaries_are_truncated_with_an_ellipsis() {
        assert_eq!(summarize("short", 60), "short");
        let long = "a".repeat(80);
        let summary = summarize(&long, 60);
        assert_eq!(summary.chars().count(), 63);
        assert!(summary.ends_with("..."));
    }
}
