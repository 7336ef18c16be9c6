//! Report table rendering.
//!
//! Renders vulnerability reports as kubectl-style tables with
//! per-severity counts and human-readable ages.

use chrono::{DateTime, Utc};
use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::k8s::report::VulnerabilityReport;

/// Row for the default report table.
#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "REPOSITORY")]
    repository: String,
    #[tabled(rename = "TAG")]
    tag: String,
    #[tabled(rename = "SCANNER")]
    scanner: String,
    #[tabled(rename = "CRITICAL")]
    critical: String,
    #[tabled(rename = "HIGH")]
    high: String,
    #[tabled(rename = "MEDIUM")]
    medium: String,
    #[tabled(rename = "LOW")]
    low: String,
    #[tabled(rename = "AGE")]
    age: String,
}

/// Row for the wide report table.
#[derive(Tabled)]
struct WideReportRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "REPOSITORY")]
    repository: String,
    #[tabled(rename = "TAG")]
    tag: String,
    #[tabled(rename = "SCANNER")]
    scanner: String,
    #[tabled(rename = "CRITICAL")]
    critical: String,
    #[tabled(rename = "HIGH")]
    high: String,
    #[tabled(rename = "MEDIUM")]
    medium: String,
    #[tabled(rename = "LOW")]
    low: String,
    #[tabled(rename = "UNKNOWN")]
    unknown: String,
    #[tabled(rename = "CONTAINER")]
    container: String,
    #[tabled(rename = "DIGEST")]
    digest: String,
    #[tabled(rename = "AGE")]
    age: String,
}

/// Severity level used to pick a count color.
#[derive(Debug, Clone, Copy)]
enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

/// Render reports as a table. Returns `None` when there is nothing to show.
pub fn render(
    reports: &[VulnerabilityReport],
    wide: bool,
    color: bool,
    now: DateTime<Utc>,
) -> Option<String> {
    if reports.is_empty() {
        return None;
    }

    let mut table = if wide {
        let rows: Vec<WideReportRow> = reports
            .iter()
            .map(|r| {
                let counts = r.report.counts();
                WideReportRow {
                    name: r.name().to_string(),
                    repository: dash_if_empty(r.report.repository()),
                    tag: dash_if_empty(r.report.tag()),
                    scanner: dash_if_empty(r.report.scanner_name()),
                    critical: format_count(counts.critical, Severity::Critical, color),
                    high: format_count(counts.high, Severity::High, color),
                    medium: format_count(counts.medium, Severity::Medium, color),
                    low: format_count(counts.low, Severity::Low, color),
                    unknown: format_count(counts.unknown, Severity::Unknown, color),
                    container: r.container_name().unwrap_or("-").to_string(),
                    digest: dash_if_empty(r.report.digest()),
                    age: report_age(r, now),
                }
            })
            .collect();
        Table::new(&rows)
    } else {
        let rows: Vec<ReportRow> = reports
            .iter()
            .map(|r| {
                let counts = r.report.counts();
                ReportRow {
                    name: r.name().to_string(),
                    repository: dash_if_empty(r.report.repository()),
                    tag: dash_if_empty(r.report.tag()),
                    scanner: dash_if_empty(r.report.scanner_name()),
                    critical: format_count(counts.critical, Severity::Critical, color),
                    high: format_count(counts.high, Severity::High, color),
                    medium: format_count(counts.medium, Severity::Medium, color),
                    low: format_count(counts.low, Severity::Low, color),
                    age: report_age(r, now),
                }
            })
            .collect();
        Table::new(&rows)
    };

    apply_table_style(&mut table);

    // cells are padded to column width; kubectl rows carry no trailing blanks
    let rendered = table
        .to_string()
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    Some(rendered)
}

fn dash_if_empty(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

/// Format a severity count, colored when non-zero and color is enabled.
fn format_count(count: i64, severity: Severity, color: bool) -> String {
    let text = count.to_string();
    if !color || count == 0 {
        return text;
    }

    match severity {
        Severity::Critical => text.red().bold().to_string(),
        Severity::High => text.red().to_string(),
        Severity::Medium => text.yellow().to_string(),
        Severity::Low | Severity::Unknown => text,
    }
}

/// Age of the report relative to `now`.
fn report_age(report: &VulnerabilityReport, now: DateTime<Utc>) -> String {
    match &report.metadata.creation_timestamp {
        Some(created) => human_duration(now.signed_duration_since(created.0)),
        None => "<unknown>".to_string(),
    }
}

/// Format a duration the way kubectl prints resource ages.
///
/// Examples: `45s`, `5m30s`, `2h15m`, `26h`, `3d4h`, `120d`, `2y45d`.
pub fn human_duration(d: chrono::Duration) -> String {
    let seconds = d.num_seconds();
    if seconds < -1 {
        return "<invalid>".to_string();
    } else if seconds < 0 {
        return "0s".to_string();
    } else if seconds < 60 * 2 {
        return format!("{}s", seconds);
    }

    let minutes = d.num_minutes();
    if minutes < 10 {
        let s = seconds % 60;
        if s == 0 {
            return format!("{}m", minutes);
        }
        return format!("{}m{}s", minutes, s);
    } else if minutes < 60 * 3 {
        return format!("{}m", minutes);
    }

    let hours = d.num_hours();
    if hours < 8 {
        let m = minutes % 60;
        if m == 0 {
            return format!("{}h", hours);
        }
        return format!("{}h{}m", hours, m);
    } else if hours < 48 {
        return format!("{}h", hours);
    } else if hours < 24 * 8 {
        let h = hours % 24;
        if h == 0 {
            return format!("{}d", hours / 24);
        }
        return format!("{}d{}h", hours / 24, h);
    } else if hours < 24 * 365 * 2 {
        return format!("{}d", hours / 24);
    } else if hours < 24 * 365 * 8 {
        let dy = (hours / 24) % 365;
        if dy == 0 {
            return format!("{}y", hours / 24 / 365);
        }
        return format!("{}y{}d", hours / 24 / 365, dy);
    }

    format!("{}y", hours / 24 / 365)
}

/// Apply kubectl-style table formatting: no borders, no separators, 3-space column gap.
fn apply_table_style(table: &mut Table) {
    use tabled::settings::object::Columns;
    use tabled::settings::themes::Theme;
    use tabled::settings::{Modify, Padding};

    let mut theme = Theme::from_style(Style::empty());
    theme.remove_horizontal_lines();
    table.with(theme);
    table.with(Modify::new(Columns::new(..)).with(Padding::new(0, 3, 0, 0)));
    table.with(Modify::new(Columns::last()).with(Padding::zero()));
}
