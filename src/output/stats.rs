//! Crawl and report statistics
//!
//! This module formats the end-of-run summary (why the run stopped, how
//! much was visited and transferred) and the per-status counts of a report.

use crate::crawler::CrawlSummary;
use crate::output::report::RunReport;
use crate::output::status::NodeStatus;

/// Human-readable byte count
pub fn format_bytes(bytes: f64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{:.0} {}", value, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Formats the summary printed when a crawl run ends
pub fn format_crawl_summary(summary: &CrawlSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== Spider Run {} ===\n\n", summary.run_id));
    out.push_str(&format!("Stopped: {}\n", summary.stop_reason));
    out.push_str(&format!("  URLs known: {}\n", summary.known));
    out.push_str(&format!("  URLs visited: {}\n", summary.visited));
    out.push_str(&format!("  URLs fetched: {}\n", summary.fetched));
    out.push_str(&format!(
        "  Transferred: {} in {:.1}s ({}/s)\n",
        format_bytes(summary.bytes as f64),
        summary.elapsed.as_secs_f64(),
        format_bytes(summary.throughput())
    ));
    out
}

/// Prints the end-of-run summary to stdout
pub fn print_crawl_summary(summary: &CrawlSummary) {
    print!("{}", format_crawl_summary(summary));
}

/// Formats per-status counts of a report, in legend order
pub fn format_status_counts(report: &RunReport) -> String {
    let counts = report.status_counts();
    let total = report.nodes.len();

    let mut out = format!("Run {}: {} URLs\n", report.run.id, total);
    for status in NodeStatus::ALL {
        let count = counts.get(&status).copied().unwrap_or(0);
        if count == 0 {
            continue;
        }
        let percentage = (count as f64 / total as f64) * 100.0;
        out.push_str(&format!("  {}: {} ({:.1}%)\n", status, count, percentage));
    }
    out
}
