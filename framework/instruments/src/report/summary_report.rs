mod scenario_table;

use crate::report::summary_report::scenario_table::{FailureRow, ScenarioRow};
use crate::report::ReportExporter;
use frame_tunnel_summary_model::RunReport;
use std::fmt::Write;
use tabled::settings::Style;
use tabled::Table;

/// Prints a table of per-scenario results to stdout. This is the default exporter for interactive
/// runs.
#[derive(Debug, Default)]
pub struct SummaryTableExporter;

impl SummaryTableExporter {
    pub fn new() -> Self {
        Self
    }
}

impl ReportExporter for SummaryTableExporter {
    fn name(&self) -> &str {
        "table"
    }

    fn export(&self, report: &RunReport) -> anyhow::Result<()> {
        println!("{}", render_summary(report));
        Ok(())
    }
}

/// Render the human readable summary of a report.
pub fn render_summary(report: &RunReport) -> String {
    let mut out = String::new();

    // Writing to a String can't fail
    let _ = writeln!(out, "\nFrame performance report: {} ({})", report.sweep_name, report.run_id);
    let _ = writeln!(
        out,
        "Captured at {}",
        report.captured_at.format("%Y-%m-%dT%H:%M:%S%.3fZ")
    );
    if report.aborted {
        let _ = writeln!(out, "Sweep was aborted, only completed scenarios are shown");
    }

    let rows = report
        .results
        .iter()
        .map(|result| ScenarioRow {
            scenario_name: result.scenario_name.clone(),
            avg_fps: result.stats.avg_fps,
            avg_frame_time_ms: result.stats.avg_frame_time_ms,
            min_frame_time_ms: result.stats.min_frame_time_ms,
            max_frame_time_ms: result.stats.max_frame_time_ms,
            p95_frame_time_ms: result.stats.p95_frame_time_ms,
            p99_frame_time_ms: result.stats.p99_frame_time_ms,
            total_frames: result.stats.total_frames,
        })
        .collect::<Vec<_>>();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    let _ = writeln!(out, "{table}");

    if !report.failures.is_empty() {
        let rows = report
            .failures
            .iter()
            .map(|failure| FailureRow {
                scenario_name: failure.scenario_name.clone(),
                frames_rendered: failure.frames_rendered,
                error: failure.error.clone(),
            })
            .collect::<Vec<_>>();

        let mut table = Table::new(&rows);
        table.with(Style::modern());
        let _ = writeln!(out, "\nFailed scenarios");
        let _ = writeln!(out, "{table}");
    }

    out
}
