mod in_memory_report;
mod json_file_report;
mod jsonl_report;
mod summary_report;

use frame_tunnel_summary_model::RunReport;

pub use in_memory_report::InMemoryExporter;
pub use json_file_report::JsonFileExporter;
pub use jsonl_report::JsonlExporter;
pub use summary_report::{render_summary, SummaryTableExporter};

/// The boundary between the harness and wherever reports end up.
///
/// The harness only hands over a finished [RunReport]. Persisting or displaying it is entirely up
/// to the exporter.
pub trait ReportExporter: Send + Sync {
    /// A short name for log messages
    fn name(&self) -> &str;

    fn export(&self, report: &RunReport) -> anyhow::Result<()>;
}

/// Discards reports. Useful when the caller only wants the returned [RunReport].
#[derive(Debug, Default)]
pub struct NoopExporter;

impl ReportExporter for NoopExporter {
    fn name(&self) -> &str {
        "noop"
    }

    fn export(&self, _report: &RunReport) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Hand a report to every exporter.
///
/// A failing exporter does not stop the others. Failures are logged and counted, the number of
/// failed exporters is returned.
pub fn export_all(exporters: &[Box<dyn ReportExporter>], report: &RunReport) -> usize {
    let mut failed = 0;
    for exporter in exporters {
        match exporter.export(report) {
            Ok(()) => log::debug!("Exported report {} with {}", report.run_id, exporter.name()),
            Err(e) => {
                failed += 1;
                log::warn!("Failed to export report with {}: {:?}", exporter.name(), e);
            }
        }
    }
    failed
}
