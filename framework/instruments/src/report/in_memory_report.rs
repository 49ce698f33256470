use crate::report::ReportExporter;
use frame_tunnel_summary_model::RunReport;
use parking_lot::Mutex;
use std::sync::Arc;

/// Keeps every exported report in memory. Clones share the same storage so a caller can keep a
/// clone and inspect what was exported.
#[derive(Debug, Clone, Default)]
pub struct InMemoryExporter {
    reports: Arc<Mutex<Vec<RunReport>>>,
}

impl InMemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<RunReport> {
        self.reports.lock().clone()
    }
}

impl ReportExporter for InMemoryExporter {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn export(&self, report: &RunReport) -> anyhow::Result<()> {
        self.reports.lock().push(report.clone());
        Ok(())
    }
}
