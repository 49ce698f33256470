use crate::report::ReportExporter;
use anyhow::Context;
use frame_tunnel_summary_model::{append_run_report, RunReport};
use std::path::PathBuf;

/// Appends each report as one JSON line to a history file, for comparing runs over time.
#[derive(Debug, Clone)]
pub struct JsonlExporter {
    path: PathBuf,
}

impl JsonlExporter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ReportExporter for JsonlExporter {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn export(&self, report: &RunReport) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        append_run_report(report, &self.path)
            .with_context(|| format!("Failed to append report to {}", self.path.display()))?;
        log::info!(
            "Appended report {} ({}) to {}",
            report.run_id,
            report.fingerprint(),
            self.path.display()
        );

        Ok(())
    }
}
