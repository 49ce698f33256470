use crate::report::ReportExporter;
use anyhow::Context;
use frame_tunnel_summary_model::RunReport;
use std::fs::File;
use std::path::PathBuf;

/// Writes each report to its own pretty printed JSON file in a directory.
///
/// Files are named `fps_benchmark_<captured at>.json` and an existing file is never overwritten.
#[derive(Debug, Clone)]
pub struct JsonFileExporter {
    dir: PathBuf,
}

impl JsonFileExporter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn file_path(&self, report: &RunReport) -> PathBuf {
        self.dir.join(format!(
            "fps_benchmark_{}.json",
            report.captured_at.format("%Y-%m-%dT%H.%M.%S%.fZ")
        ))
    }
}

impl ReportExporter for JsonFileExporter {
    fn name(&self) -> &str {
        "json-file"
    }

    fn export(&self, report: &RunReport) -> anyhow::Result<()> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir)
                .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        }

        let path = self.file_path(report);
        let file = File::create_new(&path)
            .with_context(|| format!("Failed to create report file {}", path.display()))?;
        serde_json::to_writer_pretty(file, report)?;

        log::info!("Wrote report to {}", path.display());

        Ok(())
    }
}
