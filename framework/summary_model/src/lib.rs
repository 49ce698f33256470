use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha3::Digest;
use std::collections::BTreeMap;
use std::io::{BufRead, Read, Write};
use std::path::Path;

mod result;
mod scenario;

pub use result::{FrameStats, ScenarioFailure, ScenarioResult};
pub use scenario::{default_scenario_matrix, Scenario, DEFAULT_POINT_COUNT};

/// Report of a full scenario sweep
///
/// Created once when a sweep ends, either because every scenario ran or because the sweep was
/// aborted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// The unique run id
    ///
    /// Chosen by the runner. Unique for each run.
    pub run_id: String,
    /// The name of the sweep that was run
    pub sweep_name: String,
    /// The time the report was captured, serialized as an ISO-8601 timestamp
    pub captured_at: DateTime<Utc>,
    /// Free-form description of the environment the sweep ran in
    ///
    /// Populated by the runner with platform details plus any entries supplied by the user.
    pub environment: BTreeMap<String, String>,
    /// The observation window each scenario was configured with
    pub scenario_duration_ms: f64,
    /// The unmeasured pause between scenarios
    pub settle_delay_ms: f64,
    /// Whether the sweep was aborted before every scenario ran
    ///
    /// An aborted report is still valid. It holds the scenarios that completed before the abort
    /// and never the one that was in progress.
    pub aborted: bool,
    /// Completed scenarios, in the order they ran
    pub results: Vec<ScenarioResult>,
    /// Scenarios terminated by a render target failure, if the runner was asked to keep them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ScenarioFailure>,
}

impl RunReport {
    /// Find the result for a scenario by name
    pub fn result(&self, scenario_name: &str) -> Option<&ScenarioResult> {
        self.results
            .iter()
            .find(|r| r.scenario_name == scenario_name)
    }

    /// Compute a fingerprint for this report
    ///
    /// The fingerprint is intended to identify the configuration used to run the sweep, so that
    /// reports which can be compared with each other share a fingerprint. It uses the
    ///     - Sweep name
    ///     - Scenario duration and settle delay
    ///     - Configuration of each scenario that ran, completed or failed
    ///     - Environment entries
    ///
    /// The fingerprint is computed using [sha3::Sha3_256].
    pub fn fingerprint(&self) -> String {
        let mut hasher = sha3::Sha3_256::new();
        Digest::update(&mut hasher, self.sweep_name.as_bytes());
        Digest::update(&mut hasher, self.scenario_duration_ms.to_le_bytes());
        Digest::update(&mut hasher, self.settle_delay_ms.to_le_bytes());
        self.results
            .iter()
            .map(|r| &r.scenario)
            .chain(self.failures.iter().map(|f| &f.scenario))
            .for_each(|scenario| hash_scenario(&mut hasher, scenario));
        self.environment.iter().for_each(|(k, v)| {
            Digest::update(&mut hasher, k.as_bytes());
            Digest::update(&mut hasher, v.as_bytes());
        });

        format!("{:x}", hasher.finalize())
    }
}

fn hash_scenario(hasher: &mut sha3::Sha3_256, scenario: &Scenario) {
    Digest::update(hasher, scenario.name().as_bytes());
    if let Some(lod_level) = scenario.lod_level() {
        Digest::update(hasher, b"lod");
        Digest::update(hasher, lod_level.to_le_bytes());
    }
    if let Some(point_count) = scenario.point_count() {
        Digest::update(hasher, b"points");
        Digest::update(hasher, point_count.to_le_bytes());
    }
    if let Some(zoom) = scenario.zoom() {
        Digest::update(hasher, b"zoom");
        Digest::update(hasher, zoom.to_le_bytes());
    }
    Digest::update(hasher, [scenario.rotation_enabled() as u8]);
}

/// Append the run report to a file
///
/// The report will be serialized to JSON and output as a single line followed by a newline. The
/// recommended file extension is `.jsonl`.
pub fn append_run_report(run_report: &RunReport, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    store_run_report(run_report, &mut file)?;
    file.write_all("\n".as_bytes())?;
    Ok(())
}

/// Serialize the run report to a writer
pub fn store_run_report<W: Write>(run_report: &RunReport, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer(writer, run_report)?;
    Ok(())
}

/// Load a run report from a reader
pub fn load_run_report<R: Read>(reader: R) -> anyhow::Result<RunReport> {
    let reader = std::io::BufReader::new(reader);
    let run_report: RunReport = serde_json::from_reader(reader)?;
    Ok(run_report)
}

/// Load run reports from a file
///
/// The file should contain one JSON object per line. This is the format produced by
/// [append_run_report].
pub fn load_run_reports(path: impl AsRef<Path>) -> anyhow::Result<Vec<RunReport>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut runs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let run: RunReport = serde_json::from_str(&line)?;
        runs.push(run);
    }
    Ok(runs)
}
