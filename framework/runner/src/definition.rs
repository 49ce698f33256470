use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use frame_tunnel_instruments::{
    JsonFileExporter, JsonlExporter, NoopExporter, ReportExporter, SummaryTableExporter,
};
use frame_tunnel_summary_model::{default_scenario_matrix, Scenario};
use itertools::Itertools;
use serde::Deserialize;

use crate::cli::{FrameTunnelCli, ReporterOpt};
use crate::runner::{FailurePolicy, SweepConfig};

pub const DEFAULT_SCENARIO_DURATION_MS: u64 = 5000;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;
pub const DEFAULT_FRAMES_PER_SECOND: u32 = 60;

/// File name used by the `jsonl` reporter inside the output directory.
pub const HISTORY_FILE_NAME: &str = "fps_benchmark_history.jsonl";

/// The builder for a sweep definition.
///
/// This must be used at the start of a sweep to define what you want to run. Values given on the
/// command line take precedence over the defaults set here.
pub struct SweepDefinitionBuilder {
    /// The name of the sweep.
    ///
    /// Recommended value is `env!("CARGO_PKG_NAME")`.
    name: String,
    /// This value is initialised for you and you cannot change it.
    #[doc(hidden)]
    cli: FrameTunnelCli,
    default_duration_ms: u64,
    default_settle_ms: u64,
    default_frames_per_second: u32,
    /// The scenarios to run when no scenario file is given. Uses the built-in matrix if not set.
    scenarios: Option<Vec<Scenario>>,
    failure_policy: FailurePolicy,
    environment: Vec<(String, String)>,
    /// Exporters added in code, used alongside the ones selected on the command line.
    exporters: Vec<Box<dyn ReportExporter>>,
}

pub struct SweepDefinition {
    pub name: String,
    pub run_id: Option<String>,
    pub scenarios: Vec<Scenario>,
    pub config: SweepConfig,
    /// 0 means unpaced
    pub frames_per_second: u32,
    pub extra_environment: Vec<(String, String)>,
    pub exporters: Vec<Box<dyn ReportExporter>>,
    pub no_progress: bool,
}

impl SweepDefinition {
    /// An estimate of how long the sweep will take if every scenario completes.
    pub fn planned_runtime(&self) -> Duration {
        let count = self.scenarios.len() as u32;
        self.config.scenario_duration * count
            + self.config.settle_delay * count.saturating_sub(1)
    }
}

impl SweepDefinitionBuilder {
    /// Initialise a new sweep definition from the sweep name and command line arguments.
    /// See the [SweepDefinitionBuilder::name] for more information about the name.
    pub fn new(name: &str) -> Self {
        Self::new_with_cli(name, crate::init::init())
    }

    /// Initialise a new sweep definition from already parsed arguments. Logging is not set up.
    pub fn new_with_cli(name: &str, cli: FrameTunnelCli) -> Self {
        Self {
            name: name.to_string(),
            cli,
            default_duration_ms: DEFAULT_SCENARIO_DURATION_MS,
            default_settle_ms: DEFAULT_SETTLE_DELAY_MS,
            default_frames_per_second: DEFAULT_FRAMES_PER_SECOND,
            scenarios: None,
            failure_policy: FailurePolicy::Record,
            environment: Vec::new(),
            exporters: Vec::new(),
        }
    }

    /// Set the sample collection window used when `--duration-ms` isn't given.
    pub fn with_default_duration_ms(mut self, duration_ms: u64) -> Self {
        self.default_duration_ms = duration_ms;
        self
    }

    /// Set the pause between scenarios used when `--settle-ms` isn't given.
    pub fn with_default_settle_ms(mut self, settle_ms: u64) -> Self {
        self.default_settle_ms = settle_ms;
        self
    }

    /// Set the frame loop pacing used when `--fps` isn't given.
    pub fn with_default_frame_rate(mut self, frames_per_second: u32) -> Self {
        self.default_frames_per_second = frames_per_second;
        self
    }

    /// Replace the built-in scenario matrix. A `--scenario-file` still takes precedence.
    pub fn use_scenarios(mut self, scenarios: Vec<Scenario>) -> Self {
        self.scenarios = Some(scenarios);
        self
    }

    /// Set the failure policy. `--omit-failures` on the command line overrides this.
    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Add an environment entry to the report. Entries given with `--env` win over these.
    pub fn add_env(mut self, key: &str, value: &str) -> Self {
        self.environment.push((key.to_string(), value.to_string()));
        self
    }

    /// Export the report with this exporter as well as the ones selected on the command line.
    pub fn use_exporter(mut self, exporter: Box<dyn ReportExporter>) -> Self {
        self.exporters.push(exporter);
        self
    }

    pub(crate) fn build(self) -> anyhow::Result<SweepDefinition> {
        let cli = self.cli;

        let scenarios = match &cli.scenario_file {
            Some(path) => load_scenario_file(path)?,
            None => self.scenarios.unwrap_or_else(default_scenario_matrix),
        };
        let scenarios = select_scenarios(scenarios, &cli.scenario)?;
        validate_scenarios(&scenarios)?;

        let duration_ms = cli.duration_ms.unwrap_or(self.default_duration_ms);
        if duration_ms == 0 {
            anyhow::bail!("Scenario duration must be greater than 0ms");
        }

        let failure_policy = if cli.omit_failures {
            FailurePolicy::Omit
        } else {
            self.failure_policy
        };

        let mut exporters = self.exporters;
        for reporter in cli.reporter.iter().copied().unique() {
            exporters.push(exporter_for(reporter, &cli.output_dir));
        }

        let mut extra_environment = self.environment;
        extra_environment.extend(cli.environment);

        Ok(SweepDefinition {
            name: self.name,
            run_id: cli.run_id,
            scenarios,
            config: SweepConfig {
                scenario_duration: Duration::from_millis(duration_ms),
                settle_delay: Duration::from_millis(
                    cli.settle_ms.unwrap_or(self.default_settle_ms),
                ),
                failure_policy,
            },
            frames_per_second: cli.fps.unwrap_or(self.default_frames_per_second),
            extra_environment,
            exporters,
            no_progress: cli.no_progress,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    #[serde(default)]
    scenario: Vec<Scenario>,
}

/// Read a scenario list from a TOML file with one `[[scenario]]` table per scenario.
pub fn load_scenario_file(path: impl AsRef<Path>) -> anyhow::Result<Vec<Scenario>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;

    let file: ScenarioFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse scenario file: {}", path.display()))?;

    log::debug!(
        "Loaded {} scenarios from {}",
        file.scenario.len(),
        path.display()
    );

    Ok(file.scenario)
}

/// Keep only the named scenarios, in their configured order. An empty filter keeps everything.
fn select_scenarios(scenarios: Vec<Scenario>, names: &[String]) -> anyhow::Result<Vec<Scenario>> {
    if names.is_empty() {
        return Ok(scenarios);
    }

    for name in names {
        if !scenarios.iter().any(|s| s.name() == name) {
            anyhow::bail!("Unknown scenario [{name}]");
        }
    }

    Ok(scenarios
        .into_iter()
        .filter(|s| names.iter().any(|n| n == s.name()))
        .collect())
}

fn validate_scenarios(scenarios: &[Scenario]) -> anyhow::Result<()> {
    if scenarios.is_empty() {
        anyhow::bail!("No scenarios to run");
    }

    let mut seen = HashSet::new();
    for scenario in scenarios {
        scenario.validate()?;
        if !seen.insert(scenario.name()) {
            anyhow::bail!("Scenario [{}] is defined more than once", scenario.name());
        }
    }

    Ok(())
}

fn exporter_for(reporter: ReporterOpt, output_dir: &Path) -> Box<dyn ReportExporter> {
    match reporter {
        ReporterOpt::Table => Box::new(SummaryTableExporter),
        ReporterOpt::JsonFile => Box::new(JsonFileExporter::new(output_dir.to_path_buf())),
        ReporterOpt::Jsonl => Box::new(JsonlExporter::new(
            PathBuf::from(output_dir).join(HISTORY_FILE_NAME),
        )),
        ReporterOpt::Noop => Box::new(NoopExporter),
    }
}
