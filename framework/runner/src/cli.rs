use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ReporterOpt {
    /// Print a summary table to stdout
    Table,
    /// Write the report to a new `fps_benchmark_<timestamp>.json` file in the output directory
    JsonFile,
    /// Append the report to `fps_benchmark_history.jsonl` in the output directory
    Jsonl,
    /// Don't export the report anywhere
    Noop,
}

#[derive(Debug, Parser)]
#[command(about, long_about = None)]
pub struct FrameTunnelCli {
    /// How long to collect frame samples for each scenario, in milliseconds
    #[clap(long)]
    pub duration_ms: Option<u64>,

    /// How long to pause between scenarios, in milliseconds. Nothing is measured while settling.
    #[clap(long)]
    pub settle_ms: Option<u64>,

    /// The frame rate to pace the frame loop at. Use 0 to deliver frames back-to-back.
    #[clap(long)]
    pub fps: Option<u32>,

    /// Only run the named scenarios. Can be given multiple times, scenarios still run in their
    /// configured order.
    ///
    /// Naming a scenario that doesn't exist is an error.
    #[clap(long)]
    pub scenario: Vec<String>,

    /// Load the scenario list from a TOML file instead of using the built-in list.
    ///
    /// The file should contain one `[[scenario]]` table per scenario, for example:
    ///
    /// [[scenario]]
    /// name = "LOD 0 - High Detail"
    /// lodLevel = 0
    /// pointCount = 100000
    #[clap(long)]
    pub scenario_file: Option<PathBuf>,

    /// Where to send the report. Can be given multiple times to use several reporters.
    #[clap(long, value_enum, default_value = "table")]
    pub reporter: Vec<ReporterOpt>,

    /// The directory that file based reporters write to
    #[clap(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Extra environment details to include in the report, in the format `KEY=VALUE`.
    ///
    /// For example `--env gpu=integrated --env build=release`.
    #[clap(long = "env", value_parser = parse_env_entry)]
    pub environment: Vec<(String, String)>,

    /// Leave failed scenarios out of the report instead of recording them as failures
    #[clap(long, default_value = "false")]
    pub omit_failures: bool,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't being looked at by anyone and is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,

    /// Use a fixed run id instead of generating one
    #[clap(long)]
    pub run_id: Option<String>,
}

fn parse_env_entry(s: &str) -> anyhow::Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or(anyhow::anyhow!("Expected KEY=VALUE but got [{s}]"))?;

    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("No key specified for environment entry [{s}]");
    }

    Ok((key.to_string(), value.trim().to_string()))
}
