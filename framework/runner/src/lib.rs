mod cli;
mod definition;
mod environment;
mod init;
mod progress;
mod run;
mod runner;
mod scheduler;
mod shutdown;
mod target;
mod types;

pub mod prelude {
    pub use crate::cli::{FrameTunnelCli, ReporterOpt};
    pub use crate::definition::{
        load_scenario_file, SweepDefinition, SweepDefinitionBuilder, DEFAULT_FRAMES_PER_SECOND,
        DEFAULT_SCENARIO_DURATION_MS, DEFAULT_SETTLE_DELAY_MS, HISTORY_FILE_NAME,
    };
    pub use crate::run::run;
    pub use crate::runner::{FailurePolicy, ScenarioRunner, SweepConfig};
    pub use crate::scheduler::{FrameCallback, FrameHost, FrameLoop, FrameScheduler};
    pub use crate::target::RenderTarget;
    pub use crate::types::FrameTunnelResult;

    pub use frame_tunnel_core::prelude::*;
    pub use frame_tunnel_instruments::{
        InMemoryExporter, JsonFileExporter, JsonlExporter, NoopExporter, ReportExporter,
        SummaryTableExporter,
    };
    pub use frame_tunnel_summary_model::{
        default_scenario_matrix, FrameStats, RunReport, Scenario, ScenarioFailure, ScenarioResult,
    };
}
