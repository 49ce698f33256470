mod collector;
mod report;
mod stats;

pub use collector::{CollectedSamples, SampleCollector};
pub use report::{
    export_all, render_summary, InMemoryExporter, JsonFileExporter, JsonlExporter, NoopExporter,
    ReportExporter, SummaryTableExporter,
};
pub use stats::reduce;
