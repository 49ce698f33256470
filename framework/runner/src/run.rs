use anyhow::Context;
use frame_tunnel_core::prelude::MonotonicClock;
use frame_tunnel_instruments::export_all;
use frame_tunnel_summary_model::RunReport;

use crate::definition::SweepDefinitionBuilder;
use crate::environment;
use crate::progress::start_progress;
use crate::runner::ScenarioRunner;
use crate::scheduler::FrameLoop;
use crate::shutdown::start_abort_listener;
use crate::target::RenderTarget;

/// Run a sweep against `target` and export the report.
///
/// Frames are delivered by a headless [FrameLoop] paced at the configured frame rate and timed
/// with a [MonotonicClock]. Pressing Ctrl-C aborts the sweep, the scenarios that had completed are
/// still reported.
///
/// Exporter failures are logged but do not fail the run. The report is returned either way.
pub fn run<T: RenderTarget>(
    definition: SweepDefinitionBuilder,
    target: T,
) -> anyhow::Result<RunReport> {
    let definition = definition.build()?;

    log::info!("Running sweep: {}", definition.name);

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let abort_handle = start_abort_listener(&runtime);

    let environment = environment::capture(&definition.extra_environment);
    let mut frame_loop = FrameLoop::paced(definition.frames_per_second)
        .with_abort_listener(abort_handle.new_listener());
    log::debug!("Frame interval: {:?}", frame_loop.frame_interval());

    let mut runner = ScenarioRunner::new(
        &definition.name,
        target,
        MonotonicClock::new(),
        definition.config.clone(),
    )
    .with_abort_handle(abort_handle);
    if let Some(run_id) = &definition.run_id {
        runner = runner.with_run_id(run_id.clone());
    }

    let progress = if definition.no_progress {
        None
    } else {
        Some(start_progress(definition.planned_runtime())?)
    };

    let report = runner.run_sweep(&mut frame_loop, &definition.scenarios, environment);

    if let Some(progress) = progress {
        progress.finish();
    }

    let report = report?;
    if report.aborted {
        log::warn!(
            "Sweep was aborted, {} of {} scenarios completed",
            report.results.len(),
            definition.scenarios.len()
        );
    }

    let failed = export_all(&definition.exporters, &report);
    if failed > 0 {
        log::warn!("{failed} report exporters failed");
    }

    Ok(report)
}
