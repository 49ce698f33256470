use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use frame_tunnel_core::prelude::{AbortHandle, AbortListener, Clock, InvalidStateError};
use frame_tunnel_instruments::{reduce, SampleCollector};
use frame_tunnel_summary_model::{RunReport, Scenario, ScenarioFailure, ScenarioResult};

use crate::scheduler::{FrameCallback, FrameHost, FrameScheduler};
use crate::target::RenderTarget;

/// What to do with a scenario that was terminated by a render target failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Keep a [ScenarioFailure] placeholder in the report
    #[default]
    Record,
    /// Log the failure and leave the scenario out of the report
    Omit,
}

#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// How long samples are collected for each scenario
    pub scenario_duration: Duration,
    /// Unmeasured pause before each scenario after the first
    pub settle_delay: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            scenario_duration: Duration::from_millis(5000),
            settle_delay: Duration::from_millis(1000),
            failure_policy: FailurePolicy::Record,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    /// The first scenario is configured on the first delivered frame
    Ready,
    Sampling { index: usize, frames: usize },
    Settling { next_index: usize, until_ms: f64 },
    Finished,
}

/// Runs an ordered list of scenarios against a render target, one at a time.
///
/// For each scenario the runner applies its configuration to the target, then on every frame
/// delivered by the [FrameHost] it times one call to [RenderTarget::render_frame] and records the
/// duration. Once the scenario's observation window has elapsed the samples are reduced into a
/// [ScenarioResult] and, after the settle delay, the next scenario is configured.
///
/// Aborting through [ScenarioRunner::abort_handle] stops the sweep at the next frame. The scenario
/// in progress is discarded and the report keeps the scenarios that had already completed. Aborts
/// are sticky, so a runner that has been aborted will abort every later sweep straight away.
pub struct ScenarioRunner<T: RenderTarget, C: Clock + Clone> {
    sweep_name: String,
    run_id: Option<String>,
    target: T,
    clock: C,
    collector: SampleCollector<C>,
    config: SweepConfig,
    abort_handle: AbortHandle,
    abort_listener: AbortListener,
    scenarios: Vec<Scenario>,
    phase: Phase,
    results: Vec<ScenarioResult>,
    failures: Vec<ScenarioFailure>,
    aborted: bool,
}

impl<T: RenderTarget, C: Clock + Clone> ScenarioRunner<T, C> {
    pub fn new(sweep_name: &str, target: T, clock: C, config: SweepConfig) -> Self {
        let abort_handle = AbortHandle::new();
        let abort_listener = abort_handle.new_listener();

        Self {
            sweep_name: sweep_name.to_string(),
            run_id: None,
            target,
            collector: SampleCollector::new(clock.clone()),
            clock,
            config,
            abort_handle,
            abort_listener,
            scenarios: Vec::new(),
            phase: Phase::Idle,
            results: Vec::new(),
            failures: Vec::new(),
            aborted: false,
        }
    }

    /// Use an existing abort handle, for example one wired to Ctrl-C.
    pub fn with_abort_handle(mut self, abort_handle: AbortHandle) -> Self {
        self.abort_listener = abort_handle.new_listener();
        self.abort_handle = abort_handle;
        self
    }

    /// Use a fixed run id. A random one is generated for each sweep otherwise.
    pub fn with_run_id(mut self, run_id: String) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort_handle.clone()
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn into_target(self) -> T {
        self.target
    }

    /// Run every scenario in order and report the results.
    ///
    /// Returns an error if sampling breaks down, for example if there are no samples to reduce.
    /// Render target failures are not errors, they are handled according to the
    /// [FailurePolicy].
    pub fn run_sweep(
        &mut self,
        host: &mut dyn FrameHost,
        scenarios: &[Scenario],
        environment: BTreeMap<String, String>,
    ) -> anyhow::Result<RunReport> {
        self.scenarios = scenarios.to_vec();
        self.results = Vec::with_capacity(scenarios.len());
        self.failures = Vec::new();
        self.aborted = false;
        self.phase = Phase::Idle;

        log::info!(
            "Starting sweep [{}] with {} scenarios",
            self.sweep_name,
            self.scenarios.len()
        );

        if self.abort_listener.is_aborted() {
            log::warn!("Sweep [{}] was aborted before it started", self.sweep_name);
            self.aborted = true;
            self.phase = Phase::Finished;
        } else {
            self.phase = Phase::Ready;
        }

        if self.phase != Phase::Finished {
            let run = host.run(self).context("Frame loop failed");
            if let Err(e) = run {
                self.collector.discard();
                self.phase = Phase::Finished;
                return Err(e);
            }
        }

        if self.phase != Phase::Finished {
            self.collector.discard();
            return Err(InvalidStateError::new(
                "The frame host stopped delivering frames before the sweep finished",
            )
            .into());
        }

        Ok(RunReport {
            run_id: self
                .run_id
                .clone()
                .unwrap_or_else(|| nanoid::nanoid!()),
            sweep_name: self.sweep_name.clone(),
            captured_at: chrono::Utc::now(),
            environment,
            scenario_duration_ms: duration_ms(self.config.scenario_duration),
            settle_delay_ms: duration_ms(self.config.settle_delay),
            aborted: self.aborted,
            results: std::mem::take(&mut self.results),
            failures: std::mem::take(&mut self.failures),
        })
    }

    /// Configure the target for the scenario at `index` and start collecting.
    ///
    /// A scenario the target can't be configured for is failed straight away and the next one is
    /// tried, after a settle delay if there is one.
    fn begin_scenario(&mut self, mut index: usize) -> anyhow::Result<()> {
        loop {
            let Some(scenario) = self.scenarios.get(index) else {
                self.phase = Phase::Finished;
                return Ok(());
            };

            log::info!("Running scenario: {}", scenario.name());
            log::debug!("Scenario configuration: {scenario:?}");

            match self.target.apply_scenario(scenario) {
                Ok(()) => {
                    self.collector.start()?;
                    self.phase = Phase::Sampling { index, frames: 0 };
                    return Ok(());
                }
                Err(e) => {
                    self.record_failure(index, 0, e);
                    if self.settle_delay_ms() > 0.0 {
                        self.advance(index + 1)?;
                        return Ok(());
                    }
                    index += 1;
                }
            }
        }
    }

    fn sample_frame(&mut self, index: usize, frames: usize) -> anyhow::Result<()> {
        let before = self.clock.now();
        let rendered = self.target.render_frame();
        let after = self.clock.now();

        if let Err(e) = rendered {
            self.collector.discard();
            self.record_failure(index, frames, e);
            return self.advance(index + 1);
        }

        self.collector.record((after - before).max(0.0))?;
        self.phase = Phase::Sampling {
            index,
            frames: frames + 1,
        };

        if self.collector.elapsed_ms()? >= duration_ms(self.config.scenario_duration) {
            self.complete_scenario(index)?;
        }

        Ok(())
    }

    fn complete_scenario(&mut self, index: usize) -> anyhow::Result<()> {
        let scenario = self.scenarios[index].clone();
        let collected = self.collector.stop()?;
        let stats = reduce(&collected.samples, collected.elapsed_ms)
            .with_context(|| format!("Failed to reduce samples for scenario [{}]", scenario.name()))?;

        log::info!(
            "Completed scenario [{}]: {} frames, {:.2} FPS, p95 {:.2}ms, p99 {:.2}ms",
            scenario.name(),
            stats.total_frames,
            stats.avg_fps,
            stats.p95_frame_time_ms,
            stats.p99_frame_time_ms,
        );

        self.results.push(ScenarioResult::new(scenario, stats));
        self.advance(index + 1)
    }

    fn record_failure(&mut self, index: usize, frames: usize, error: anyhow::Error) {
        let scenario = self.scenarios[index].clone();
        log::error!(
            "Scenario [{}] failed after {} frames: {:?}",
            scenario.name(),
            frames,
            error
        );

        match self.config.failure_policy {
            FailurePolicy::Record => {
                self.failures
                    .push(ScenarioFailure::new(scenario, frames, format!("{error:#}")));
            }
            FailurePolicy::Omit => {
                log::warn!("Omitting failed scenario [{}] from the report", scenario.name());
            }
        }
    }

    /// Move on to the scenario at `next_index`, through the settle phase if one is configured.
    fn advance(&mut self, next_index: usize) -> anyhow::Result<()> {
        if next_index >= self.scenarios.len() {
            self.phase = Phase::Finished;
            return Ok(());
        }

        let settle_delay_ms = self.settle_delay_ms();
        if settle_delay_ms > 0.0 {
            log::debug!("Settling for {settle_delay_ms}ms");
            self.phase = Phase::Settling {
                next_index,
                until_ms: self.clock.now() + settle_delay_ms,
            };
            Ok(())
        } else {
            self.begin_scenario(next_index)
        }
    }

    fn abort_in_progress(&mut self) {
        match self.phase {
            Phase::Sampling { index, frames } => {
                let discarded = self.collector.discard();
                log::warn!(
                    "Sweep aborted during scenario [{}], discarding {} frames ({} samples)",
                    self.scenarios[index].name(),
                    frames,
                    discarded
                );
            }
            _ => log::warn!("Sweep aborted"),
        }

        self.aborted = true;
        self.phase = Phase::Finished;
    }

    fn settle_delay_ms(&self) -> f64 {
        duration_ms(self.config.settle_delay)
    }
}

impl<T: RenderTarget, C: Clock + Clone> FrameCallback for ScenarioRunner<T, C> {
    fn on_frame(&mut self, scheduler: &mut dyn FrameScheduler) -> anyhow::Result<()> {
        if self.abort_listener.is_aborted() {
            self.abort_in_progress();
            scheduler.cancel();
            return Ok(());
        }

        match self.phase {
            Phase::Ready => self.begin_scenario(0)?,
            Phase::Sampling { index, frames } => self.sample_frame(index, frames)?,
            Phase::Settling {
                next_index,
                until_ms,
            } => {
                if self.clock.now() >= until_ms {
                    self.begin_scenario(next_index)?;
                }
            }
            Phase::Idle | Phase::Finished => {}
        }

        match self.phase {
            Phase::Sampling { .. } => scheduler.schedule_next_frame(),
            Phase::Settling { until_ms, .. } => {
                let remaining_ms = until_ms - self.clock.now();
                if remaining_ms > 0.0 {
                    scheduler.schedule_frame_after(Duration::from_secs_f64(remaining_ms / 1000.0));
                } else {
                    scheduler.schedule_next_frame();
                }
            }
            Phase::Idle | Phase::Ready | Phase::Finished => {}
        }

        Ok(())
    }
}

fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::FrameLoop;
    use frame_tunnel_core::prelude::{ManualClock, RenderTargetFailure};
    use frame_tunnel_summary_model::default_scenario_matrix;

    /// Costs a fixed amount of clock time per frame and logs what it was asked to do.
    struct FakeTarget {
        clock: ManualClock,
        frame_cost_ms: f64,
        current: Option<String>,
        events: Vec<(String, f64)>,
        fail_apply: Option<String>,
        fail_render: Option<(String, usize)>,
        rendered_in_current: usize,
    }

    impl FakeTarget {
        fn new(clock: ManualClock, frame_cost_ms: f64) -> Self {
            Self {
                clock,
                frame_cost_ms,
                current: None,
                events: Vec::new(),
                fail_apply: None,
                fail_render: None,
                rendered_in_current: 0,
            }
        }

        fn applied(&self) -> Vec<String> {
            self.events
                .iter()
                .filter_map(|(e, _)| e.strip_prefix("apply:").map(|s| s.to_string()))
                .collect()
        }
    }

    impl RenderTarget for FakeTarget {
        fn apply_scenario(&mut self, scenario: &Scenario) -> anyhow::Result<()> {
            self.events
                .push((format!("apply:{}", scenario.name()), self.clock.now()));
            if self.fail_apply.as_deref() == Some(scenario.name()) {
                return Err(RenderTargetFailure::new("unsupported configuration").into());
            }
            self.current = Some(scenario.name().to_string());
            self.rendered_in_current = 0;
            Ok(())
        }

        fn render_frame(&mut self) -> anyhow::Result<()> {
            let current = self.current.clone().unwrap_or_default();
            if let Some((name, after)) = &self.fail_render {
                if *name == current && self.rendered_in_current == *after {
                    return Err(RenderTargetFailure::new("device lost").into());
                }
            }
            self.clock.advance(self.frame_cost_ms);
            self.rendered_in_current += 1;
            self.events
                .push((format!("render:{current}"), self.clock.now()));
            Ok(())
        }
    }

    fn config(duration_ms: u64, settle_ms: u64) -> SweepConfig {
        SweepConfig {
            scenario_duration: Duration::from_millis(duration_ms),
            settle_delay: Duration::from_millis(settle_ms),
            failure_policy: FailurePolicy::Record,
        }
    }

    #[test]
    fn runs_scenarios_in_order() {
        let clock = ManualClock::new();
        let target = FakeTarget::new(clock.clone(), 4.0);
        let scenarios = default_scenario_matrix()[..2].to_vec();
        let mut runner = ScenarioRunner::new("test", target, clock, config(50, 0));

        let report = runner
            .run_sweep(&mut FrameLoop::unpaced(), &scenarios, BTreeMap::new())
            .unwrap();

        assert_eq!(2, report.results.len());
        assert_eq!("LOD 0 - High Detail", report.results[0].scenario_name);
        assert_eq!("LOD 1 - Medium Detail", report.results[1].scenario_name);
        assert!(!report.aborted);
        for result in &report.results {
            assert!(result.stats.total_frames >= 1);
            assert_eq!(4.0, result.stats.min_frame_time_ms);
            assert_eq!(4.0, result.stats.max_frame_time_ms);
            assert!(result.stats.total_elapsed_ms >= 50.0);
        }
        assert_eq!(
            vec!["LOD 0 - High Detail", "LOD 1 - Medium Detail"],
            runner.target().applied()
        );
    }

    #[test]
    fn zero_duration_still_measures_one_frame() {
        let clock = ManualClock::new();
        let target = FakeTarget::new(clock.clone(), 0.0);
        let scenarios = vec![Scenario::new("a"), Scenario::new("b")];
        let mut runner = ScenarioRunner::new("test", target, clock, config(0, 0));

        let report = runner
            .run_sweep(&mut FrameLoop::unpaced(), &scenarios, BTreeMap::new())
            .unwrap();

        assert_eq!(2, report.results.len());
        for result in &report.results {
            assert_eq!(1, result.stats.total_frames);
            assert_eq!(0.0, result.stats.avg_fps);
        }
    }

    #[test]
    fn settle_delay_separates_scenarios() {
        let clock = ManualClock::stepping(1.0);
        let target = FakeTarget::new(clock.clone(), 2.0);
        let scenarios = vec![Scenario::new("first"), Scenario::new("second")];
        let mut runner = ScenarioRunner::new("test", target, clock.clone(), config(20, 100));

        let report = runner
            .run_sweep(
                &mut FrameLoop::unpaced().with_idle_clock(clock),
                &scenarios,
                BTreeMap::new(),
            )
            .unwrap();
        assert_eq!(2, report.results.len());
        assert_eq!(100.0, report.settle_delay_ms);

        let events = &runner.target().events;
        let last_first_render = events
            .iter()
            .filter(|(e, _)| e == "render:first")
            .map(|(_, t)| *t)
            .fold(0.0, f64::max);
        let second_applied = events
            .iter()
            .find(|(e, _)| e == "apply:second")
            .map(|(_, t)| *t)
            .unwrap();
        assert!(second_applied - last_first_render >= 100.0);

        // Nothing is rendered while settling
        let position = events.iter().position(|(e, _)| e == "apply:second").unwrap();
        assert!(events[..position]
            .iter()
            .all(|(e, _)| e == "apply:first" || e == "render:first"));
    }

    /// Counts the frames delivered by the wrapped loop, after an optional start-up cost.
    struct CountingHost {
        inner: FrameLoop,
        startup: Option<(ManualClock, f64)>,
        frames: u64,
    }

    impl CountingHost {
        fn new(inner: FrameLoop) -> Self {
            Self {
                inner,
                startup: None,
                frames: 0,
            }
        }
    }

    impl FrameHost for CountingHost {
        fn run(&mut self, callback: &mut dyn FrameCallback) -> anyhow::Result<u64> {
            if let Some((clock, cost_ms)) = &self.startup {
                clock.advance(*cost_ms);
            }
            self.frames = self.inner.run(callback)?;
            Ok(self.frames)
        }
    }

    #[test]
    fn settle_delay_idles_for_a_single_frame() {
        let clock = ManualClock::new();
        let target = FakeTarget::new(clock.clone(), 2.0);
        let scenarios = vec![Scenario::new("first"), Scenario::new("second")];
        let mut runner = ScenarioRunner::new("test", target, clock.clone(), config(10, 1000));
        let mut host = CountingHost::new(FrameLoop::unpaced().with_idle_clock(clock.clone()));

        let report = runner
            .run_sweep(&mut host, &scenarios, BTreeMap::new())
            .unwrap();

        assert_eq!(2, report.results.len());
        let renders = runner
            .target()
            .events
            .iter()
            .filter(|(e, _)| e.starts_with("render:"))
            .count() as u64;
        assert_eq!(10, renders);
        // One frame configures the first scenario, one wakes from the settle delay
        assert_eq!(12, host.frames);
        assert_eq!(1020.0, clock.now());
    }

    #[test]
    fn first_window_excludes_host_startup() {
        let clock = ManualClock::new();
        let target = FakeTarget::new(clock.clone(), 2.0);
        let scenarios = vec![Scenario::new("first"), Scenario::new("second")];
        let mut runner = ScenarioRunner::new("test", target, clock.clone(), config(20, 0));
        let mut host = CountingHost::new(FrameLoop::unpaced());
        host.startup = Some((clock, 50.0));

        let report = runner
            .run_sweep(&mut host, &scenarios, BTreeMap::new())
            .unwrap();

        assert_eq!(20.0, report.results[0].stats.total_elapsed_ms);
        assert_eq!(20.0, report.results[1].stats.total_elapsed_ms);
    }

    #[test]
    fn render_failure_terminates_only_that_scenario() {
        let clock = ManualClock::stepping(1.0);
        let mut target = FakeTarget::new(clock.clone(), 1.0);
        target.fail_render = Some(("b".to_string(), 3));
        let scenarios = vec![Scenario::new("a"), Scenario::new("b"), Scenario::new("c")];
        let mut runner = ScenarioRunner::new("test", target, clock, config(100, 0));

        let report = runner
            .run_sweep(&mut FrameLoop::unpaced(), &scenarios, BTreeMap::new())
            .unwrap();

        let names = report
            .results
            .iter()
            .map(|r| r.scenario_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(vec!["a", "c"], names);
        assert_eq!(1, report.failures.len());
        assert_eq!("b", report.failures[0].scenario_name);
        assert_eq!(3, report.failures[0].frames_rendered);
        assert!(report.failures[0].error.contains("device lost"));
    }

    #[test]
    fn apply_failure_is_omitted_when_asked() {
        let clock = ManualClock::stepping(1.0);
        let mut target = FakeTarget::new(clock.clone(), 1.0);
        target.fail_apply = Some("a".to_string());
        let scenarios = vec![Scenario::new("a"), Scenario::new("b")];
        let mut config = config(10, 0);
        config.failure_policy = FailurePolicy::Omit;
        let mut runner = ScenarioRunner::new("test", target, clock, config);

        let report = runner
            .run_sweep(&mut FrameLoop::unpaced(), &scenarios, BTreeMap::new())
            .unwrap();

        assert_eq!(1, report.results.len());
        assert_eq!("b", report.results[0].scenario_name);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn apply_failure_of_last_scenario_with_settle_finishes() {
        let clock = ManualClock::stepping(1.0);
        let mut target = FakeTarget::new(clock.clone(), 1.0);
        target.fail_apply = Some("b".to_string());
        let scenarios = vec![Scenario::new("a"), Scenario::new("b")];
        let mut runner = ScenarioRunner::new("test", target, clock.clone(), config(10, 5));

        let report = runner
            .run_sweep(
                &mut FrameLoop::unpaced().with_idle_clock(clock),
                &scenarios,
                BTreeMap::new(),
            )
            .unwrap();

        assert_eq!(1, report.results.len());
        assert_eq!(1, report.failures.len());
        assert_eq!(0, report.failures[0].frames_rendered);
    }

    #[test]
    fn abort_before_start_runs_nothing() {
        let clock = ManualClock::stepping(1.0);
        let target = FakeTarget::new(clock.clone(), 1.0);
        let mut runner = ScenarioRunner::new("test", target, clock, config(10, 0));
        runner.abort_handle().abort();

        let report = runner
            .run_sweep(
                &mut FrameLoop::unpaced(),
                &[Scenario::new("a")],
                BTreeMap::new(),
            )
            .unwrap();

        assert!(report.aborted);
        assert!(report.results.is_empty());
        assert!(runner.target().events.is_empty());
    }

    #[test]
    fn run_id_and_environment_are_reported() {
        let clock = ManualClock::stepping(1.0);
        let target = FakeTarget::new(clock.clone(), 1.0);
        let mut runner = ScenarioRunner::new("named", target, clock, config(5, 0))
            .with_run_id("fixed-id".to_string());

        let report = runner
            .run_sweep(
                &mut FrameLoop::unpaced(),
                &[Scenario::new("a")],
                BTreeMap::from([("platform".to_string(), "test".to_string())]),
            )
            .unwrap();

        assert_eq!("fixed-id", report.run_id);
        assert_eq!("named", report.sweep_name);
        assert_eq!(5.0, report.scenario_duration_ms);
        assert_eq!(Some(&"test".to_string()), report.environment.get("platform"));
    }

    #[test]
    fn host_that_stops_early_is_an_error() {
        struct OneFrameHost;

        impl FrameHost for OneFrameHost {
            fn run(&mut self, callback: &mut dyn FrameCallback) -> anyhow::Result<u64> {
                struct Ignore;
                impl FrameScheduler for Ignore {
                    fn schedule_next_frame(&mut self) {}
                    fn schedule_frame_after(&mut self, _delay: Duration) {}
                    fn cancel(&mut self) {}
                }
                callback.on_frame(&mut Ignore)?;
                Ok(1)
            }
        }

        let clock = ManualClock::stepping(1.0);
        let target = FakeTarget::new(clock.clone(), 1.0);
        let mut runner = ScenarioRunner::new("test", target, clock, config(1000, 0));

        let err = runner
            .run_sweep(&mut OneFrameHost, &[Scenario::new("a")], BTreeMap::new())
            .unwrap_err();

        assert!(err.is::<InvalidStateError>());
    }
}
