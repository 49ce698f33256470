use frame_tunnel_summary_model::Scenario;

/// The rendering target driven by a sweep.
///
/// The runner treats the target as a black box. It forwards each scenario's configuration without
/// interpreting it and times each call to [RenderTarget::render_frame]. Whatever the call costs
/// is what gets measured, so it should do one frame of work and return.
///
/// An error from either method is a render target failure. It terminates the current scenario and
/// the sweep continues with the next one. Return a
/// [RenderTargetFailure](frame_tunnel_core::prelude::RenderTargetFailure) when there is nothing
/// more specific to report.
pub trait RenderTarget {
    /// Apply a scenario's configuration before its samples are collected.
    fn apply_scenario(&mut self, scenario: &Scenario) -> anyhow::Result<()>;

    /// Perform one frame of rendering work.
    fn render_frame(&mut self) -> anyhow::Result<()>;
}

impl<T: RenderTarget + ?Sized> RenderTarget for Box<T> {
    fn apply_scenario(&mut self, scenario: &Scenario) -> anyhow::Result<()> {
        (**self).apply_scenario(scenario)
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        (**self).render_frame()
    }
}
