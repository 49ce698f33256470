use frame_tunnel_runner::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Work done per frame scales with the point count, one projected sample per thousand points.
const POINTS_PER_SAMPLE: u32 = 1000;

/// A headless stand-in for a point cloud renderer.
///
/// Each frame projects a batch of randomly placed points through the current camera, so frame
/// cost follows the configured point count.
struct SimulatedRenderTarget {
    rng: StdRng,
    samples_per_frame: u32,
    lod_level: u8,
    zoom: f64,
    rotation_enabled: bool,
    rotation: f64,
    checksum: f64,
}

impl SimulatedRenderTarget {
    fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            samples_per_frame: 1,
            lod_level: 0,
            zoom: 1.0,
            rotation_enabled: false,
            rotation: 0.0,
            checksum: 0.0,
        }
    }
}

impl RenderTarget for SimulatedRenderTarget {
    fn apply_scenario(&mut self, scenario: &Scenario) -> FrameTunnelResult<()> {
        self.samples_per_frame = (scenario.effective_point_count() / POINTS_PER_SAMPLE).max(1);
        self.lod_level = scenario.lod_level().unwrap_or(0);
        self.zoom = scenario.zoom().unwrap_or(1.0);
        self.rotation_enabled = scenario.rotation_enabled();
        self.rotation = 0.0;

        log::debug!(
            "Configured simulated target: {} samples per frame, lod {}, zoom {}, rotation {}",
            self.samples_per_frame,
            self.lod_level,
            self.zoom,
            self.rotation_enabled
        );

        Ok(())
    }

    fn render_frame(&mut self) -> FrameTunnelResult<()> {
        if self.rotation_enabled {
            self.rotation = (self.rotation + 0.01) % std::f64::consts::TAU;
        }

        let (sin_r, cos_r) = self.rotation.sin_cos();
        let mut acc = 0.0;
        for _ in 0..self.samples_per_frame {
            let angle = self.rng.gen::<f64>() * std::f64::consts::TAU;
            let (x, y) = (angle.cos() * self.zoom, angle.sin() * self.zoom);
            acc += x * cos_r - y * sin_r;
        }
        self.checksum = std::hint::black_box(self.checksum + acc);

        if !self.checksum.is_finite() {
            return Err(RenderTargetFailure::new("Simulated projection diverged").into());
        }

        Ok(())
    }
}

fn main() -> FrameTunnelResult<()> {
    let builder = SweepDefinitionBuilder::new(env!("CARGO_PKG_NAME"))
        .use_scenarios(default_scenario_matrix())
        .add_env("render_target", "simulated");

    let report = run(builder, SimulatedRenderTarget::new())?;
    if report.aborted {
        log::info!("Sweep aborted after {} scenarios", report.results.len());
    }

    Ok(())
}
