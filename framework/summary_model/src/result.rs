use serde::{Deserialize, Serialize};

use crate::Scenario;

/// Statistical summary of the frame samples collected for one scenario.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameStats {
    /// The number of frames measured, always at least 1
    pub total_frames: usize,
    /// Wall time from the start of sample collection until it was stopped
    pub total_elapsed_ms: f64,
    /// `total_frames / total_elapsed_ms * 1000`
    #[serde(rename = "avgFPS")]
    pub avg_fps: f64,
    /// `total_elapsed_ms / total_frames`
    ///
    /// This is derived from the wall time of the observation window rather than from the samples,
    /// so it includes the time between frames.
    pub avg_frame_time_ms: f64,
    pub min_frame_time_ms: f64,
    pub max_frame_time_ms: f64,
    /// Nearest-rank 95th percentile, see the reducer in the instruments crate
    pub p95_frame_time_ms: f64,
    /// Nearest-rank 99th percentile
    pub p99_frame_time_ms: f64,
}

/// The reduced result of one completed scenario.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub scenario_name: String,
    #[serde(flatten)]
    pub stats: FrameStats,
    pub scenario: Scenario,
}

impl ScenarioResult {
    pub fn new(scenario: Scenario, stats: FrameStats) -> Self {
        Self {
            scenario_name: scenario.name().to_string(),
            stats,
            scenario,
        }
    }
}

/// Placeholder for a scenario that was terminated by a render target failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioFailure {
    pub scenario_name: String,
    /// Frames that completed before the failure. Their samples are discarded.
    pub frames_rendered: usize,
    pub error: String,
    pub scenario: Scenario,
}

impl ScenarioFailure {
    pub fn new(scenario: Scenario, frames_rendered: usize, error: String) -> Self {
        Self {
            scenario_name: scenario.name().to_string(),
            frames_rendered,
            error,
            scenario,
        }
    }
}
