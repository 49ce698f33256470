use tabled::Tabled;

#[derive(Tabled)]
pub struct ScenarioRow {
    #[tabled(rename = "scenario")]
    pub scenario_name: String,
    #[tabled(display = "float2")]
    pub avg_fps: f64,
    #[tabled(display = "float2")]
    pub avg_frame_time_ms: f64,
    #[tabled(display = "float2")]
    pub min_frame_time_ms: f64,
    #[tabled(display = "float2")]
    pub max_frame_time_ms: f64,
    #[tabled(display = "float2")]
    pub p95_frame_time_ms: f64,
    #[tabled(display = "float2")]
    pub p99_frame_time_ms: f64,
    pub total_frames: usize,
}

#[derive(Tabled)]
pub struct FailureRow {
    #[tabled(rename = "scenario")]
    pub scenario_name: String,
    pub frames_rendered: usize,
    pub error: String,
}

fn float2(n: &f64) -> String {
    format!("{:.2}", n)
}
