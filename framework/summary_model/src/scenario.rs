use serde::{Deserialize, Serialize};

/// Number of points rendered when a scenario doesn't specify one.
pub const DEFAULT_POINT_COUNT: u32 = 50_000;

/// Immutable description of one benchmark case.
///
/// A scenario is pure configuration. The runner forwards it to the render target without
/// interpreting it, so every field other than the name is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lod_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    point_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    zoom: Option<f64>,
    #[serde(default, alias = "rotation", skip_serializing_if = "Option::is_none")]
    rotation_enabled: Option<bool>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lod_level: None,
            point_count: None,
            zoom: None,
            rotation_enabled: None,
        }
    }

    pub fn with_lod_level(mut self, lod_level: u8) -> Self {
        self.lod_level = Some(lod_level);
        self
    }

    pub fn with_point_count(mut self, point_count: u32) -> Self {
        self.point_count = Some(point_count);
        self
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }

    pub fn with_rotation(mut self, enabled: bool) -> Self {
        self.rotation_enabled = Some(enabled);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lod_level(&self) -> Option<u8> {
        self.lod_level
    }

    /// The configured point count, if any. See [Scenario::effective_point_count] for the value a
    /// render target should use.
    pub fn point_count(&self) -> Option<u32> {
        self.point_count
    }

    pub fn effective_point_count(&self) -> u32 {
        self.point_count.unwrap_or(DEFAULT_POINT_COUNT)
    }

    pub fn zoom(&self) -> Option<f64> {
        self.zoom
    }

    pub fn rotation_enabled(&self) -> bool {
        self.rotation_enabled.unwrap_or(false)
    }

    /// Check the configuration is usable.
    ///
    /// Scenarios built in code are trusted, this is meant for scenarios loaded from a file.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Scenario name must not be empty");
        }
        if self.point_count == Some(0) {
            anyhow::bail!("Scenario [{}] has a point count of 0", self.name);
        }
        if let Some(zoom) = self.zoom {
            if !zoom.is_finite() || zoom <= 0.0 {
                anyhow::bail!("Scenario [{}] has an invalid zoom: {zoom}", self.name);
            }
        }

        Ok(())
    }
}

/// The built-in scenario matrix.
///
/// Names and configuration are kept stable so that reports from different runs can be compared.
pub fn default_scenario_matrix() -> Vec<Scenario> {
    vec![
        Scenario::new("LOD 0 - High Detail")
            .with_lod_level(0)
            .with_point_count(100_000),
        Scenario::new("LOD 1 - Medium Detail")
            .with_lod_level(1)
            .with_point_count(50_000),
        Scenario::new("LOD 2 - Low Detail")
            .with_lod_level(2)
            .with_point_count(25_000),
        Scenario::new("Zoom In Test").with_lod_level(0).with_zoom(0.1),
        Scenario::new("Zoom Out Test").with_lod_level(2).with_zoom(10.0),
        Scenario::new("Rotation Test")
            .with_lod_level(1)
            .with_rotation(true),
    ]
}
