// track-annotator/src/config.rs
// Optional TOML configuration. Every key has a default, so an empty file
// (or no file at all) reproduces the built-in behaviour.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use track_annotate::simplify::DEFAULT_EPSILON_KM;
use track_annotate::{AnnotatorSettings, StopDetectorConfig};

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimplifyConfig {
    pub epsilon_km: f64,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self { epsilon_km: DEFAULT_EPSILON_KM }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AirportsConfig {
    /// Unset searches the whole catalog.
    pub max_radius_km: Option<f64>,
    /// Skip catalog rows whose name carries the "(Duplicate)" marker.
    pub skip_duplicates: bool,
}

impl Default for AirportsConfig {
    fn default() -> Self {
        Self { max_radius_km: None, skip_duplicates: true }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    pub zoom: f64,
    pub seed: u64,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self { zoom: 8.0, seed: 0 }
    }
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    pub stops: StopDetectorConfig,
    pub simplify: SimplifyConfig,
    pub airports: AirportsConfig,
    pub labels: LabelsConfig,
}

impl AnnotatorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.simplify.epsilon_km >= 0.0,
            "epsilon_km must be non-negative (got {})",
            self.simplify.epsilon_km
        );
        anyhow::ensure!(
            self.stops.agl_threshold_ft.is_finite() && self.stops.speed_threshold_kts.is_finite(),
            "stop thresholds must be finite"
        );
        anyhow::ensure!(self.stops.proximity_km >= 0.0, "proximity_km must be non-negative");
        if let Some(r) = self.airports.max_radius_km {
            anyhow::ensure!(r > 0.0, "max_radius_km must be positive (got {r})");
        }
        anyhow::ensure!(
            (0.0..=24.0).contains(&self.labels.zoom),
            "zoom must be within 0..=24 (got {})",
            self.labels.zoom
        );
        Ok(())
    }

    pub fn settings(&self) -> AnnotatorSettings {
        AnnotatorSettings { stops: self.stops, epsilon_km: self.simplify.epsilon_km }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
