//! run settings for polyvolve. serializable so a tuned configuration can be
//! saved and replayed; every field can also be overridden from the CLI.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings file: {0}")]
    Json(#[from] serde_json::Error),
}

/// optional stopping conditions. the base loop has no natural termination; any
/// satisfied condition ends the run, none configured means run until externally
/// stopped.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct StopSettings {
    /// stop after this many attempted mutations
    pub max_rounds: Option<u64>,
    /// stop once the match percentage reaches this value
    pub target_match: Option<f64>,
    /// stop after this many consecutive rounds without a breakthrough
    pub stagnation_rounds: Option<u64>,
}

impl StopSettings {
    pub fn is_unbounded(&self) -> bool {
        self.max_rounds.is_none()
            && self.target_match.is_none()
            && self.stagnation_rounds.is_none()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    /// fixed population size; draw order = array order
    pub polygon_count: usize,
    /// vertices per polygon, fixed at construction (>= 3)
    pub vertex_count: usize,
    /// probability that a mutation replaces the fill color instead of one vertex.
    /// granularity knob: it directly trades color convergence against shape
    /// convergence, so it is explicit configuration rather than a constant.
    pub p_recolor: f32,
    /// PRNG seed; identical seed + settings + target reproduces a run exactly
    pub seed: u64,
    /// anti-aliased polygon edges in the CPU rasterizer
    pub anti_alias: bool,
    /// rounds between stats updates pushed to the engine-thread receiver
    pub update_every: u64,
    pub stop: StopSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            polygon_count: 50,
            vertex_count: 6,
            p_recolor: 0.5,
            seed: 0xDEAD_BEEF,
            anti_alias: true,
            update_every: 250,
            stop: StopSettings::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
