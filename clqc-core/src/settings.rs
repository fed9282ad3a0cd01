//! Station thresholds and reconciliation switches, loaded from JSON.

use crate::missing::{MISSING, MISSING_PRECIP, MISSING_SNOW};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Custom thresholds for the `t1`..`t6`, `p1`, `p2` and `s1` day counts.
///
/// A threshold left at its missing sentinel disables its count, which is
/// then stored as missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateThresholds {
    /// Max temperature at or above (°F)
    pub t1: i32,
    /// Max temperature at or above (°F)
    pub t2: i32,
    /// Max temperature at or below (°F)
    pub t3: i32,
    /// Min temperature at or above (°F)
    pub t4: i32,
    /// Min temperature at or below (°F)
    pub t5: i32,
    /// Min temperature at or below (°F)
    pub t6: i32,
    /// Precipitation at or above (in)
    pub p1: f32,
    /// Precipitation at or above (in)
    pub p2: f32,
    /// Snowfall at or above (in)
    pub s1: f32,
}

impl Default for ClimateThresholds {
    fn default() -> Self {
        ClimateThresholds {
            t1: MISSING,
            t2: MISSING,
            t3: MISSING,
            t4: MISSING,
            t5: MISSING,
            t6: MISSING,
            p1: MISSING_PRECIP,
            p2: MISSING_PRECIP,
            s1: MISSING_SNOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconSettings {
    pub thresholds: ClimateThresholds,
    /// Redetermine first/last freeze dates when a minimum temperature in
    /// the current freeze season is edited.
    pub redetermine_freeze_dates: bool,
}

impl Default for ReconSettings {
    fn default() -> Self {
        ReconSettings {
            thresholds: ClimateThresholds::default(),
            redetermine_freeze_dates: true,
        }
    }
}

impl ReconSettings {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read settings from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let json = std::fs::read_to_string(p).map_err(|e| {
                    anyhow::anyhow!("failed to read settings {}: {}", p.display(), e)
                })?;
                let settings = Self::from_json(&json)?;
                log::info!("Loaded settings from {}", p.display());
                Ok(settings)
            }
            None => Ok(Self::default()),
        }
    }
}
