//! Engine configuration: generator roster, upgrade catalog and tuning constants.
//!
//! Every field has a default, so a JSON override only needs the keys it changes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{default_catalog, UpgradeDefinition, UpgradeEffect, UpgradeTarget};
use crate::state::GeneratorSpec;

/// Fastest supported tick cadence (one tick per millisecond).
pub const MAX_TICKS_PER_SEC: u32 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrestigeConfig {
    /// Minimum total earned (this run) before a prestige is allowed.
    pub threshold: f64,
    /// Multiplier gained per accumulated prestige point.
    pub base_multiplier: f64,
}

impl Default for PrestigeConfig {
    fn default() -> Self {
        Self {
            threshold: 1_000_000.0,
            base_multiplier: 0.1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Absences this short earn nothing.
    pub min_elapsed_ms: u64,
    /// Longest absence that is credited.
    pub max_elapsed_ms: u64,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            min_elapsed_ms: 60_000,
            max_elapsed_ms: 24 * 60 * 60 * 1000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub base_click_power: f64,
    pub prestige: PrestigeConfig,
    pub offline: OfflineConfig,
    /// Tick cadence used by the session driver.
    pub ticks_per_sec: u32,
    pub autosave_interval_ms: u64,
    pub generators: Vec<GeneratorSpec>,
    pub upgrades: Vec<UpgradeDefinition>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_click_power: 1.0,
            prestige: PrestigeConfig::default(),
            offline: OfflineConfig::default(),
            ticks_per_sec: 10,
            autosave_interval_ms: 10_000,
            generators: default_generators(),
            upgrades: default_catalog(),
        }
    }
}

/// The five stock generators, ids 1 through 5.
pub fn default_generators() -> Vec<GeneratorSpec> {
    vec![
        GeneratorSpec::new(1, "Basic Generator", 10.0, 1.0, 1.15),
        GeneratorSpec::new(2, "Advanced Factory", 100.0, 8.0, 1.20).unlocks_at(50.0),
        GeneratorSpec::new(3, "Industrial Complex", 1_000.0, 50.0, 1.25).unlocks_at(500.0),
        GeneratorSpec::new(4, "Mega Corporation", 10_000.0, 300.0, 1.30).unlocks_at(5_000.0),
        GeneratorSpec::new(5, "Galactic Empire", 100_000.0, 2_000.0, 1.35).unlocks_at(50_000.0),
    ]
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.ticks_per_sec == 0 || self.ticks_per_sec > MAX_TICKS_PER_SEC {
            return invalid(format!("ticks_per_sec must be in 1..={MAX_TICKS_PER_SEC}"));
        }
        if !above(self.base_click_power, 0.0) {
            return invalid("base_click_power must be > 0".into());
        }
        if !above(self.prestige.threshold, 0.0) {
            return invalid("prestige.threshold must be > 0".into());
        }
        let base = self.prestige.base_multiplier;
        if !(base.is_finite() && base >= 0.0) {
            return invalid("prestige.base_multiplier must be >= 0".into());
        }
        if self.offline.max_elapsed_ms < self.offline.min_elapsed_ms {
            return invalid("offline.max_elapsed_ms is below offline.min_elapsed_ms".into());
        }

        let mut generator_ids = HashSet::new();
        for g in &self.generators {
            if !generator_ids.insert(g.id) {
                return invalid(format!("duplicate generator id {}", g.id));
            }
            if !above(g.base_cost, 0.0) || !above(g.base_income, 0.0) {
                return invalid(format!("generator {} needs positive cost and income", g.id));
            }
            if !above(g.cost_multiplier, 1.0) {
                return invalid(format!("generator {} cost_multiplier must be > 1", g.id));
            }
        }

        let mut upgrade_ids = HashSet::new();
        for u in &self.upgrades {
            if !upgrade_ids.insert(u.id.as_str()) {
                return invalid(format!("duplicate upgrade id {:?}", u.id));
            }
            if !above(u.base_cost, 0.0)
                || !above(u.cost_multiplier, 1.0)
                || !above(u.multiplier, 1.0)
            {
                return invalid(format!("upgrade {:?} has a non-growing cost or bonus", u.id));
            }
            if let UpgradeEffect::GeneratorMultiplier {
                target: UpgradeTarget::Generator(id),
            } = u.effect
            {
                if !generator_ids.contains(&id) {
                    return invalid(format!("upgrade {:?} targets unknown generator {}", u.id, id));
                }
            }
        }

        Ok(())
    }
}

/// Finite and strictly greater than `min`; rejects NaN.
fn above(x: f64, min: f64) -> bool {
    x.is_finite() && x > min
}
