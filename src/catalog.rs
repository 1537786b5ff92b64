//! Upgrade catalog: static definitions of every purchasable upgrade.
//!
//! Definitions are plain data so a catalog can be loaded from configuration.
//! Unlock conditions are data too, evaluated against an explicit
//! [`UnlockContext`] on every query rather than captured as closures.

use serde::{Deserialize, Serialize};

use crate::state::{GeneratorId, UnlockContext};

/// Which generators a generator-upgrade boosts.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeTarget {
    All,
    Generator(GeneratorId),
}

impl UpgradeTarget {
    pub fn applies_to(&self, id: GeneratorId) -> bool {
        match self {
            UpgradeTarget::All => true,
            UpgradeTarget::Generator(target) => *target == id,
        }
    }
}

/// What one level of an upgrade multiplies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeEffect {
    /// Manual click value.
    ClickMultiplier,
    /// Passive income of the targeted generators.
    GeneratorMultiplier { target: UpgradeTarget },
}

/// Predicate deciding whether an upgrade is shown as available.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockCondition {
    Always,
    CurrencyAtLeast(f64),
    TotalClicksAtLeast(u64),
    AnyGeneratorOwned,
    GeneratorCountAtLeast { generator: GeneratorId, count: u32 },
    TotalIncomeAtLeast(f64),
    PrestigeLevelAtLeast(u32),
}

impl UnlockCondition {
    pub fn is_met(&self, ctx: &UnlockContext<'_>) -> bool {
        match self {
            UnlockCondition::Always => true,
            UnlockCondition::CurrencyAtLeast(amount) => ctx.currency >= *amount,
            UnlockCondition::TotalClicksAtLeast(clicks) => ctx.total_clicks >= *clicks,
            UnlockCondition::AnyGeneratorOwned => ctx.generators.iter().any(|g| g.count > 0),
            UnlockCondition::GeneratorCountAtLeast { generator, count } => {
                ctx.generator_count(*generator) >= *count
            }
            UnlockCondition::TotalIncomeAtLeast(income) => ctx.total_income >= *income,
            UnlockCondition::PrestigeLevelAtLeast(level) => ctx.prestige_level >= *level,
        }
    }
}

/// One catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_cost: f64,
    /// Geometric cost growth per level.
    pub cost_multiplier: f64,
    /// Multiplicative bonus granted by each level (> 1).
    pub multiplier: f64,
    pub max_level: u32,
    pub effect: UpgradeEffect,
    #[serde(default = "always")]
    pub unlock: UnlockCondition,
}

fn always() -> UnlockCondition {
    UnlockCondition::Always
}

impl UpgradeDefinition {
    pub fn is_click(&self) -> bool {
        matches!(self.effect, UpgradeEffect::ClickMultiplier)
    }

    /// True if this upgrade boosts the given generator.
    pub fn boosts(&self, id: GeneratorId) -> bool {
        match &self.effect {
            UpgradeEffect::GeneratorMultiplier { target } => target.applies_to(id),
            UpgradeEffect::ClickMultiplier => false,
        }
    }
}

struct Entry {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    base_cost: f64,
    cost_multiplier: f64,
    multiplier: f64,
    max_level: u32,
    effect: UpgradeEffect,
    unlock: UnlockCondition,
}

impl From<Entry> for UpgradeDefinition {
    fn from(e: Entry) -> Self {
        Self {
            id: e.id.to_string(),
            name: e.name.to_string(),
            description: e.description.to_string(),
            base_cost: e.base_cost,
            cost_multiplier: e.cost_multiplier,
            multiplier: e.multiplier,
            max_level: e.max_level,
            effect: e.effect,
            unlock: e.unlock,
        }
    }
}

/// The stock catalog: five click upgrades followed by five generator upgrades.
pub fn default_catalog() -> Vec<UpgradeDefinition> {
    use UnlockCondition::*;
    use UpgradeEffect::*;

    let entries = vec![
        // ── Click upgrades ──────────────────────────────────────────
        Entry {
            id: "click_power_1",
            name: "Reinforced Gloves",
            description: "Improves the strength of your clicks",
            base_cost: 100.0,
            cost_multiplier: 1.5,
            multiplier: 1.2,
            max_level: 50,
            effect: ClickMultiplier,
            unlock: Always,
        },
        Entry {
            id: "click_power_2",
            name: "Mechanical Fists",
            description: "Hydraulics for extra punch",
            base_cost: 1_000.0,
            cost_multiplier: 1.6,
            multiplier: 1.5,
            max_level: 30,
            effect: ClickMultiplier,
            unlock: CurrencyAtLeast(500.0),
        },
        Entry {
            id: "click_power_3",
            name: "Exoskeleton",
            description: "Superhuman clicking technology",
            base_cost: 10_000.0,
            cost_multiplier: 1.7,
            multiplier: 2.0,
            max_level: 20,
            effect: ClickMultiplier,
            unlock: TotalClicksAtLeast(1_000),
        },
        Entry {
            id: "click_speed_1",
            name: "Premium Coffee",
            description: "Faster clicking",
            base_cost: 500.0,
            cost_multiplier: 1.4,
            multiplier: 1.15,
            max_level: 25,
            effect: ClickMultiplier,
            unlock: CurrencyAtLeast(250.0),
        },
        Entry {
            id: "click_efficiency_1",
            name: "Pro Training",
            description: "Optimised technique for more efficient clicks",
            base_cost: 2_500.0,
            cost_multiplier: 1.8,
            multiplier: 1.25,
            max_level: 15,
            effect: ClickMultiplier,
            unlock: CurrencyAtLeast(1_000.0),
        },
        // ── Generator upgrades ──────────────────────────────────────
        Entry {
            id: "generator_efficiency_1",
            name: "Quality Oil",
            description: "Improves the efficiency of every generator",
            base_cost: 1_000.0,
            cost_multiplier: 2.0,
            multiplier: 1.5,
            max_level: 20,
            effect: GeneratorMultiplier { target: UpgradeTarget::All },
            unlock: AnyGeneratorOwned,
        },
        Entry {
            id: "generator_speed_1",
            name: "Light Overclock",
            description: "Speeds up basic generators",
            base_cost: 5_000.0,
            cost_multiplier: 2.2,
            multiplier: 1.3,
            max_level: 15,
            effect: GeneratorMultiplier {
                target: UpgradeTarget::Generator(GeneratorId(1)),
            },
            unlock: GeneratorCountAtLeast {
                generator: GeneratorId(1),
                count: 5,
            },
        },
        Entry {
            id: "generator_speed_2",
            name: "Advanced Turbine",
            description: "Boosts intermediate generators",
            base_cost: 25_000.0,
            cost_multiplier: 2.5,
            multiplier: 1.4,
            max_level: 12,
            effect: GeneratorMultiplier {
                target: UpgradeTarget::Generator(GeneratorId(2)),
            },
            unlock: GeneratorCountAtLeast {
                generator: GeneratorId(2),
                count: 3,
            },
        },
        Entry {
            id: "automation_1",
            name: "Management AI",
            description: "Optimises every generator",
            base_cost: 100_000.0,
            cost_multiplier: 3.0,
            multiplier: 2.0,
            max_level: 10,
            effect: GeneratorMultiplier { target: UpgradeTarget::All },
            unlock: TotalIncomeAtLeast(1_000.0),
        },
        Entry {
            id: "quantum_boost",
            name: "Quantum Amplifier",
            description: "Exponential production",
            base_cost: 1_000_000.0,
            cost_multiplier: 4.0,
            multiplier: 3.0,
            max_level: 5,
            effect: GeneratorMultiplier { target: UpgradeTarget::All },
            unlock: PrestigeLevelAtLeast(1),
        },
    ];

    entries.into_iter().map(UpgradeDefinition::from).collect()
}
