//! Core game state definitions: generators, prestige and read-only views.

use serde::{Deserialize, Serialize};

use crate::economy;

/// Stable identifier of a generator type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneratorId(pub u32);

impl std::fmt::Display for GeneratorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Static description of a generator type (part of the engine configuration).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSpec {
    pub id: GeneratorId,
    pub name: String,
    /// Cost of the first unit.
    pub base_cost: f64,
    /// Currency per second produced by one unit, before multipliers.
    pub base_income: f64,
    /// Geometric cost growth per owned unit (> 1).
    pub cost_multiplier: f64,
    /// Currency level at which the generator becomes visible.
    /// `None` means unlocked from the start.
    #[serde(default)]
    pub unlock_threshold: Option<f64>,
}

impl GeneratorSpec {
    pub fn new(
        id: u32,
        name: &str,
        base_cost: f64,
        base_income: f64,
        cost_multiplier: f64,
    ) -> Self {
        Self {
            id: GeneratorId(id),
            name: name.to_string(),
            base_cost,
            base_income,
            cost_multiplier,
            unlock_threshold: None,
        }
    }

    pub fn unlocks_at(mut self, threshold: f64) -> Self {
        self.unlock_threshold = Some(threshold);
        self
    }
}

/// One income-producing unit type and how many of it the player owns.
#[derive(Clone, Debug, PartialEq)]
pub struct Generator {
    pub spec: GeneratorSpec,
    pub count: u32,
    pub unlocked: bool,
}

impl Generator {
    pub fn new(spec: GeneratorSpec) -> Self {
        let unlocked = spec.unlock_threshold.is_none();
        Self {
            spec,
            count: 0,
            unlocked,
        }
    }

    pub fn id(&self) -> GeneratorId {
        self.spec.id
    }

    /// Current cost to buy the next one.
    pub fn cost(&self) -> f64 {
        economy::generator_cost(self.spec.base_cost, self.count, self.spec.cost_multiplier)
    }

    /// Unlock is one-way: once set it never reverts.
    pub fn refresh_unlock(&mut self, currency: f64) {
        if self.unlocked {
            return;
        }
        if let Some(threshold) = self.spec.unlock_threshold {
            self.unlocked = currency >= threshold;
        }
    }
}

/// Prestige progress. Survives prestige resets.
#[derive(Clone, Debug, PartialEq)]
pub struct PrestigeState {
    /// Number of prestige resets performed.
    pub level: u32,
    /// Prestige points awarded across all resets.
    pub points: u64,
    /// Multiplier applied to every currency gain (>= 1).
    pub multiplier: f64,
}

impl Default for PrestigeState {
    fn default() -> Self {
        Self {
            level: 0,
            points: 0,
            multiplier: 1.0,
        }
    }
}

/// Immutable view of live game state that unlock predicates are evaluated against.
#[derive(Clone, Copy, Debug)]
pub struct UnlockContext<'a> {
    pub currency: f64,
    pub total_clicks: u64,
    pub total_income: f64,
    pub prestige_level: u32,
    pub generators: &'a [Generator],
}

impl UnlockContext<'_> {
    pub fn generator_count(&self, id: GeneratorId) -> u32 {
        self.generators
            .iter()
            .find(|g| g.id() == id)
            .map_or(0, |g| g.count)
    }
}

// ── Presentation projection ─────────────────────────────────────

/// Read-only projection of one generator.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorView {
    pub id: GeneratorId,
    pub name: String,
    pub count: u32,
    pub cost: f64,
    /// Income of one more unit, including upgrades and prestige.
    pub income_per_unit: f64,
    pub unlocked: bool,
    pub affordable: bool,
}

/// Read-only projection of one upgrade.
#[derive(Clone, Debug, PartialEq)]
pub struct UpgradeView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub level: u32,
    pub max_level: u32,
    pub cost: f64,
    pub maxed: bool,
    pub unlocked: bool,
    pub affordable: bool,
}

/// Everything the presentation layer needs to render a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct GameView {
    pub currency: f64,
    pub total_earned: f64,
    pub total_clicks: u64,
    pub total_income: f64,
    pub click_power: f64,
    pub prestige_level: u32,
    pub prestige_points: u64,
    pub prestige_multiplier: f64,
    /// Points a prestige right now would award.
    pub pending_prestige_points: u64,
    pub can_prestige: bool,
    pub generators: Vec<GeneratorView>,
    pub upgrades: Vec<UpgradeView>,
}
