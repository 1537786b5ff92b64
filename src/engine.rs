//! Game engine: owns the economy state and applies player actions and ticks.
//!
//! All actions return `bool`: a rejected purchase or an early prestige is an
//! expected outcome, not an error, and leaves the state untouched.

use log::{debug, info};

use crate::config::EngineConfig;
use crate::economy;
use crate::ledger::UpgradeLedger;
use crate::save::{self, GameSnapshot, PersistenceGateway};
use crate::state::{
    GameView, Generator, GeneratorId, GeneratorView, PrestigeState, UnlockContext, UpgradeView,
};

/// Lifecycle of an engine. Actions are only accepted while `Running`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Loading,
    Running,
}

/// Income credited for the time the game was closed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OfflineEarnings {
    /// Wall time since the snapshot was written.
    pub elapsed_ms: u64,
    /// Portion of `elapsed_ms` that earned income (after threshold and cap).
    pub credited_ms: u64,
    pub gain: f64,
}

#[derive(Clone, Debug)]
pub struct GameEngine {
    pub(crate) config: EngineConfig,
    pub(crate) phase: Phase,
    pub(crate) currency: f64,
    /// Earned during the current prestige run.
    pub(crate) total_earned: f64,
    pub(crate) total_clicks: u64,
    pub(crate) generators: Vec<Generator>,
    pub(crate) prestige: PrestigeState,
    pub(crate) ledger: UpgradeLedger,
}

impl GameEngine {
    /// An engine waiting to be loaded.
    pub fn new(config: EngineConfig) -> Self {
        let generators = config.generators.iter().cloned().map(Generator::new).collect();
        let ledger = UpgradeLedger::new(&config.upgrades);
        Self {
            config,
            phase: Phase::Uninitialized,
            currency: 0.0,
            total_earned: 0.0,
            total_clicks: 0,
            generators,
            prestige: PrestigeState::default(),
            ledger,
        }
    }

    /// A fresh game, already running.
    pub fn new_game(config: EngineConfig) -> Self {
        let mut engine = Self::new(config);
        engine.finish_loading(None, 0);
        engine
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    // ── Loading ────────────────────────────────────────────────────

    /// Uninitialized → Loading. Returns false from any other phase.
    pub fn begin_loading(&mut self) -> bool {
        if self.phase != Phase::Uninitialized {
            return false;
        }
        self.phase = Phase::Loading;
        true
    }

    /// Loading → Running: hydrate from `snapshot` (or defaults) and credit offline income.
    pub fn finish_loading(
        &mut self,
        snapshot: Option<&GameSnapshot>,
        now_ms: u64,
    ) -> OfflineEarnings {
        if self.phase == Phase::Running {
            return OfflineEarnings::default();
        }
        self.reset_to_defaults();

        let offline = match snapshot {
            Some(snapshot) => {
                save::apply_snapshot(self, snapshot);
                match snapshot.last_save_time {
                    Some(saved_at) => self.apply_offline_earnings(now_ms.saturating_sub(saved_at)),
                    None => OfflineEarnings::default(),
                }
            }
            None => {
                info!("no saved game, starting fresh");
                OfflineEarnings::default()
            }
        };

        self.phase = Phase::Running;
        offline
    }

    /// Full start-up path: request the snapshot from `gateway` and enter `Running`.
    pub fn start<G: PersistenceGateway>(
        &mut self,
        gateway: &mut G,
        now_ms: u64,
    ) -> OfflineEarnings {
        self.begin_loading();
        let snapshot = gateway.load();
        self.finish_loading(snapshot.as_ref(), now_ms)
    }

    fn apply_offline_earnings(&mut self, elapsed_ms: u64) -> OfflineEarnings {
        let offline = &self.config.offline;
        let Some(credited_ms) =
            economy::offline_window_ms(elapsed_ms, offline.min_elapsed_ms, offline.max_elapsed_ms)
        else {
            return OfflineEarnings {
                elapsed_ms,
                ..OfflineEarnings::default()
            };
        };

        let gain = self.total_income() * (credited_ms as f64 / 1000.0);
        self.earn(gain);
        info!(
            "offline for {} ms, credited {} ms, gained {:.2}",
            elapsed_ms, credited_ms, gain
        );
        OfflineEarnings {
            elapsed_ms,
            credited_ms,
            gain,
        }
    }

    fn reset_to_defaults(&mut self) {
        self.currency = 0.0;
        self.total_earned = 0.0;
        self.total_clicks = 0;
        self.generators = self.config.generators.iter().cloned().map(Generator::new).collect();
        self.prestige = PrestigeState::default();
        self.ledger = UpgradeLedger::new(&self.config.upgrades);
    }

    // ── Queries ────────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn currency(&self) -> f64 {
        self.currency
    }

    pub fn total_earned(&self) -> f64 {
        self.total_earned
    }

    pub fn total_clicks(&self) -> u64 {
        self.total_clicks
    }

    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    pub fn generator(&self, id: GeneratorId) -> Option<&Generator> {
        self.generators.iter().find(|g| g.id() == id)
    }

    pub fn ledger(&self) -> &UpgradeLedger {
        &self.ledger
    }

    pub fn prestige_state(&self) -> &PrestigeState {
        &self.prestige
    }

    /// Prestige points accumulated over every reset.
    pub fn prestige_points(&self) -> u64 {
        self.prestige.points
    }

    /// Currency per second from all generators, with upgrades and prestige applied.
    pub fn total_income(&self) -> f64 {
        economy::total_income(
            &self.generators,
            |id| self.ledger.generator_multiplier(id),
            self.prestige.multiplier,
        )
    }

    /// Currency gained by one click.
    pub fn click_value(&self) -> f64 {
        self.config.base_click_power
            * self.ledger.total_click_multiplier()
            * self.prestige.multiplier
    }

    /// Points a prestige right now would award (0 below the threshold).
    pub fn pending_prestige_points(&self) -> u64 {
        economy::prestige_points_earned(self.total_earned, self.config.prestige.threshold)
    }

    pub fn can_prestige(&self) -> bool {
        self.is_running() && self.total_earned >= self.config.prestige.threshold
    }

    pub fn unlock_context(&self) -> UnlockContext<'_> {
        UnlockContext {
            currency: self.currency,
            total_clicks: self.total_clicks,
            total_income: self.total_income(),
            prestige_level: self.prestige.level,
            generators: &self.generators,
        }
    }

    /// Deep copy of the persistent state, stamped with `now_ms`.
    pub fn snapshot(&self, now_ms: u64) -> GameSnapshot {
        save::extract_snapshot(self, now_ms)
    }

    /// Read-only projection for the presentation layer.
    pub fn view(&self) -> GameView {
        let ctx = self.unlock_context();
        let generators = self
            .generators
            .iter()
            .map(|g| {
                let cost = g.cost();
                GeneratorView {
                    id: g.id(),
                    name: g.spec.name.clone(),
                    count: g.count,
                    cost,
                    income_per_unit: g.spec.base_income
                        * self.ledger.generator_multiplier(g.id())
                        * self.prestige.multiplier,
                    unlocked: g.unlocked,
                    affordable: self.currency >= cost,
                }
            })
            .collect();
        let upgrades = self
            .ledger
            .instances()
            .iter()
            .map(|u| {
                let cost = u.cost();
                let maxed = u.is_maxed();
                UpgradeView {
                    id: u.id().to_string(),
                    name: u.definition.name.clone(),
                    description: u.definition.description.clone(),
                    level: u.level,
                    max_level: u.definition.max_level,
                    cost,
                    maxed,
                    unlocked: u.definition.unlock.is_met(&ctx),
                    affordable: !maxed && self.currency >= cost,
                }
            })
            .collect();

        GameView {
            currency: self.currency,
            total_earned: self.total_earned,
            total_clicks: self.total_clicks,
            total_income: ctx.total_income,
            click_power: self.click_value(),
            prestige_level: self.prestige.level,
            prestige_points: self.prestige.points,
            prestige_multiplier: self.prestige.multiplier,
            pending_prestige_points: self.pending_prestige_points(),
            can_prestige: self.can_prestige(),
            generators,
            upgrades,
        }
    }

    // ── Actions ────────────────────────────────────────────────────

    fn earn(&mut self, amount: f64) {
        self.currency += amount;
        self.total_earned += amount;
    }

    /// Manual click: earn `click_value()` and count the click.
    pub fn click(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        let value = self.click_value();
        self.earn(value);
        self.total_clicks += 1;
        true
    }

    /// Try to buy one unit of a generator. Returns true if successful.
    pub fn buy_generator(&mut self, id: GeneratorId) -> bool {
        if !self.is_running() {
            return false;
        }
        let Some(generator) = self.generators.iter_mut().find(|g| g.id() == id) else {
            debug!("buy_generator: unknown generator {}", id);
            return false;
        };
        let cost = generator.cost();
        if self.currency < cost {
            debug!("buy_generator: {} costs {}, have {}", id, cost, self.currency);
            return false;
        }
        self.currency -= cost;
        generator.count += 1;
        true
    }

    /// Try to buy the next level of an upgrade. Currency and level change together or not at all.
    pub fn buy_upgrade(&mut self, id: &str) -> bool {
        if !self.is_running() {
            return false;
        }
        match self.ledger.purchase(id, self.currency) {
            Some(cost) => {
                self.currency -= cost;
                true
            }
            None => {
                debug!("buy_upgrade: {:?} rejected", id);
                false
            }
        }
    }

    /// Accrue `delta_seconds` of passive income, then refresh generator unlocks.
    ///
    /// Income is a per-second rate, so splitting a duration over many ticks
    /// accrues the same amount as one long tick.
    pub fn tick(&mut self, delta_seconds: f64) {
        if !self.is_running() {
            return;
        }
        if delta_seconds.is_finite() && delta_seconds > 0.0 {
            let gain = self.total_income() * delta_seconds;
            self.earn(gain);
        }
        let currency = self.currency;
        for g in &mut self.generators {
            g.refresh_unlock(currency);
        }
    }

    /// Reset the run in exchange for prestige points. Returns false below the threshold.
    ///
    /// Clicks, prestige level/points/multiplier and generator unlocks survive.
    pub fn prestige(&mut self) -> bool {
        if !self.can_prestige() {
            debug!(
                "prestige: earned {} of {} required",
                self.total_earned, self.config.prestige.threshold
            );
            return false;
        }

        let earned = self.pending_prestige_points();
        self.prestige.level += 1;
        self.prestige.points += earned;
        let multiplier = economy::prestige_multiplier_from_points(
            self.prestige.points,
            self.config.prestige.base_multiplier,
        );
        self.prestige.multiplier = self.prestige.multiplier.max(multiplier);

        self.currency = 0.0;
        self.total_earned = 0.0;
        for g in &mut self.generators {
            g.count = 0;
        }
        self.ledger.reset();

        info!(
            "prestige #{}: +{} points (total {}), multiplier x{:.2}",
            self.prestige.level, earned, self.prestige.points, self.prestige.multiplier
        );
        true
    }

    /// Wipe everything, prestige included, back to a fresh running game.
    pub fn hard_reset(&mut self) {
        self.reset_to_defaults();
        self.phase = Phase::Running;
        info!("game hard reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{UnlockCondition, UpgradeDefinition, UpgradeEffect};
    use crate::save::{MemoryStore, StorageGateway};

    fn running() -> GameEngine {
        GameEngine::new_game(EngineConfig::default())
    }

    // ── Lifecycle ─────────────────────────────────────────────

    #[test]
    fn new_engine_is_uninitialized_and_rejects_actions() {
        let mut engine = GameEngine::new(EngineConfig::default());
        assert_eq!(engine.phase(), Phase::Uninitialized);
        assert!(!engine.click());
        engine.tick(10.0);
        assert!((engine.currency() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn loading_transitions() {
        let mut engine = GameEngine::new(EngineConfig::default());
        assert!(engine.begin_loading());
        assert_eq!(engine.phase(), Phase::Loading);
        assert!(!engine.begin_loading());
        engine.finish_loading(None, 1_000);
        assert_eq!(engine.phase(), Phase::Running);
    }

    #[test]
    fn start_with_empty_storage_uses_defaults() {
        let mut gateway = StorageGateway::new(MemoryStore::new());
        let mut engine = GameEngine::new(EngineConfig::default());
        let offline = engine.start(&mut gateway, 5_000);
        assert!(engine.is_running());
        assert_eq!(offline, OfflineEarnings::default());
        assert!(engine.generators().iter().all(|g| g.count == 0));
        assert!((engine.currency() - 0.0).abs() < f64::EPSILON);
    }

    // ── Click ─────────────────────────────────────────────────

    #[test]
    fn click_adds_value_and_counts() {
        let mut engine = running();
        assert!(engine.click());
        assert!((engine.currency() - 1.0).abs() < 0.001);
        assert!((engine.total_earned() - 1.0).abs() < 0.001);
        assert_eq!(engine.total_clicks(), 1);
    }

    #[test]
    fn click_uses_upgrades_and_prestige() {
        let mut engine = running();
        engine.ledger.restore_level("click_power_1", 2);
        engine.prestige.multiplier = 1.5;
        engine.click();
        let expected = 1.2_f64.powi(2) * 1.5;
        assert!((engine.currency() - expected).abs() < 1e-9);
    }

    // ── Generators ────────────────────────────────────────────

    #[test]
    fn buy_generator_success() {
        let mut engine = running();
        engine.currency = 25.0;
        assert!(engine.buy_generator(GeneratorId(1)));
        assert!((engine.currency() - 15.0).abs() < 0.001);
        let g = engine.generator(GeneratorId(1)).unwrap();
        assert_eq!(g.count, 1);
        assert!((g.cost() - 11.0).abs() < 0.001);
    }

    #[test]
    fn buy_generator_insufficient_funds() {
        let mut engine = running();
        engine.currency = 9.0;
        assert!(!engine.buy_generator(GeneratorId(1)));
        assert!((engine.currency() - 9.0).abs() < f64::EPSILON);
        assert_eq!(engine.generator(GeneratorId(1)).unwrap().count, 0);
    }

    #[test]
    fn buy_generator_unknown_id() {
        let mut engine = running();
        engine.currency = 1e9;
        assert!(!engine.buy_generator(GeneratorId(42)));
        assert!((engine.currency() - 1e9).abs() < f64::EPSILON);
    }

    #[test]
    fn buy_generator_exact_cost() {
        let mut engine = running();
        engine.currency = 10.0;
        assert!(engine.buy_generator(GeneratorId(1)));
        assert!((engine.currency() - 0.0).abs() < f64::EPSILON);
    }

    // ── Upgrades ──────────────────────────────────────────────

    #[test]
    fn buy_upgrade_debits_currency() {
        let mut engine = running();
        engine.currency = 200.0;
        assert!(engine.buy_upgrade("click_power_1"));
        assert!((engine.currency() - 50.0).abs() < 0.001);
        assert_eq!(engine.ledger().get("click_power_1").unwrap().level, 1);
    }

    #[test]
    fn buy_upgrade_insufficient_funds_changes_nothing() {
        let mut engine = running();
        engine.currency = 149.0;
        assert!(!engine.buy_upgrade("click_power_1"));
        assert!((engine.currency() - 149.0).abs() < f64::EPSILON);
        assert_eq!(engine.ledger().total_levels(), 0);
    }

    #[test]
    fn buy_upgrade_ignores_unlock_predicate() {
        let mut engine = running();
        engine.currency = 1e7;
        // quantum_boost unlocks at prestige level 1; purchase is still allowed.
        assert!(!engine.ledger().is_unlocked("quantum_boost", &engine.unlock_context()));
        assert!(engine.buy_upgrade("quantum_boost"));
    }

    // ── Tick ──────────────────────────────────────────────────

    #[test]
    fn tick_produces_income() {
        let mut engine = running();
        engine.generators[0].count = 10; // 10/s
        engine.tick(1.0);
        assert!((engine.currency() - 10.0).abs() < 0.001);
        assert!((engine.total_earned() - 10.0).abs() < 0.001);
    }

    #[test]
    fn tick_zero_and_negative_do_nothing() {
        let mut engine = running();
        engine.generators[0].count = 10;
        engine.tick(0.0);
        engine.tick(-5.0);
        engine.tick(f64::NAN);
        assert!((engine.currency() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tick_applies_generator_upgrades() {
        let mut engine = running();
        engine.generators[0].count = 10;
        engine.ledger.restore_level("generator_efficiency_1", 1); // x1.5 all
        engine.ledger.restore_level("generator_speed_1", 1); // x1.3 on #1
        engine.tick(2.0);
        let expected = 10.0 * 1.5 * 1.3 * 2.0;
        assert!((engine.currency() - expected).abs() < 1e-6);
    }

    #[test]
    fn tick_unlocks_generators_monotonically() {
        let mut engine = running();
        assert!(!engine.generator(GeneratorId(2)).unwrap().unlocked);
        engine.currency = 60.0;
        engine.tick(0.1);
        assert!(engine.generator(GeneratorId(2)).unwrap().unlocked);
        engine.currency = 0.0;
        engine.tick(0.1);
        assert!(engine.generator(GeneratorId(2)).unwrap().unlocked);
        assert!(!engine.generator(GeneratorId(3)).unwrap().unlocked);
    }

    #[test]
    fn tick_cadence_independent() {
        let mut one = running();
        let mut many = running();
        for e in [&mut one, &mut many] {
            e.generators[0].count = 7;
            e.generators[1].count = 3;
        }
        one.tick(10.0);
        for _ in 0..100 {
            many.tick(0.1);
        }
        assert!((one.currency() - many.currency()).abs() < 1e-6);
    }

    // ── Prestige ──────────────────────────────────────────────

    #[test]
    fn prestige_below_threshold_rejected() {
        let mut engine = running();
        engine.currency = 500.0;
        engine.total_earned = 999_999.0;
        engine.generators[0].count = 4;
        let before = engine.snapshot(0);
        assert!(!engine.prestige());
        assert_eq!(engine.snapshot(0), before);
    }

    #[test]
    fn prestige_resets_run_and_keeps_progress() {
        let mut engine = running();
        engine.currency = 5e6;
        engine.total_earned = 4e6;
        engine.total_clicks = 77;
        engine.generators[0].count = 12;
        engine.generators[3].count = 2;
        engine.ledger.restore_level("click_power_1", 3);

        assert!(engine.prestige());
        assert!((engine.currency() - 0.0).abs() < f64::EPSILON);
        assert!((engine.total_earned() - 0.0).abs() < f64::EPSILON);
        assert!(engine.generators().iter().all(|g| g.count == 0));
        assert!((engine.generator(GeneratorId(1)).unwrap().cost() - 10.0).abs() < 0.001);
        assert_eq!(engine.ledger().total_levels(), 0);
        assert_eq!(engine.prestige_state().level, 1);
        assert_eq!(engine.prestige_state().points, 2);
        assert!((engine.prestige_state().multiplier - 1.2).abs() < 1e-9);
        assert_eq!(engine.total_clicks(), 77);
    }

    #[test]
    fn prestige_points_accumulate() {
        let mut engine = running();
        engine.total_earned = 1e6;
        assert!(engine.prestige());
        engine.total_earned = 9e6;
        assert!(engine.prestige());
        assert_eq!(engine.prestige_state().level, 2);
        assert_eq!(engine.prestige_state().points, 4);
        assert!((engine.prestige_state().multiplier - 1.4).abs() < 1e-9);
    }

    #[test]
    fn prestige_keeps_unlocks() {
        let mut engine = running();
        engine.currency = 1e6;
        engine.total_earned = 1e6;
        engine.tick(0.1);
        assert!(engine.prestige());
        assert!(engine.generators().iter().all(|g| g.unlocked));
    }

    // ── Offline earnings ──────────────────────────────────────

    fn snapshot_with_income(per_sec_units: u32, saved_at: u64) -> GameSnapshot {
        let mut engine = running();
        engine.generators[0].count = per_sec_units; // 1/s each
        engine.snapshot(saved_at)
    }

    #[test]
    fn offline_earnings_capped_at_24h() {
        let snapshot = snapshot_with_income(10, 0);
        let mut engine = GameEngine::new(EngineConfig::default());
        let offline = engine.finish_loading(Some(&snapshot), 48 * 3_600_000);
        let expected = 10.0 * 24.0 * 3600.0;
        assert!((offline.gain - expected).abs() < 1e-6);
        assert_eq!(offline.credited_ms, 24 * 3_600_000);
        assert!((engine.currency() - expected).abs() < 1e-6);
        assert!((engine.total_earned() - expected).abs() < 1e-6);
    }

    #[test]
    fn offline_earnings_below_threshold_ignored() {
        let snapshot = snapshot_with_income(10, 1_000);
        let mut engine = GameEngine::new(EngineConfig::default());
        let offline = engine.finish_loading(Some(&snapshot), 61_000);
        assert_eq!(offline.elapsed_ms, 60_000);
        assert!((offline.gain - 0.0).abs() < f64::EPSILON);
        assert!((engine.currency() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn offline_earnings_use_restored_multipliers() {
        let mut source = running();
        source.generators[0].count = 10;
        source.prestige.multiplier = 2.0;
        source.prestige.points = 10;
        source.ledger.restore_level("generator_efficiency_1", 2);
        let snapshot = source.snapshot(0);

        let mut engine = GameEngine::new(EngineConfig::default());
        let offline = engine.finish_loading(Some(&snapshot), 100_000);
        let expected = 10.0 * 1.5_f64.powi(2) * 2.0 * 100.0;
        assert!((offline.gain - expected).abs() < 1e-6);
    }

    #[test]
    fn clock_going_backwards_earns_nothing() {
        let snapshot = snapshot_with_income(10, 1_000_000);
        let mut engine = GameEngine::new(EngineConfig::default());
        let offline = engine.finish_loading(Some(&snapshot), 0);
        assert_eq!(offline.elapsed_ms, 0);
        assert!((engine.currency() - 0.0).abs() < f64::EPSILON);
    }

    // ── View ──────────────────────────────────────────────────

    #[test]
    fn view_reports_affordability_and_unlocks() {
        let mut engine = running();
        engine.currency = 120.0;
        let view = engine.view();
        assert!(view.generators[0].affordable);
        assert!(view.generators[1].affordable);
        assert!(!view.generators[2].affordable);
        let power_1 = view.upgrades.iter().find(|u| u.id == "click_power_1").unwrap();
        assert!(power_1.unlocked);
        assert!(!power_1.affordable); // 150
        let quantum = view.upgrades.iter().find(|u| u.id == "quantum_boost").unwrap();
        assert!(!quantum.unlocked);
        assert!((view.click_power - 1.0).abs() < f64::EPSILON);
        assert!(!view.can_prestige);
    }

    #[test]
    fn view_maxed_upgrade_not_affordable() {
        let mut config = EngineConfig::default();
        config.upgrades = vec![UpgradeDefinition {
            id: "one".into(),
            name: "One".into(),
            description: String::new(),
            base_cost: 1.0,
            cost_multiplier: 2.0,
            multiplier: 2.0,
            max_level: 1,
            effect: UpgradeEffect::ClickMultiplier,
            unlock: UnlockCondition::Always,
        }];
        let mut engine = GameEngine::new_game(config);
        engine.currency = 100.0;
        assert!(engine.buy_upgrade("one"));
        let view = engine.view();
        assert!(view.upgrades[0].maxed);
        assert!(!view.upgrades[0].affordable);
        assert!(!engine.buy_upgrade("one"));
    }

    #[test]
    fn hard_reset_clears_prestige() {
        let mut engine = running();
        engine.total_earned = 4e6;
        engine.total_clicks = 5;
        engine.prestige();
        engine.hard_reset();
        assert_eq!(engine.prestige_state(), &PrestigeState::default());
        assert_eq!(engine.total_clicks(), 0);
        assert!(engine.is_running());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_tick_never_reduces_currency(
            counts in proptest::collection::vec(0u32..50, 5),
            deltas in proptest::collection::vec(0.0f64..10.0, 1..20),
        ) {
            let mut engine = GameEngine::new_game(EngineConfig::default());
            for (g, c) in engine.generators.iter_mut().zip(counts) {
                g.count = c;
            }
            let mut last = engine.currency();
            for d in deltas {
                engine.tick(d);
                prop_assert!(engine.currency() >= last);
                last = engine.currency();
            }
        }

        #[test]
        fn prop_split_ticks_match_single_tick(
            count in 1u32..100,
            total in 0.1f64..100.0,
            pieces in 1usize..50,
        ) {
            let mut one = GameEngine::new_game(EngineConfig::default());
            let mut many = GameEngine::new_game(EngineConfig::default());
            one.generators[2].count = count;
            many.generators[2].count = count;
            one.tick(total);
            for _ in 0..pieces {
                many.tick(total / pieces as f64);
            }
            let tolerance = one.currency().abs() * 1e-9 + 1e-9;
            prop_assert!((one.currency() - many.currency()).abs() <= tolerance,
                "{} vs {}", one.currency(), many.currency());
        }

        #[test]
        fn prop_buy_generator_atomic(idx in 0usize..5, currency in 0.0f64..200_000.0) {
            let mut engine = GameEngine::new_game(EngineConfig::default());
            engine.currency = currency;
            let id = engine.generators[idx].id();
            let cost = engine.generators[idx].cost();
            if engine.buy_generator(id) {
                prop_assert!(currency >= cost);
                prop_assert!((engine.currency() - (currency - cost)).abs() < 1e-9);
                prop_assert_eq!(engine.generators[idx].count, 1);
            } else {
                prop_assert!(currency < cost);
                prop_assert_eq!(engine.currency(), currency);
                prop_assert_eq!(engine.generators[idx].count, 0);
            }
        }

        #[test]
        fn prop_currency_never_negative(actions in proptest::collection::vec(0u8..4, 0..200)) {
            let mut engine = GameEngine::new_game(EngineConfig::default());
            for a in actions {
                match a {
                    0 => { engine.click(); }
                    1 => { engine.buy_generator(GeneratorId(1)); }
                    2 => { engine.buy_upgrade("click_power_1"); }
                    _ => engine.tick(0.5),
                }
                prop_assert!(engine.currency() >= 0.0);
            }
        }
    }
}
