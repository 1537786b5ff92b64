//! Upgrade ledger: owns upgrade levels and composes their multipliers.

use crate::catalog::UpgradeDefinition;
use crate::economy;
use crate::state::{GeneratorId, UnlockContext};

/// A catalog entry paired with the level the player has reached.
#[derive(Clone, Debug, PartialEq)]
pub struct UpgradeInstance {
    pub definition: UpgradeDefinition,
    pub level: u32,
}

impl UpgradeInstance {
    pub fn new(definition: UpgradeDefinition) -> Self {
        Self {
            definition,
            level: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// Cost to reach the next level: `floor(base_cost * cost_multiplier^(level + 1))`.
    pub fn cost(&self) -> f64 {
        economy::generator_cost(
            self.definition.base_cost,
            self.level + 1,
            self.definition.cost_multiplier,
        )
    }

    pub fn is_maxed(&self) -> bool {
        self.level >= self.definition.max_level
    }

    /// `multiplier^level`; 1 at level 0.
    pub fn bonus(&self) -> f64 {
        self.definition.multiplier.powi(self.level as i32)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpgradeLedger {
    instances: Vec<UpgradeInstance>,
}

impl UpgradeLedger {
    /// One instance per catalog entry, all at level 0.
    pub fn new(catalog: &[UpgradeDefinition]) -> Self {
        Self {
            instances: catalog.iter().cloned().map(UpgradeInstance::new).collect(),
        }
    }

    pub fn instances(&self) -> &[UpgradeInstance] {
        &self.instances
    }

    pub fn get(&self, id: &str) -> Option<&UpgradeInstance> {
        self.instances.iter().find(|u| u.id() == id)
    }

    pub fn click_upgrades(&self) -> impl Iterator<Item = &UpgradeInstance> {
        self.instances.iter().filter(|u| u.definition.is_click())
    }

    pub fn generator_upgrades(&self) -> impl Iterator<Item = &UpgradeInstance> {
        self.instances.iter().filter(|u| !u.definition.is_click())
    }

    /// Sum of all levels owned.
    pub fn total_levels(&self) -> u32 {
        self.instances.iter().map(|u| u.level).sum()
    }

    /// Try to buy the next level of `id` with `currency` available.
    ///
    /// Returns the cost charged on success. Unknown ids, maxed upgrades and
    /// insufficient funds return `None` and leave the ledger untouched.
    pub fn purchase(&mut self, id: &str, currency: f64) -> Option<f64> {
        let instance = self.instances.iter_mut().find(|u| u.id() == id)?;
        if instance.is_maxed() {
            return None;
        }
        let cost = instance.cost();
        if currency < cost {
            return None;
        }
        instance.level += 1;
        Some(cost)
    }

    /// Product of every click upgrade's bonus (1 with nothing owned).
    pub fn total_click_multiplier(&self) -> f64 {
        self.click_upgrades().map(UpgradeInstance::bonus).product()
    }

    /// Product of the bonuses of generator upgrades that target `id` or all generators.
    pub fn generator_multiplier(&self, id: GeneratorId) -> f64 {
        self.generator_upgrades()
            .filter(|u| u.definition.boosts(id))
            .map(UpgradeInstance::bonus)
            .product()
    }

    /// Unlock predicates are evaluated live; nothing is cached.
    pub fn is_unlocked(&self, id: &str, ctx: &UnlockContext<'_>) -> bool {
        self.get(id).is_some_and(|u| u.definition.unlock.is_met(ctx))
    }

    /// Set a level directly, clamped to the upgrade's max. Used when restoring a save.
    pub(crate) fn restore_level(&mut self, id: &str, level: u32) -> bool {
        match self.instances.iter_mut().find(|u| u.id() == id) {
            Some(u) => {
                u.level = level.min(u.definition.max_level);
                true
            }
            None => false,
        }
    }

    /// Every level back to 0 (prestige).
    pub fn reset(&mut self) {
        for u in &mut self.instances {
            u.level = 0;
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::catalog::default_catalog;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_purchase_is_atomic(idx in 0usize..10, currency in 0.0f64..1e7) {
            let mut ledger = UpgradeLedger::new(&default_catalog());
            let id = ledger.instances()[idx].id().to_string();
            let cost = ledger.get(&id).unwrap().cost();
            let before = ledger.clone();
            match ledger.purchase(&id, currency) {
                Some(charged) => {
                    prop_assert!(currency >= cost);
                    prop_assert!((charged - cost).abs() < f64::EPSILON);
                    prop_assert_eq!(ledger.get(&id).unwrap().level, 1);
                }
                None => {
                    prop_assert!(currency < cost);
                    prop_assert_eq!(ledger, before);
                }
            }
        }

        #[test]
        fn prop_multipliers_at_least_one(levels in proptest::collection::vec(0u32..5, 10)) {
            let mut ledger = UpgradeLedger::new(&default_catalog());
            let ids: Vec<String> = ledger.instances().iter().map(|u| u.id().to_string()).collect();
            for (id, level) in ids.iter().zip(levels) {
                ledger.restore_level(id, level);
            }
            prop_assert!(ledger.total_click_multiplier() >= 1.0);
            for g in 1..=5 {
                prop_assert!(ledger.generator_multiplier(GeneratorId(g)) >= 1.0);
            }
        }
    }
}
