//! Economy engine for an idle/incremental clicker game.
//!
//! [`GameEngine`] owns the economy state and applies player actions and ticks
//! to it. Rendering is left to the host, which reads [`GameView`] and sends
//! actions through a [`Session`].

pub mod catalog;
pub mod config;
pub mod economy;
pub mod engine;
pub mod format;
pub mod ledger;
#[cfg(target_arch = "wasm32")]
pub mod logging;
pub mod save;
pub mod session;
pub mod state;
pub mod time;

pub use catalog::{UnlockCondition, UpgradeDefinition, UpgradeEffect, UpgradeTarget};
pub use config::{ConfigError, EngineConfig};
pub use engine::{GameEngine, OfflineEarnings, Phase};
pub use ledger::{UpgradeInstance, UpgradeLedger};
pub use save::{
    GameSnapshot, KeyValueStore, MemoryStore, PersistenceError, PersistenceGateway, StorageGateway,
};
pub use session::{Action, Command, Session};
pub use state::{GameView, GeneratorId, GeneratorSpec};
pub use time::{Clock, GameTime, ManualClock, SystemClock};
