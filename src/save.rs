//! スナップショットの保存と復元、およびキー・バリューストアへの永続化。
//!
//! ## 互換性
//!
//! - `SAVE_VERSION` はスナップショットに書き込む形式番号。
//! - `MIN_COMPATIBLE_VERSION` 未満のデータは壊れたデータと同じ扱いになり、
//!   バックアップ、それも駄目なら新規ゲームにフォールバックする。
//! - 欠けたフィールドや数値フィールドの `null` は既定値で埋める。
//!   知らないフィールドや、もう存在しない ID は読み飛ばす。
//!
//! 保存のたびに直前のセーブを `BACKUP_KEY` に退避しておく。

use std::collections::HashMap;

use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::engine::GameEngine;
use crate::state::GeneratorId;

/// 現在のスナップショット形式。
pub const SAVE_VERSION: u32 = 1;

/// これより古い形式は読み込まない。
pub const MIN_COMPATIBLE_VERSION: u32 = 1;

/// 現在のセーブを置くキー。
pub const STORAGE_KEY: &str = "@IdleGame:SaveData";

/// 一つ前のセーブを置くキー。
pub const BACKUP_KEY: &str = "@IdleGame:BackupData";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("snapshot (de)serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("snapshot version {found} is no longer supported")]
    Incompatible { found: u32 },
    #[error("storage error: {0}")]
    Storage(String),
    #[error("storage unavailable")]
    Unavailable,
}

// ── Snapshot ────────────────────────────────────────────────────

/// `null` を既定値として読む。
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `null` の version は現行形式とみなす。
fn null_as_current_version<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(SAVE_VERSION))
}

/// ジェネレーター 1 種類分の保存内容。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorSave {
    pub id: GeneratorId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unlocked: bool,
}

/// アップグレード 1 つ分のレベル。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeSave {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub level: u32,
}

/// ゲームを復元するのに必要なすべて。ストレージに書くのはこの単位。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameSnapshot {
    #[serde(deserialize_with = "null_as_current_version")]
    pub version: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub currency: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_clicks: u64,
    #[serde(alias = "totalEarned", deserialize_with = "null_as_default")]
    pub total_earnings: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub prestige_level: u32,
    /// `null` は 0 として読まれ、復元時に 1 へ補正される。
    #[serde(deserialize_with = "null_as_default")]
    pub prestige_multiplier: f64,
    /// 古いセーブには無い。無ければ倍率から逆算する。
    pub prestige_points: Option<u64>,
    #[serde(deserialize_with = "null_as_default")]
    pub generators: Vec<GeneratorSave>,
    #[serde(deserialize_with = "null_as_default")]
    pub upgrades: Vec<UpgradeSave>,
    /// Unix エポックからのミリ秒。
    pub last_save_time: Option<u64>,
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            version: SAVE_VERSION,
            currency: 0.0,
            total_clicks: 0,
            total_earnings: 0.0,
            prestige_level: 0,
            prestige_multiplier: 1.0,
            prestige_points: None,
            generators: Vec::new(),
            upgrades: Vec::new(),
            last_save_time: None,
        }
    }
}

impl GameSnapshot {
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string(self)?)
    }

    /// パースして形式番号を確認する。
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let snapshot: GameSnapshot = serde_json::from_str(json)?;
        if snapshot.version < MIN_COMPATIBLE_VERSION {
            return Err(PersistenceError::Incompatible {
                found: snapshot.version,
            });
        }
        if snapshot.version < SAVE_VERSION {
            info!(
                "migrating save data (saved={}, current={})",
                snapshot.version, SAVE_VERSION
            );
        }
        Ok(snapshot)
    }
}

/// JSON に書ける値へ丸める。NaN と負数は 0、+∞ は `f64::MAX`。
/// serde_json は非有限値を `null` で書くため。
fn persistable(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, f64::MAX)
    }
}

/// エンジンの永続化対象を抜き出す。
pub(crate) fn extract_snapshot(engine: &GameEngine, now_ms: u64) -> GameSnapshot {
    GameSnapshot {
        version: SAVE_VERSION,
        currency: persistable(engine.currency),
        total_clicks: engine.total_clicks,
        total_earnings: persistable(engine.total_earned),
        prestige_level: engine.prestige.level,
        prestige_multiplier: persistable(engine.prestige.multiplier).max(1.0),
        prestige_points: Some(engine.prestige.points),
        generators: engine
            .generators
            .iter()
            .map(|g| GeneratorSave {
                id: g.id(),
                count: g.count,
                unlocked: g.unlocked,
            })
            .collect(),
        upgrades: engine
            .ledger
            .instances()
            .iter()
            .map(|u| UpgradeSave {
                id: u.id().to_string(),
                level: u.level,
            })
            .collect(),
        last_save_time: Some(now_ms),
    }
}

/// 有限の非負値。それ以外は 0。
fn amount(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 {
        x
    } else {
        0.0
    }
}

/// 既定状態のエンジンにスナップショットを復元する。
/// もう存在しないジェネレーターやアップグレードの項目は読み飛ばす。
pub(crate) fn apply_snapshot(engine: &mut GameEngine, snapshot: &GameSnapshot) {
    engine.currency = amount(snapshot.currency);
    engine.total_earned = amount(snapshot.total_earnings);
    engine.total_clicks = snapshot.total_clicks;

    let multiplier = snapshot.prestige_multiplier;
    engine.prestige.multiplier = if multiplier.is_finite() && multiplier >= 1.0 {
        multiplier
    } else {
        1.0
    };
    engine.prestige.level = snapshot.prestige_level;
    engine.prestige.points = snapshot.prestige_points.unwrap_or_else(|| {
        let base = engine.config.prestige.base_multiplier;
        if base > 0.0 {
            ((engine.prestige.multiplier - 1.0) / base).round() as u64
        } else {
            0
        }
    });

    for save in &snapshot.generators {
        match engine.generators.iter_mut().find(|g| g.id() == save.id) {
            Some(g) => {
                g.count = save.count;
                g.unlocked = g.unlocked || save.unlocked;
            }
            None => warn!("save references unknown generator {}, skipped", save.id),
        }
    }

    for save in &snapshot.upgrades {
        if !engine.ledger.restore_level(&save.id, save.level) {
            warn!("save references unknown upgrade {:?}, skipped", save.id);
        }
    }
}

// ── Storage ─────────────────────────────────────────────────────

/// A durable string key-value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// In-process store. Writes can be made to fail to exercise error paths.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    reject_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if self.reject_writes {
            return Err(PersistenceError::Storage(format!("write to {key} rejected")));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        if self.reject_writes {
            return Err(PersistenceError::Storage(format!("remove of {key} rejected")));
        }
        self.entries.remove(key);
        Ok(())
    }
}

/// Browser `localStorage`. Only available on WASM.
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    pub fn open() -> Result<Self, PersistenceError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(PersistenceError::Unavailable)?;
        Ok(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.storage
            .get_item(key)
            .map_err(|e| PersistenceError::Storage(format!("{e:?}")))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| PersistenceError::Storage(format!("{e:?}")))
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.storage
            .remove_item(key)
            .map_err(|e| PersistenceError::Storage(format!("{e:?}")))
    }
}

// ── Gateway ─────────────────────────────────────────────────────

/// Load/save contract the engine depends on.
pub trait PersistenceGateway {
    fn save(&mut self, snapshot: &GameSnapshot) -> Result<(), PersistenceError>;
    /// The last good snapshot, or `None` if nothing usable is stored.
    fn load(&mut self) -> Option<GameSnapshot>;
    /// Delete every key this game owns.
    fn clear(&mut self) -> Result<(), PersistenceError>;
}

/// JSON snapshots in a key-value store, with the previous save kept as a backup.
#[derive(Clone, Debug, Default)]
pub struct StorageGateway<S> {
    store: S,
}

impl<S: KeyValueStore> StorageGateway<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn read(&self, key: &str) -> Option<GameSnapshot> {
        let json = match self.store.get(key) {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                warn!("reading {key} failed: {e}");
                return None;
            }
        };
        match GameSnapshot::from_json(&json) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("discarding unreadable save under {key}: {e}");
                None
            }
        }
    }

    /// Raw JSON of the current save, for sharing or manual backup.
    pub fn export(&self) -> Option<String> {
        self.store.get(STORAGE_KEY).ok().flatten()
    }

    /// Validate and store a save string as the current save.
    pub fn import(&mut self, json: &str) -> Result<GameSnapshot, PersistenceError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.get("currency").is_some_and(serde_json::Value::is_number) {
            return Err(PersistenceError::Storage("save data has no currency".into()));
        }
        let snapshot = GameSnapshot::from_json(json)?;
        self.store.set(STORAGE_KEY, json)?;
        info!("save data imported");
        Ok(snapshot)
    }
}

impl<S: KeyValueStore> PersistenceGateway for StorageGateway<S> {
    fn save(&mut self, snapshot: &GameSnapshot) -> Result<(), PersistenceError> {
        let json = snapshot.to_json()?;
        let previous = self.store.get(STORAGE_KEY).unwrap_or_else(|e| {
            warn!("could not read previous save for backup: {e}");
            None
        });

        self.store.set(STORAGE_KEY, &json)?;

        if let Some(previous) = previous {
            if let Err(e) = self.store.set(BACKUP_KEY, &previous) {
                warn!("backup write failed: {e}");
            }
        }
        Ok(())
    }

    fn load(&mut self) -> Option<GameSnapshot> {
        if let Some(snapshot) = self.read(STORAGE_KEY) {
            info!("game loaded");
            return Some(snapshot);
        }
        if let Some(snapshot) = self.read(BACKUP_KEY) {
            info!("loaded backup save data");
            return Some(snapshot);
        }
        None
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        self.store.remove(STORAGE_KEY)?;
        self.store.remove(BACKUP_KEY)?;
        info!("game data cleared");
        Ok(())
    }
}
