//! Character persistence
//!
//! The channel server talks to storage through [`CharacterStore`]. Rows come
//! back as loosely typed column maps, like a prepared query result, and are
//! converted into session state by the admission handler.
//!
//! [`MemoryStore`] is the bundled backend. It can be seeded from a JSON
//! document and keeps every save and online-flag update in memory.

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use shared::CharacterStats;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("column `{0}` missing from row")]
    MissingColumn(String),
    #[error("column `{0}` has the wrong type")]
    WrongType(String),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Text(String),
}

/// One result row with access by column name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: HashMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_int(mut self, column: &str, value: i64) -> Self {
        self.columns.insert(column.to_string(), Value::Int(value));
        self
    }

    pub fn with_text(mut self, column: &str, value: &str) -> Self {
        self.columns
            .insert(column.to_string(), Value::Text(value.to_string()));
        self
    }

    pub fn has(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn int(&self, column: &str) -> StorageResult<i64> {
        match self.columns.get(column) {
            Some(Value::Int(v)) => Ok(*v),
            Some(Value::Text(_)) => Err(StorageError::WrongType(column.to_string())),
            None => Err(StorageError::MissingColumn(column.to_string())),
        }
    }

    /// Integer column, or `default` if the column is absent
    pub fn int_or(&self, column: &str, default: i64) -> StorageResult<i64> {
        if self.has(column) {
            self.int(column)
        } else {
            Ok(default)
        }
    }

    pub fn text(&self, column: &str) -> StorageResult<&str> {
        match self.columns.get(column) {
            Some(Value::Text(v)) => Ok(v),
            Some(Value::Int(_)) => Err(StorageError::WrongType(column.to_string())),
            None => Err(StorageError::MissingColumn(column.to_string())),
        }
    }
}

/// Builds the stats block from a character row
pub fn stats_from_row(row: &Row) -> StorageResult<CharacterStats> {
    Ok(CharacterStats {
        id: row.int("character_id")? as i32,
        name: row.text("name")?.to_string(),
        gender: row.int("gender")? as u8,
        skin: row.int("skin")? as u8,
        face: row.int("face")? as i32,
        hair: row.int("hair")? as i32,
        level: row.int("level")? as u8,
        job: row.int("job")? as i16,
        str: row.int("str")? as i16,
        dex: row.int("dex")? as i16,
        int: row.int("int")? as i16,
        luk: row.int("luk")? as i16,
        hp: row.int("chp")? as i16,
        max_hp: row.int("mhp")? as i16,
        mp: row.int("cmp")? as i16,
        max_mp: row.int("mmp")? as i16,
        ap: row.int("ap")? as i16,
        sp: row.int("sp")? as i16,
        exp: row.int("exp")? as i32,
        fame: row.int("fame")? as i16,
        map_id: row.int("map")? as i32,
        spawn_point: row.int("pos")? as u8,
    })
}

/// State written back on every save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterSnapshot {
    pub character_id: i32,
    pub stats: CharacterStats,
    pub meso: i32,
    pub buddylist_size: u8,
}

#[async_trait]
pub trait CharacterStore: Send + Sync {
    /// Character row joined with the owning account's `gm_level` and `admin`
    async fn load_character(&self, character_id: i32) -> StorageResult<Vec<Row>>;

    async fn save_character(&self, snapshot: &CharacterSnapshot) -> StorageResult<()>;

    async fn set_online(&self, character_id: i32, online: bool) -> StorageResult<()>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountRecord {
    pub id: i32,
    #[serde(default)]
    pub gm_level: i32,
    #[serde(default)]
    pub admin: bool,
}

fn default_slots() -> [u8; 5] {
    [100; 5]
}

fn default_buddylist() -> u8 {
    20
}

#[derive(Debug, Clone, Deserialize)]
pub struct CharacterRecord {
    pub user_id: i32,
    pub world_id: i8,
    pub stats: CharacterStats,
    #[serde(default)]
    pub meso: i32,
    #[serde(default = "default_buddylist")]
    pub buddylist_size: u8,
    /// equip, use, set-up, etc, cash
    #[serde(default = "default_slots")]
    pub slots: [u8; 5],
    #[serde(default)]
    pub online: bool,
}

#[derive(Debug, Default, Deserialize)]
struct Seed {
    #[serde(default)]
    accounts: Vec<AccountRecord>,
    #[serde(default)]
    characters: Vec<CharacterRecord>,
}

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<i32, AccountRecord>,
    characters: HashMap<i32, CharacterRecord>,
    saves: usize,
}

/// In-memory implementation of [`CharacterStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a seed document of the form `{"accounts": [...], "characters": [...]}`
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let seed: Seed = serde_json::from_str(json)?;
        let mut tables = Tables::default();
        for account in seed.accounts {
            tables.accounts.insert(account.id, account);
        }
        for character in seed.characters {
            tables.characters.insert(character.stats.id, character);
        }
        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&json)?)
    }

    pub async fn insert_account(&self, account: AccountRecord) {
        self.tables.write().await.accounts.insert(account.id, account);
    }

    pub async fn insert_character(&self, character: CharacterRecord) {
        self.tables
            .write()
            .await
            .characters
            .insert(character.stats.id, character);
    }

    pub async fn character(&self, character_id: i32) -> Option<CharacterRecord> {
        self.tables.read().await.characters.get(&character_id).cloned()
    }

    pub async fn is_online(&self, character_id: i32) -> bool {
        self.tables
            .read()
            .await
            .characters
            .get(&character_id)
            .map_or(false, |c| c.online)
    }

    /// Number of successful character saves so far
    pub async fn save_count(&self) -> usize {
        self.tables.read().await.saves
    }
}

fn character_row(character: &CharacterRecord, account: &AccountRecord) -> Row {
    let s = &character.stats;
    Row::new()
        .with_int("character_id", s.id as i64)
        .with_int("user_id", character.user_id as i64)
        .with_int("world_id", character.world_id as i64)
        .with_text("name", &s.name)
        .with_int("gender", s.gender as i64)
        .with_int("skin", s.skin as i64)
        .with_int("face", s.face as i64)
        .with_int("hair", s.hair as i64)
        .with_int("level", s.level as i64)
        .with_int("job", s.job as i64)
        .with_int("str", s.str as i64)
        .with_int("dex", s.dex as i64)
        .with_int("int", s.int as i64)
        .with_int("luk", s.luk as i64)
        .with_int("chp", s.hp as i64)
        .with_int("mhp", s.max_hp as i64)
        .with_int("cmp", s.mp as i64)
        .with_int("mmp", s.max_mp as i64)
        .with_int("ap", s.ap as i64)
        .with_int("sp", s.sp as i64)
        .with_int("exp", s.exp as i64)
        .with_int("fame", s.fame as i64)
        .with_int("map", s.map_id as i64)
        .with_int("pos", s.spawn_point as i64)
        .with_int("meso", character.meso as i64)
        .with_int("buddylist_size", character.buddylist_size as i64)
        .with_int("equip_slots", character.slots[0] as i64)
        .with_int("use_slots", character.slots[1] as i64)
        .with_int("setup_slots", character.slots[2] as i64)
        .with_int("etc_slots", character.slots[3] as i64)
        .with_int("cash_slots", character.slots[4] as i64)
        .with_int("online", character.online as i64)
        .with_int("gm_level", account.gm_level as i64)
        .with_int("admin", account.admin as i64)
}

#[async_trait]
impl CharacterStore for MemoryStore {
    async fn load_character(&self, character_id: i32) -> StorageResult<Vec<Row>> {
        let tables = self.tables.read().await;
        let rows = tables
            .characters
            .get(&character_id)
            .and_then(|c| tables.accounts.get(&c.user_id).map(|a| character_row(c, a)))
            .into_iter()
            .collect();
        Ok(rows)
    }

    async fn save_character(&self, snapshot: &CharacterSnapshot) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        let character = tables
            .characters
            .get_mut(&snapshot.character_id)
            .ok_or_else(|| {
                StorageError::Backend(format!("no character {}", snapshot.character_id))
            })?;

        character.stats = snapshot.stats.clone();
        character.meso = snapshot.meso;
        character.buddylist_size = snapshot.buddylist_size;
        tables.saves += 1;

        debug!("Saved character {}", snapshot.character_id);
        Ok(())
    }

    async fn set_online(&self, character_id: i32, online: bool) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        let character = tables
            .characters
            .get_mut(&character_id)
            .ok_or_else(|| StorageError::Backend(format!("no character {}", character_id)))?;
        character.online = online;
        Ok(())
    }
}
