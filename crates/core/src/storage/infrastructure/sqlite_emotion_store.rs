use std::path::Path;

use rusqlite::{params, Connection};
use thiserror::Error;

use crate::analysis::domain::emotion::EmotionLabel;
use crate::shared::constants::EMOTION_TABLE;
use crate::storage::domain::emotion_store::EmotionStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("emotion store: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// SQLite-backed label store with a single `emotion_data(id, emotion)`
/// table.
pub struct SqliteEmotionStore {
    conn: Connection,
}

impl SqliteEmotionStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let store = Self::with_connection(Connection::open(path)?)?;
        log::info!("Emotion store: {}", path.display());
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {EMOTION_TABLE} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    emotion TEXT NOT NULL
                )"
            ),
            [],
        )?;
        Ok(Self { conn })
    }

    pub fn insert(&self, emotion: &str) -> Result<(), StoreError> {
        self.conn.execute(
            &format!("INSERT INTO {EMOTION_TABLE} (emotion) VALUES (?1)"),
            params![emotion],
        )?;
        Ok(())
    }

    pub fn all(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT id, emotion FROM {EMOTION_TABLE} ORDER BY id"))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl EmotionStore for SqliteEmotionStore {
    fn record(&mut self, emotion: EmotionLabel) -> Result<(), Box<dyn std::error::Error>> {
        Ok(self.insert(emotion.as_str())?)
    }

    fn labels(&self) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        Ok(self.all()?)
    }
}
