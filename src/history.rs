use std::collections::VecDeque;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::session::Score;

/// Number of most recent scores kept
pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub wpm: u32,
    pub accuracy: u32,
    pub timestamp: DateTime<Local>,
}

impl ScoreRecord {
    pub fn new(score: Score, timestamp: DateTime<Local>) -> Self {
        Self {
            wpm: score.wpm,
            accuracy: score.accuracy,
            timestamp,
        }
    }

    pub fn now(score: Score) -> Self {
        Self::new(score, Local::now())
    }
}

/// Capped, newest-first score history
pub trait ScoreStore {
    fn record(&mut self, record: ScoreRecord) -> Result<()>;
    /// Newest first
    fn recent(&self) -> Result<Vec<ScoreRecord>>;
}

#[derive(Debug)]
pub struct MemoryScoreStore {
    records: VecDeque<ScoreRecord>,
    limit: usize,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::with_limit(HISTORY_LIMIT)
    }

    /// `limit` is at least one: the latest score is always kept
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            records: VecDeque::with_capacity(limit),
            limit,
        }
    }
}

impl Default for MemoryScoreStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn record(&mut self, record: ScoreRecord) -> Result<()> {
        self.records.push_front(record);
        self.records.truncate(self.limit);
        Ok(())
    }

    fn recent(&self) -> Result<Vec<ScoreRecord>> {
        Ok(self.records.iter().cloned().collect())
    }
}

/// SQLite backed history, one row per finished test
#[derive(Debug)]
pub struct SqliteScoreStore {
    conn: Connection,
    limit: usize,
}

impl SqliteScoreStore {
    pub fn open<P: AsRef<Path>>(path: P, limit: usize) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open score history at {}", path.display()))?;
        Self::init(conn, limit)
    }

    pub fn open_in_memory(limit: usize) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, limit)
    }

    fn init(conn: Connection, limit: usize) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                wpm INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
            [],
        )?;

        Ok(Self {
            conn,
            limit: limit.max(1),
        })
    }

    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM scores", [])?;
        Ok(())
    }
}

impl ScoreStore for SqliteScoreStore {
    fn record(&mut self, record: ScoreRecord) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO scores (wpm, accuracy, timestamp) VALUES (?1, ?2, ?3)",
            params![record.wpm, record.accuracy, record.timestamp.to_rfc3339()],
        )?;
        tx.execute(
            "DELETE FROM scores WHERE id NOT IN (SELECT id FROM scores ORDER BY id DESC LIMIT ?1)",
            params![self.limit as i64],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn recent(&self) -> Result<Vec<ScoreRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT wpm, accuracy, timestamp FROM scores ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![self.limit as i64], |row| {
            let timestamp_str: String = row.get(2)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        2,
                        "timestamp".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(ScoreRecord {
                wpm: row.get(0)?,
                accuracy: row.get(1)?,
                timestamp,
            })
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }

        Ok(records)
    }
}

/// Aggregates over the stored history
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub count: usize,
    pub best_wpm: u32,
    pub mean_wpm: f64,
    pub wpm_std_dev: f64,
    pub mean_accuracy: f64,
}

impl HistorySummary {
    pub fn from_records(records: &[ScoreRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        let count = records.len() as f64;
        let mean_wpm = records.iter().map(|r| r.wpm as f64).sum::<f64>() / count;
        let variance = records
            .iter()
            .map(|r| {
                let diff = mean_wpm - r.wpm as f64;
                diff * diff
            })
            .sum::<f64>()
            / count;

        Some(Self {
            count: records.len(),
            best_wpm: records.iter().map(|r| r.wpm).max().unwrap_or(0),
            mean_wpm,
            wpm_std_dev: variance.sqrt(),
            mean_accuracy: records.iter().map(|r| r.accuracy as f64).sum::<f64>() / count,
        })
    }
}

/// "3 minutes ago" style age of a record
pub fn describe_age(record: &ScoreRecord, now: DateTime<Local>) -> String {
    let secs = (now - record.timestamp).num_seconds().max(0);
    if secs < 1 {
        return "just now".to_string();
    }
    HumanTime::from_seconds(secs).to_text_en(Accuracy::Rough, Tense::Past)
}

#[derive(Serialize)]
struct CsvRow {
    timestamp: String,
    wpm: u32,
    accuracy: u32,
}

pub fn export_csv<P: AsRef<Path>>(records: &[ScoreRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    for record in records {
        writer.serialize(CsvRow {
            timestamp: record.timestamp.to_rfc3339(),
            wpm: record.wpm,
            accuracy: record.accuracy,
        })?;
    }

    writer.flush()?;
    Ok(())
}
