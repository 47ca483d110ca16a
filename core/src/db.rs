use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use crate::models::{Goal, MealEntry, NewMealEntry, NewWeightEntry, WeightEntry, WeightSource};
use crate::store::TrackerStore;

/// SQLite-backed [`TrackerStore`].
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS weight_entries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    weight_lbs REAL NOT NULL CHECK (weight_lbs > 0),
                    recorded_at TEXT NOT NULL,
                    source TEXT NOT NULL DEFAULT 'manual',
                    notes TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS meal_entries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    photo_url TEXT NOT NULL,
                    estimated_calories INTEGER NOT NULL CHECK (estimated_calories >= 0),
                    eaten_at TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_weight_entries_recorded_at ON weight_entries(recorded_at);
                CREATE INDEX IF NOT EXISTS idx_meal_entries_eaten_at ON meal_entries(eaten_at);

                CREATE TABLE IF NOT EXISTS goal (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    target_weight_lbs REAL NOT NULL,
                    target_date TEXT,
                    created_date TEXT NOT NULL
                );

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn weight_entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<WeightEntry> {
        let recorded_at: String = row.get(2)?;
        let source: String = row.get(3)?;
        Ok(WeightEntry {
            id: row.get(0)?,
            weight_lbs: row.get(1)?,
            date: parse_timestamp(2, &recorded_at)?,
            source: if source == "import" {
                WeightSource::Import
            } else {
                WeightSource::Manual
            },
            notes: row.get(4)?,
        })
    }

    fn meal_entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<MealEntry> {
        let eaten_at: String = row.get(3)?;
        Ok(MealEntry {
            id: row.get(0)?,
            photo_url: row.get(1)?,
            estimated_calories: row.get(2)?,
            date: parse_timestamp(3, &eaten_at)?,
        })
    }

    fn goal_from_row(row: &rusqlite::Row) -> rusqlite::Result<Goal> {
        let target_date: Option<String> = row.get(1)?;
        let created_date: String = row.get(2)?;
        Ok(Goal {
            target_weight_lbs: row.get(0)?,
            target_date: target_date
                .as_deref()
                .map(|s| parse_timestamp(1, s))
                .transpose()?,
            created_date: parse_timestamp(2, &created_date)?,
        })
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

impl TrackerStore for Database {
    // --- Weight Entries ---

    fn insert_weight(&self, entry: &NewWeightEntry) -> Result<WeightEntry> {
        let now = format_timestamp(&Utc::now());
        self.conn.execute(
            "INSERT INTO weight_entries (weight_lbs, recorded_at, source, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.weight_lbs,
                format_timestamp(&entry.date),
                entry.source.as_str(),
                entry.notes,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(id, weight = entry.weight_lbs, "weight entry stored");
        self.get_weight(id)?
            .context("Weight entry not found after insert")
    }

    fn get_weight(&self, id: i64) -> Result<Option<WeightEntry>> {
        self.conn
            .query_row(
                "SELECT id, weight_lbs, recorded_at, source, notes
                 FROM weight_entries WHERE id = ?1",
                params![id],
                Self::weight_entry_from_row,
            )
            .optional()
            .context("Failed to read weight entry")
    }

    fn weight_history(&self) -> Result<Vec<WeightEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, weight_lbs, recorded_at, source, notes
             FROM weight_entries ORDER BY recorded_at ASC, id ASC",
        )?;
        let entries = stmt
            .query_map([], Self::weight_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn delete_weight(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM weight_entries WHERE id = ?1", params![id])?;
        if rows > 0 {
            info!(id, "weight entry deleted");
        }
        Ok(rows > 0)
    }

    // --- Meal Entries ---

    fn insert_meal(&self, entry: &NewMealEntry) -> Result<MealEntry> {
        let now = format_timestamp(&Utc::now());
        self.conn.execute(
            "INSERT INTO meal_entries (photo_url, estimated_calories, eaten_at, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.photo_url,
                entry.estimated_calories,
                format_timestamp(&entry.date),
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(id, calories = entry.estimated_calories, "meal entry stored");
        self.get_meal(id)?
            .context("Meal entry not found after insert")
    }

    fn get_meal(&self, id: i64) -> Result<Option<MealEntry>> {
        self.conn
            .query_row(
                "SELECT id, photo_url, estimated_calories, eaten_at
                 FROM meal_entries WHERE id = ?1",
                params![id],
                Self::meal_entry_from_row,
            )
            .optional()
            .context("Failed to read meal entry")
    }

    fn meals(&self) -> Result<Vec<MealEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, photo_url, estimated_calories, eaten_at
             FROM meal_entries ORDER BY eaten_at DESC, id DESC",
        )?;
        let meals = stmt
            .query_map([], Self::meal_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meals)
    }

    fn delete_meal(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM meal_entries WHERE id = ?1", params![id])?;
        if rows > 0 {
            info!(id, "meal entry deleted");
        }
        Ok(rows > 0)
    }

    // --- Goal ---

    fn goal(&self) -> Result<Option<Goal>> {
        self.conn
            .query_row(
                "SELECT target_weight_lbs, target_date, created_date FROM goal WHERE id = 1",
                [],
                Self::goal_from_row,
            )
            .optional()
            .context("Failed to read goal")
    }

    fn set_goal(&self, goal: &Goal) -> Result<Goal> {
        self.conn.execute(
            "INSERT INTO goal (id, target_weight_lbs, target_date, created_date)
             VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                target_weight_lbs = excluded.target_weight_lbs,
                target_date = excluded.target_date,
                created_date = excluded.created_date",
            params![
                goal.target_weight_lbs,
                goal.target_date.as_ref().map(format_timestamp),
                format_timestamp(&goal.created_date),
            ],
        )?;
        info!(target = goal.target_weight_lbs, "goal set");
        self.goal()?.context("Goal not found after upsert")
    }

    fn clear_goal(&self) -> Result<bool> {
        let rows = self.conn.execute("DELETE FROM goal WHERE id = 1", [])?;
        Ok(rows > 0)
    }
}
