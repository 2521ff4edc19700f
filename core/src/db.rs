use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};

use crate::models::{
    EXPORT_VERSION, ExportData, ImportSummary, NewTask, NewWeightEntry, STORAGE_UNIT, Task,
    WeightEntry, validate_export_weight_entry, validate_task_title,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        log::debug!("opened database at {}", path.display());
        let mut db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            log::info!("migrating database schema to version 1");
            self.conn
                .execute_batch(
                    "CREATE TABLE IF NOT EXISTS tasks (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    task_ID INTEGER NOT NULL,
                    task_title TEXT NOT NULL,
                    task_date TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    UNIQUE (task_date, task_ID)
                );

                CREATE TABLE IF NOT EXISTS weights (
                    weight_ID INTEGER PRIMARY KEY AUTOINCREMENT,
                    weight_value REAL NOT NULL,
                    weight_unit TEXT NOT NULL DEFAULT 'KG',
                    weight_date TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS settings (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_tasks_date ON tasks(task_date);

                PRAGMA user_version = 1;",
                )
                .context("Failed to apply schema migration 1")?;
        }

        Ok(())
    }

    fn date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
        let s: String = row.get(idx)?;
        NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
        })
    }

    // --- Tasks ---

    fn task_from_row(row: &rusqlite::Row) -> rusqlite::Result<Task> {
        Ok(Task {
            id: row.get(0)?,
            title: row.get(1)?,
            date: Self::date_column(row, 2)?,
            created_at: row.get(3)?,
        })
    }

    /// Insert a task with the next per-day number for its date.
    ///
    /// The max lookup and the insert share one immediate transaction, and
    /// `UNIQUE(task_date, task_ID)` rejects any collision that slips through.
    pub fn insert_task(&mut self, task: &NewTask) -> Result<Task> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let inserted = Self::insert_task_on(&tx, task)?;
        tx.commit()?;
        Ok(inserted)
    }

    fn insert_task_on(conn: &Connection, task: &NewTask) -> Result<Task> {
        let now = Local::now().to_rfc3339();
        let date_str = task.date.format(DATE_FORMAT).to_string();

        let next_id: i64 = conn.query_row(
            "SELECT COALESCE(MAX(task_ID), 0) + 1 FROM tasks WHERE task_date = ?1",
            params![date_str],
            |row| row.get(0),
        )?;
        conn.execute(
            "INSERT INTO tasks (task_ID, task_title, task_date, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![next_id, task.title, date_str, now],
        )?;

        log::debug!("inserted task {next_id} for {date_str}");
        Ok(Task {
            id: next_id,
            title: task.title.clone(),
            date: task.date,
            created_at: now,
        })
    }

    pub fn get_tasks_for_date(&self, date: NaiveDate) -> Result<Vec<Task>> {
        let date_str = date.format(DATE_FORMAT).to_string();
        let mut stmt = self.conn.prepare(
            "SELECT task_ID, task_title, task_date, created_at
             FROM tasks WHERE task_date = ?1 ORDER BY id",
        )?;
        let tasks = stmt
            .query_map(params![date_str], Self::task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    pub fn get_all_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT task_ID, task_title, task_date, created_at
             FROM tasks ORDER BY task_date, id",
        )?;
        let tasks = stmt
            .query_map([], Self::task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Delete the task numbered `id` on `date`. Returns whether a row was removed.
    pub fn delete_task(&self, id: i64, date: NaiveDate) -> Result<bool> {
        let date_str = date.format(DATE_FORMAT).to_string();
        let rows = self.conn.execute(
            "DELETE FROM tasks WHERE task_ID = ?1 AND task_date = ?2",
            params![id, date_str],
        )?;
        if rows > 0 {
            log::debug!("deleted task {id} for {date_str}");
        }
        Ok(rows > 0)
    }

    pub fn count_tasks(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
        Ok(count)
    }

    // --- Weights ---

    fn weight_entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<WeightEntry> {
        Ok(WeightEntry {
            id: row.get(0)?,
            value_kg: row.get(1)?,
            unit: row.get(2)?,
            date: Self::date_column(row, 3)?,
            created_at: row.get(4)?,
        })
    }

    /// Insert a weight already expressed in kilograms.
    pub fn insert_weight(&self, entry: &NewWeightEntry) -> Result<WeightEntry> {
        let id = Self::insert_weight_on(&self.conn, entry)?;
        self.get_weight(id)?
            .context("Weight entry not found after insert")
    }

    fn insert_weight_on(conn: &Connection, entry: &NewWeightEntry) -> Result<i64> {
        let now = Local::now().to_rfc3339();
        let date_str = entry.date.format(DATE_FORMAT).to_string();
        conn.execute(
            "INSERT INTO weights (weight_value, weight_unit, weight_date, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![entry.value_kg, STORAGE_UNIT, date_str, now],
        )?;
        let id = conn.last_insert_rowid();
        log::debug!("inserted weight {id} ({} kg) for {date_str}", entry.value_kg);
        Ok(id)
    }

    pub fn get_weight(&self, id: i64) -> Result<Option<WeightEntry>> {
        let entry = self
            .conn
            .query_row(
                "SELECT weight_ID, weight_value, weight_unit, weight_date, created_at
                 FROM weights WHERE weight_ID = ?1",
                params![id],
                Self::weight_entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// All weight entries in insertion order.
    pub fn get_weights(&self) -> Result<Vec<WeightEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT weight_ID, weight_value, weight_unit, weight_date, created_at
             FROM weights ORDER BY weight_ID",
        )?;
        let entries = stmt
            .query_map([], Self::weight_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // --- Settings ---

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO settings (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }

    // --- Export / Import ---

    pub fn export_all(&self) -> Result<ExportData> {
        Ok(ExportData {
            version: EXPORT_VERSION,
            exported_at: Local::now().to_rfc3339(),
            tasks: self.get_all_tasks()?,
            weights: self.get_weights()?,
        })
    }

    /// Append exported rows in a single transaction. Tasks get fresh per-day
    /// numbers and weights fresh ids; exported identifiers are not preserved.
    pub fn import_all(&mut self, data: &ExportData) -> Result<ImportSummary> {
        if data.version != EXPORT_VERSION {
            anyhow::bail!(
                "Unsupported export version {} (expected {EXPORT_VERSION})",
                data.version
            );
        }
        for task in &data.tasks {
            validate_task_title(&task.title)
                .with_context(|| format!("Invalid task {} on {}", task.id, task.date))?;
        }
        for entry in &data.weights {
            validate_export_weight_entry(entry)?;
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut summary = ImportSummary::default();
        for task in &data.tasks {
            Self::insert_task_on(
                &tx,
                &NewTask {
                    title: task.title.trim().to_string(),
                    date: task.date,
                },
            )?;
            summary.tasks_imported += 1;
        }
        for entry in &data.weights {
            Self::insert_weight_on(
                &tx,
                &NewWeightEntry {
                    value_kg: entry.value_kg,
                    date: entry.date,
                },
            )?;
            summary.weights_imported += 1;
        }
        tx.commit().context("Failed to commit import")?;
        log::info!(
            "imported {} tasks and {} weights",
            summary.tasks_imported,
            summary.weights_imported
        );
        Ok(summary)
    }
}
