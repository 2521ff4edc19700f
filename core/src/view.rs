//! Rendered list state for the two record kinds.
//!
//! Both views are rebuilt wholesale from a fresh read on every mutation or
//! date/unit change. Nothing is diffed or patched in place.

use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeDelta};
use serde::Serialize;

use crate::db::Database;
use crate::models::{
    DisplayWeight, Task, WeightDelta, WeightUnit, compute_delta, delta_label, from_kg,
};

/// Tasks for the currently displayed day.
#[derive(Debug, Clone, Serialize)]
pub struct TaskBoard {
    date: NaiveDate,
    tasks: Vec<Task>,
}

impl TaskBoard {
    pub fn load(db: &Database, date: NaiveDate) -> Result<Self> {
        let tasks = db.get_tasks_for_date(date)?;
        Ok(Self { date, tasks })
    }

    pub fn reload(&mut self, db: &Database) -> Result<()> {
        *self = Self::load(db, self.date)?;
        Ok(())
    }

    /// Switch the displayed day and reload.
    pub fn show_date(&mut self, db: &Database, date: NaiveDate) -> Result<()> {
        *self = Self::load(db, date)?;
        Ok(())
    }

    /// Step the displayed day backwards or forwards by `days`.
    pub fn shift_days(&mut self, db: &Database, days: i64) -> Result<()> {
        let date = TimeDelta::try_days(days)
            .and_then(|d| self.date.checked_add_signed(d))
            .context("Date out of range")?;
        self.show_date(db, date)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// All weight entries converted to a display unit, plus the latest change.
#[derive(Debug, Clone, Serialize)]
pub struct WeightLog {
    unit: WeightUnit,
    entries: Vec<DisplayWeight>,
    delta: Option<WeightDelta>,
    delta_label: String,
}

impl WeightLog {
    pub fn load(db: &Database, unit: WeightUnit) -> Result<Self> {
        let rows = db.get_weights()?;
        let delta = compute_delta(&rows, unit);
        let entries = rows
            .iter()
            .map(|w| DisplayWeight {
                id: w.id,
                value: from_kg(w.value_kg, unit),
                unit,
                date: w.date,
            })
            .collect();
        Ok(Self {
            unit,
            entries,
            delta,
            delta_label: delta_label(delta),
        })
    }

    pub fn reload(&mut self, db: &Database) -> Result<()> {
        *self = Self::load(db, self.unit)?;
        Ok(())
    }

    pub fn set_unit(&mut self, db: &Database, unit: WeightUnit) -> Result<()> {
        *self = Self::load(db, unit)?;
        Ok(())
    }

    pub fn unit(&self) -> WeightUnit {
        self.unit
    }

    pub fn entries(&self) -> &[DisplayWeight] {
        &self.entries
    }

    pub fn delta(&self) -> Option<WeightDelta> {
        self.delta
    }

    pub fn delta_label(&self) -> &str {
        &self.delta_label
    }
}
