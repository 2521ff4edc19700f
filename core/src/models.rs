use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const KG_PER_LB: f64 = 0.453_592_37;
pub const MAX_TASK_TITLE_LEN: usize = 70;
pub const MIN_WEIGHT: f64 = 5.0;
pub const MAX_WEIGHT: f64 = 999.999;

/// Unit label persisted in the `weight_unit` column. Storage is always kilograms.
pub const STORAGE_UNIT: &str = "KG";

// --- Tasks ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Per-day number, unique only among tasks sharing `date`.
    pub id: i64,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub date: NaiveDate,
}

// --- Weights ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub id: i64,
    pub value_kg: f64,
    pub unit: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewWeightEntry {
    pub value_kg: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeightUnit {
    #[default]
    #[serde(rename = "KG")]
    Kg,
    #[serde(rename = "lb")]
    Lb,
}

impl WeightUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            WeightUnit::Kg => "KG",
            WeightUnit::Lb => "lb",
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeightUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "kg" | "kgs" => Ok(WeightUnit::Kg),
            "lb" | "lbs" => Ok(WeightUnit::Lb),
            _ => bail!("Invalid unit '{s}'. Use 'kg' or 'lb'"),
        }
    }
}

/// A weight row converted to a display unit. Storage is never touched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayWeight {
    pub id: i64,
    pub value: f64,
    pub unit: WeightUnit,
    pub date: NaiveDate,
}

/// Change between the two most recent weight entries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "direction", content = "amount", rename_all = "snake_case")]
pub enum WeightDelta {
    Lost(f64),
    Gained(f64),
    NoProgress,
}

impl fmt::Display for WeightDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightDelta::Lost(x) => write!(f, "-{x}"),
            WeightDelta::Gained(x) => write!(f, "+{x}"),
            WeightDelta::NoProgress => f.write_str("No progress"),
        }
    }
}

/// Label for an optional delta; fewer than two entries reads as no progress.
pub fn delta_label(delta: Option<WeightDelta>) -> String {
    delta.unwrap_or(WeightDelta::NoProgress).to_string()
}

// --- Export types ---

pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
    pub version: u32,
    pub exported_at: String,
    pub tasks: Vec<Task>,
    pub weights: Vec<WeightEntry>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub tasks_imported: i64,
    pub weights_imported: i64,
}

// --- Conversion ---

pub fn round2(v: f64) -> f64 {
    let r = (v * 100.0).round() / 100.0;
    if r == 0.0 { 0.0 } else { r }
}

pub fn to_kg(value: f64, unit: WeightUnit) -> f64 {
    match unit {
        WeightUnit::Kg => value,
        WeightUnit::Lb => round2(value * KG_PER_LB),
    }
}

pub fn from_kg(kg: f64, unit: WeightUnit) -> f64 {
    match unit {
        WeightUnit::Kg => kg,
        WeightUnit::Lb => round2(kg / KG_PER_LB),
    }
}

/// Delta between the last two entries (in insertion order), in `unit`.
///
/// Positive `older - newer` is a loss, negative a gain. Returns `None` when
/// there are fewer than two entries.
pub fn compute_delta(rows: &[WeightEntry], unit: WeightUnit) -> Option<WeightDelta> {
    let [.., older, newer] = rows else {
        return None;
    };
    let difference = round2(from_kg(older.value_kg, unit) - from_kg(newer.value_kg, unit));
    Some(if difference > 0.0 {
        WeightDelta::Lost(difference)
    } else if difference < 0.0 {
        WeightDelta::Gained(difference.abs())
    } else {
        WeightDelta::NoProgress
    })
}

// --- Validation ---

/// Validate a task title: non-empty after trimming, at most 70 characters.
pub fn validate_task_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        bail!("Task title cannot be empty");
    }
    let len = title.chars().count();
    if len > MAX_TASK_TITLE_LEN {
        bail!("Task title is {len} characters; the limit is {MAX_TASK_TITLE_LEN}");
    }
    Ok(title.to_string())
}

pub fn validate_task_date(date: NaiveDate, today: NaiveDate) -> Result<()> {
    if date < today {
        bail!(
            "Cannot add a task for {} (before today, {})",
            date.format("%Y-%m-%d"),
            today.format("%Y-%m-%d")
        );
    }
    Ok(())
}

/// Validate a weight in its input unit against the accepted range.
pub fn validate_weight_value(value: f64) -> Result<()> {
    if !value.is_finite() {
        bail!("Weight must be a number");
    }
    if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&value) {
        bail!("Weight must be between {MIN_WEIGHT} and {MAX_WEIGHT}");
    }
    Ok(())
}

pub fn validate_weight_date(date: NaiveDate, today: NaiveDate) -> Result<()> {
    if date > today {
        bail!(
            "Cannot log a weight for {} (after today, {})",
            date.format("%Y-%m-%d"),
            today.format("%Y-%m-%d")
        );
    }
    Ok(())
}

/// Validate an imported weight entry: stored kilograms in range, unit is KG.
/// Stored values are kilograms, so the lower bound is the smallest accepted
/// input in either unit (5 lb).
pub fn validate_export_weight_entry(entry: &WeightEntry) -> Result<()> {
    let min_kg = to_kg(MIN_WEIGHT, WeightUnit::Lb);
    if !entry.value_kg.is_finite() || !(min_kg..=MAX_WEIGHT).contains(&entry.value_kg) {
        bail!(
            "Weight entry {} has {} kg; must be between {min_kg} and {MAX_WEIGHT}",
            entry.id,
            entry.value_kg
        );
    }
    if !entry.unit.eq_ignore_ascii_case(STORAGE_UNIT) {
        bail!(
            "Weight entry {} has unit '{}'; only '{STORAGE_UNIT}' is stored",
            entry.id,
            entry.unit
        );
    }
    Ok(())
}
