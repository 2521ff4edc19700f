use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};

/// A day given either as a date or as an offset from today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DayRef {
    Date(NaiveDate),
    Offset(i64),
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a date: YYYY-MM-DD, DD.MM.YYYY, or today/yesterday/tomorrow. `None` is today.
pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(today()),
        Some(s) => match s.as_str() {
            "today" => Ok(today()),
            "yesterday" => Ok(today() - chrono::Duration::days(1)),
            "tomorrow" => Ok(today() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(&s, "%d.%m.%Y"))
                .with_context(|| {
                    format!(
                        "Invalid date '{s}'. Use YYYY-MM-DD, DD.MM.YYYY or today/yesterday/tomorrow"
                    )
                }),
        },
    }
}

/// Like [`parse_date`], but also accepts `+N` / `-N` day offsets.
pub(crate) fn parse_day_ref(s: Option<String>) -> Result<DayRef> {
    if let Some(ref raw) = s {
        if raw.starts_with(['+', '-']) {
            let days: i64 = raw
                .parse()
                .with_context(|| format!("Invalid day offset '{raw}'. Use e.g. +1 or -3"))?;
            return Ok(DayRef::Offset(days));
        }
    }
    parse_date(s).map(DayRef::Date)
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_unit(unit: &str) -> Result<taskman_core::models::WeightUnit> {
    let trimmed = unit.trim();
    if trimmed.is_empty() {
        bail!("Unit cannot be empty. Use 'kg' or 'lb'");
    }
    trimmed.parse()
}
