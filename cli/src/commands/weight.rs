use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use taskman_core::models::WeightUnit;
use taskman_core::service::TaskmanService;
use taskman_core::view::WeightLog;

use super::helpers::{format_date, parse_date, parse_unit, today};

pub(crate) fn cmd_weight_add(
    svc: &TaskmanService,
    value: f64,
    unit: Option<&str>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let display_unit = svc.display_unit()?;
    let unit = match unit {
        Some(u) => parse_unit(u)?,
        None => display_unit,
    };
    let date = parse_date(date)?;
    let mut log = svc.load_weights(display_unit)?;

    let entry = svc.add_weight(&mut log, value, unit, date, today())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        if unit == WeightUnit::Lb {
            eprintln!("Converting {value} lb → {:.2} kg", entry.value_kg);
        }
        println!(
            "Logged {:.2} kg for {} (entry {})",
            entry.value_kg,
            format_date(entry.date),
            entry.id
        );
        print_weight_log(&log);
    }

    Ok(())
}

pub(crate) fn cmd_weight_list(svc: &TaskmanService, unit: Option<&str>, json: bool) -> Result<()> {
    let unit = match unit {
        Some(u) => parse_unit(u)?,
        None => svc.display_unit()?,
    };
    let log = svc.load_weights(unit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&log)?);
    } else {
        print_weight_log(&log);
    }

    Ok(())
}

pub(crate) fn cmd_weight_unit(svc: &TaskmanService, unit: Option<&str>, json: bool) -> Result<()> {
    if let Some(u) = unit {
        svc.set_display_unit(parse_unit(u)?)?;
    }
    let current = svc.display_unit()?;

    if json {
        println!("{}", serde_json::json!({ "unit": current }));
    } else if unit.is_some() {
        println!("Display unit set to {current}");
    } else {
        println!("Display unit: {current}");
    }

    Ok(())
}

fn print_weight_log(log: &WeightLog) {
    if log.entries().is_empty() {
        eprintln!("No weight entries found. Use `taskman weight add` to record your weight.");
        return;
    }

    #[derive(Tabled)]
    struct WeightRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Weight")]
        weight: String,
        #[tabled(rename = "Date")]
        date: String,
    }

    let rows: Vec<WeightRow> = log
        .entries()
        .iter()
        .map(|w| WeightRow {
            id: w.id,
            weight: format!("{:.2} {}", w.value, w.unit),
            date: format_date(w.date),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(1)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    println!("Weight changes: {}", log.delta_label());
}
