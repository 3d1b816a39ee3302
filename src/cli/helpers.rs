//! Shared helper functions for CLI commands
//!
//! Opening the store, resolving a component from its identity, parsing
//! rating arguments and rendering records.

use chrono::NaiveDate;
use console::style;
use miette::{miette, IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::GlobalOpts;
use crate::core::dates;
use crate::core::{Config, RatingKind};
use crate::entities::{ComponentRecord, StockMovement};
use crate::store::DatabaseController;

/// Open the configured store; `--db` wins over every config layer.
///
/// The default database lives in the user data directory, which is
/// created on first use.
pub fn open_controller(global: &GlobalOpts, config: &Config) -> Result<DatabaseController> {
    let path = match global.db {
        Some(ref db) => db.clone(),
        None => {
            let path = config.database_path();
            if config.database.is_none() {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).into_diagnostic()?;
                }
            }
            path
        }
    };

    let controller = DatabaseController::new();
    controller.open(&path)?;
    Ok(controller)
}

/// The single component matching `part_number`, optionally narrowed by
/// manufacturer
pub fn resolve_component(
    controller: &DatabaseController,
    part_number: &str,
    manufacturer: Option<&str>,
) -> Result<ComponentRecord> {
    let mut found = controller.lookup(part_number, manufacturer)?;
    if found.len() > 1 {
        let makers: Vec<_> = found.iter().map(|c| c.manufacturer.as_str()).collect();
        return Err(miette!(
            code = "warehouse::ambiguous_part",
            help = "pass --manufacturer to pick one",
            "part number '{}' is made by several manufacturers: {}",
            part_number,
            makers.join(", ")
        ));
    }
    Ok(found.remove(0))
}

/// Split a `kind=value` argument, e.g. `resistance=4.7k`
pub fn split_rating_arg(arg: &str) -> Result<(RatingKind, &str)> {
    let (kind, value) = arg.split_once('=').ok_or_else(|| {
        miette!(
            help = format!("rating kinds: {}", RatingKind::names().join(", ")),
            "expected KIND=VALUE, got '{}'",
            arg
        )
    })?;
    let kind: RatingKind = kind.trim().parse().map_err(|e: String| miette!("{}", e))?;
    Ok((kind, value.trim()))
}

/// Movement date from `--date`, or today when omitted
pub fn movement_date(controller: &DatabaseController, date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(text) => Ok(controller.decode_date(text)?),
        None => Ok(dates::today()),
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{}", json);
    Ok(())
}

/// Ratings joined for a table cell, e.g. `4.7kΩ 1%`
pub fn ratings_summary(component: &ComponentRecord) -> String {
    component
        .ratings
        .values()
        .map(|v| v.to_prefixed_string())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn components_table(components: &[ComponentRecord]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["ID", "PART #", "MANUFACTURER", "TYPE", "PACKAGE", "RATINGS", "STOCK"]);
    for cmp in components {
        builder.push_record([
            cmp.id.to_string(),
            cmp.part_number.clone(),
            cmp.manufacturer.clone(),
            cmp.component_type.clone(),
            cmp.package_code.clone().unwrap_or_default(),
            ratings_summary(cmp),
            cmp.stocked_quantity.to_string(),
        ]);
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn movements_table(movements: &[StockMovement]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["#", "DATE", "KIND", "UNITS", "NOTE"]);
    for m in movements {
        builder.push_record([
            m.id.to_string(),
            dates::encode_date(&m.date),
            m.kind().to_string(),
            m.units().to_string(),
            truncate_str(m.note.as_deref().unwrap_or(""), 40),
        ]);
    }
    builder.build().with(Style::markdown()).to_string()
}

/// Print components as a table with a count line, or as JSON records
pub fn print_components(components: &[ComponentRecord], global: &GlobalOpts) -> Result<()> {
    match global.format {
        crate::cli::OutputFormat::Json => {
            let records: Vec<_> = components.iter().map(ComponentRecord::to_record).collect();
            print_json(&records)
        }
        crate::cli::OutputFormat::Table => {
            if components.is_empty() {
                println!("{}", style("No components found.").dim());
                return Ok(());
            }
            println!("{}", components_table(components));
            println!(
                "\n{} component(s) found",
                style(components.len()).cyan()
            );
            Ok(())
        }
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
