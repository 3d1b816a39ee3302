//! `wh in` / `wh out` commands - Record stock movements

use console::style;
use miette::Result;

use crate::cli::helpers::{movement_date, print_json, resolve_component};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::dates::encode_date;
use crate::entities::MovementKind;
use crate::store::DatabaseController;

#[derive(clap::Args, Debug)]
pub struct StockArgs {
    /// Part number
    pub part_number: String,

    /// Number of units moved
    #[arg(allow_negative_numbers = true)]
    pub quantity: i64,

    /// Manufacturer (required when several make the same part number)
    #[arg(long, short = 'm')]
    pub manufacturer: Option<String>,

    /// Movement date as YYYY-MM-DD (default: today)
    #[arg(long, short = 'd')]
    pub date: Option<String>,

    /// Free-text note (order number, build, ...)
    #[arg(long, short = 'n')]
    pub note: Option<String>,
}

pub fn run(
    args: StockArgs,
    kind: MovementKind,
    controller: &DatabaseController,
    global: &GlobalOpts,
) -> Result<()> {
    let cmp = resolve_component(controller, &args.part_number, args.manufacturer.as_deref())?;
    let date = movement_date(controller, args.date.as_deref())?;
    let note = args.note.as_deref();

    let movement_id = match kind {
        MovementKind::Replenishment => {
            controller.record_replenishment(cmp.id, args.quantity, date, note)?
        }
        MovementKind::Withdrawal => controller.record_withdrawal(cmp.id, args.quantity, date, note)?,
    };
    let balance = controller.current_balance(cmp.id)?;

    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "movement_id": movement_id,
            "component_id": cmp.id,
            "kind": kind,
            "quantity": args.quantity,
            "movement_date": encode_date(&date),
            "stock": balance,
        })),
        OutputFormat::Table => {
            println!(
                "{} Recorded {} of {} x {} ({}) on {}",
                style("✓").green(),
                kind,
                style(args.quantity).cyan(),
                style(&cmp.part_number).yellow(),
                cmp.manufacturer,
                encode_date(&date)
            );
            println!("   Stock: {}", style(balance).green());
            Ok(())
        }
    }
}
