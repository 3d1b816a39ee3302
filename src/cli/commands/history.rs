//! `wh history` command - Movement history of a component

use clap::ValueEnum;
use console::style;
use miette::Result;

use crate::cli::helpers::{movements_table, print_json, resolve_component};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::StockMovement;
use crate::store::DatabaseController;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum KindFilter {
    #[default]
    All,
    /// Replenishments only
    In,
    /// Withdrawals only
    Out,
}

#[derive(clap::Args, Debug)]
pub struct HistoryArgs {
    /// Part number
    pub part_number: String,

    /// Manufacturer (required when several make the same part number)
    #[arg(long, short = 'm')]
    pub manufacturer: Option<String>,

    /// Movement direction
    #[arg(long, short = 'k', default_value = "all")]
    pub kind: KindFilter,
}

pub fn run(args: HistoryArgs, controller: &DatabaseController, global: &GlobalOpts) -> Result<()> {
    let cmp = resolve_component(controller, &args.part_number, args.manufacturer.as_deref())?;
    let movements = match args.kind {
        KindFilter::All => controller.movements_for(cmp.id)?,
        KindFilter::In => controller.replenishments_for(cmp.id)?,
        KindFilter::Out => controller.withdrawals_for(cmp.id)?,
    };

    match global.format {
        OutputFormat::Json => {
            let records: Vec<_> = movements.iter().map(StockMovement::to_record).collect();
            print_json(&records)
        }
        OutputFormat::Table => {
            if movements.is_empty() {
                println!("{}", style("No movements recorded.").dim());
            } else {
                println!("{}", movements_table(&movements));
            }
            println!(
                "\n{} ({}): stock {}",
                style(&cmp.part_number).yellow(),
                cmp.manufacturer,
                style(cmp.stocked_quantity).green()
            );
            Ok(())
        }
    }
}
