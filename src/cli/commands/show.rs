//! `wh show` command - Show a component's details

use console::style;
use miette::Result;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{print_json, resolve_component};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::RatingKind;
use crate::store::DatabaseController;

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Part number
    pub part_number: String,

    /// Manufacturer (required when several make the same part number)
    #[arg(long, short = 'm')]
    pub manufacturer: Option<String>,
}

pub fn run(args: ShowArgs, controller: &DatabaseController, global: &GlobalOpts) -> Result<()> {
    let cmp = resolve_component(controller, &args.part_number, args.manufacturer.as_deref())?;

    if global.format == OutputFormat::Json {
        return print_json(&cmp.to_record());
    }

    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{}: {} ({})",
        style("Part").bold(),
        style(&cmp.part_number).yellow(),
        cmp.manufacturer
    );
    println!("{}: {}", style("ID").bold(), style(cmp.id).cyan());
    println!("{}: {}", style("Type").bold(), cmp.component_type);
    if let Some(ref package) = cmp.package_code {
        println!("{}: {}", style("Package").bold(), package);
    }
    println!(
        "{}: {}",
        style("Stock").bold(),
        style(cmp.stocked_quantity).green()
    );
    println!("{}", style("─".repeat(60)).dim());

    if !cmp.ratings.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Rating", "Value", "Unit"]);
        for kind in RatingKind::all() {
            if let Some(value) = cmp.rating(*kind) {
                builder.push_record([
                    kind.name().to_string(),
                    value.to_prefixed_string(),
                    kind.unit_name().to_string(),
                ]);
            }
        }
        println!("{}", builder.build().with(Style::markdown()));
    }

    if let Some(ref comments) = cmp.comments {
        println!();
        println!("{}", comments);
    }
    Ok(())
}
