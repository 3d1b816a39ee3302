//! `wh list` command - Enumerate catalog metadata

use clap::Subcommand;
use miette::Result;

use crate::cli::helpers::print_json;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::store::DatabaseController;

#[derive(Subcommand, Debug)]
pub enum ListCommands {
    /// Component types in the catalog
    Types,
    /// Manufacturers in the catalog
    Manufacturers,
    /// Package codes in the catalog
    Packages,
}

pub fn run(cmd: ListCommands, controller: &DatabaseController, global: &GlobalOpts) -> Result<()> {
    let values = match cmd {
        ListCommands::Types => controller.distinct_component_types()?,
        ListCommands::Manufacturers => controller.distinct_manufacturers()?,
        ListCommands::Packages => controller.distinct_package_codes()?,
    };

    match global.format {
        OutputFormat::Json => print_json(&values),
        OutputFormat::Table => {
            for value in values {
                println!("{}", value);
            }
            Ok(())
        }
    }
}
