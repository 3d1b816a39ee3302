//! `wh register` command - Catalog a new component

use console::style;
use miette::Result;

use crate::cli::helpers::{print_json, split_rating_arg};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::EngineeringValue;
use crate::entities::NewComponent;
use crate::store::DatabaseController;

#[derive(clap::Args, Debug)]
pub struct RegisterArgs {
    /// Component type (e.g. Resistor, Capacitor)
    pub component_type: String,

    /// Manufacturer part number
    pub part_number: String,

    /// Manufacturer name
    pub manufacturer: String,

    /// Package code (e.g. 0805, SOT-23)
    #[arg(long, short = 'p')]
    pub package: Option<String>,

    /// Rating as KIND=VALUE, e.g. resistance=4.7k or voltage=50V (repeatable)
    #[arg(long = "rating", short = 'r')]
    pub ratings: Vec<String>,

    /// Free-text comments
    #[arg(long, short = 'c')]
    pub comments: Option<String>,
}

pub fn run(args: RegisterArgs, controller: &DatabaseController, global: &GlobalOpts) -> Result<()> {
    let mut component = NewComponent::new(
        args.component_type.trim(),
        args.part_number.trim(),
        args.manufacturer.trim(),
    );
    if let Some(package) = args.package.filter(|p| !p.trim().is_empty()) {
        component = component.with_package_code(package.trim());
    }
    if let Some(comments) = args.comments.filter(|c| !c.trim().is_empty()) {
        component = component.with_comments(comments.trim());
    }
    for arg in &args.ratings {
        let (kind, value) = split_rating_arg(arg)?;
        component = component.with_rating(EngineeringValue::from_input(value, kind)?);
    }

    let id = controller.register(&component)?;

    match global.format {
        OutputFormat::Json => print_json(&controller.component(id)?.to_record()),
        OutputFormat::Table => {
            println!(
                "{} Registered component {}",
                style("✓").green(),
                style(id).cyan()
            );
            println!(
                "   Part: {} | {}",
                style(&component.part_number).yellow(),
                style(&component.manufacturer).white()
            );
            Ok(())
        }
    }
}
