//! `wh search` command - Search a component type by criteria
//!
//! Rating criteria take an exact value or an inclusive range:
//! `--rating resistance=100..220`, `--rating voltage=50..`.

use miette::Result;

use crate::cli::helpers::{print_components, split_rating_arg};
use crate::cli::GlobalOpts;
use crate::store::{DatabaseController, RatingPredicate, SearchCriteria};

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    /// Component type to search
    pub component_type: String,

    /// Rating criterion as KIND=VALUE or KIND=MIN..MAX (repeatable)
    #[arg(long = "rating", short = 'r')]
    pub ratings: Vec<String>,

    /// Package code filter
    #[arg(long, short = 'p')]
    pub package: Option<String>,

    /// Manufacturer filter
    #[arg(long, short = 'm')]
    pub manufacturer: Option<String>,
}

pub fn run(args: SearchArgs, controller: &DatabaseController, global: &GlobalOpts) -> Result<()> {
    let mut criteria = SearchCriteria::new();
    for arg in &args.ratings {
        let (kind, text) = split_rating_arg(arg)?;
        criteria = criteria.with_rating(kind, RatingPredicate::parse(text, kind)?);
    }
    if let Some(package) = args.package {
        criteria = criteria.with_package_code(package);
    }
    if let Some(manufacturer) = args.manufacturer {
        criteria = criteria.with_manufacturer(manufacturer);
    }

    let criteria = (!criteria.is_empty()).then_some(criteria);
    let components = controller.search_by_type(args.component_type.trim(), criteria.as_ref())?;
    print_components(&components, global)
}
