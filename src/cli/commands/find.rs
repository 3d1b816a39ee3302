//! `wh find` command - Part number type-ahead search

use miette::Result;

use crate::cli::helpers::print_components;
use crate::cli::GlobalOpts;
use crate::store::DatabaseController;

#[derive(clap::Args, Debug)]
pub struct FindArgs {
    /// Part number prefix (case-insensitive)
    #[arg(default_value = "")]
    pub prefix: String,

    /// Only this manufacturer's parts
    #[arg(long, short = 'm')]
    pub manufacturer: Option<String>,
}

pub fn run(args: FindArgs, controller: &DatabaseController, global: &GlobalOpts) -> Result<()> {
    let components =
        controller.incremental_search(args.prefix.trim(), args.manufacturer.as_deref())?;
    print_components(&components, global)
}
