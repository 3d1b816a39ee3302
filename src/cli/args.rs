//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    find::FindArgs,
    history::HistoryArgs,
    list::ListCommands,
    register::RegisterArgs,
    search::SearchArgs,
    show::ShowArgs,
    stock::StockArgs,
};

#[derive(Parser)]
#[command(name = "wh")]
#[command(author, version, about = "Warehouse inventory for electronic components")]
#[command(long_about = "Catalog electronic components, record stock movements and query balances in a local SQLite store.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Database file (overrides config and WAREHOUSE_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a new component in the catalog
    Register(RegisterArgs),

    /// Search components of a type by rating, package and manufacturer
    Search(SearchArgs),

    /// Type-ahead search by part number prefix
    Find(FindArgs),

    /// Show a component with its ratings and balance
    Show(ShowArgs),

    /// Record a replenishment (stock in)
    In(StockArgs),

    /// Record a withdrawal (stock out)
    Out(StockArgs),

    /// Movement history of a component
    History(HistoryArgs),

    /// List known component types, manufacturers or package codes
    #[command(subcommand)]
    List(ListCommands),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Table,
    /// JSON records (for programming)
    Json,
}
