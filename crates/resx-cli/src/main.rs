//! resx CLI
//!
//! Command-line interface for processing transaction bundles and reading
//! the store's history, tags and counts

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "resx")]
#[command(about = "resx - transactional resource-bundle processor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Process a bundle file as one all-or-nothing transaction
    Transaction(commands::transaction::TransactionArgs),
    /// List stored versions, newest first
    History(commands::history::HistoryArgs),
    /// List every tag ever applied
    Tags(commands::system::TagsArgs),
    /// Count live resources per type
    Counts(commands::system::CountsArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Transaction(args) => commands::transaction::execute(args),
        Commands::History(args) => commands::history::execute(args),
        Commands::Tags(args) => commands::system::execute_tags(args),
        Commands::Counts(args) => commands::system::execute_counts(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
