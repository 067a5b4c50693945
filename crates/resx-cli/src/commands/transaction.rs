//! Transaction command

use crate::commands::StoreArgs;
use clap::Args;
use resx_core::{DeletePolicy, TransactionOutcome};
use resx_engine::{apply_engine_command, EngineCommand, EngineCommandResult};
use resx_store::bundle::parse_bundle_file;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct TransactionArgs {
    /// Bundle file (YAML or JSON; plain batch or FHIR-style transaction bundle)
    pub bundle: PathBuf,

    /// Classification of deletes that find nothing: strict or idempotent
    #[arg(long)]
    pub delete_policy: Option<DeletePolicy>,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub store: StoreArgs,
}

pub fn execute(args: TransactionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = args.store.open()?;
    let batch = parse_bundle_file(&args.bundle)?;
    let delete_policy = args
        .delete_policy
        .unwrap_or(session.config.transaction.delete_policy);

    let EngineCommandResult::Transaction(outcome) = apply_engine_command(
        EngineCommand::transaction(batch, delete_policy),
        &mut session.conn,
        &session.registry,
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn print_outcome(outcome: &TransactionOutcome) {
    println!("{}", outcome.report.summary);
    for (position, entry) in outcome.entries.iter().enumerate() {
        let id = entry
            .resource_id
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  [{}] {:<14} {:<6} {}",
            position,
            entry.status(),
            entry.operation.to_string(),
            id
        );
    }
}
