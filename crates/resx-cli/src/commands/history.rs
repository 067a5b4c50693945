//! History command

use crate::commands::StoreArgs;
use chrono::{DateTime, Utc};
use clap::Args;
use resx_core::PersistedEntity;
use resx_engine::commands::history::history_walk;
use resx_engine::{apply_engine_query, EngineQuery, EngineQueryResult};

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Only versions written at or after this RFC 3339 instant
    #[arg(long, value_parser = parse_instant)]
    pub since: Option<DateTime<Utc>>,

    /// Versions to skip
    #[arg(long, default_value_t = 0, conflicts_with = "all")]
    pub offset: usize,

    /// Versions per page (defaults to the configured history page size)
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Walk the whole window page by page
    #[arg(long)]
    pub all: bool,

    /// Print versions as JSON lines
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub store: StoreArgs,
}

pub fn execute(args: HistoryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let session = args.store.open()?;
    let page_size = args.page_size.unwrap_or(session.config.history.page_size);

    if args.all {
        let visited = history_walk(args.since, page_size, &session.conn, |page| {
            for entity in page {
                print_entity(entity, args.json);
            }
            Ok(())
        })?;
        if !args.json {
            println!("{} versions", visited);
        }
        return Ok(());
    }

    let EngineQueryResult::History(page) = apply_engine_query(
        EngineQuery::History {
            since: args.since,
            offset: args.offset,
            count: page_size,
        },
        &session.conn,
    )?
    else {
        return Err("history query returned an unexpected result".into());
    };

    for entity in &page.entries {
        print_entity(entity, args.json);
    }
    if !args.json {
        println!(
            "{}-{} of {} versions",
            page.offset + usize::from(!page.entries.is_empty()),
            page.offset + page.entries.len(),
            page.total
        );
    }
    Ok(())
}

fn print_entity(entity: &PersistedEntity, json: bool) {
    if json {
        match serde_json::to_string(entity) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("Error: {}", e),
        }
        return;
    }
    let state = if entity.is_deleted() { "deleted" } else { "" };
    println!(
        "{}  {}  {}",
        entity.updated_at.to_rfc3339(),
        entity.resource_id,
        state
    );
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid instant '{}': {}", value, e))
}
