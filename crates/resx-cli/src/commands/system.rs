//! Tag and count commands

use crate::commands::StoreArgs;
use clap::Args;
use resx_engine::{apply_engine_query, EngineQuery, EngineQueryResult};

#[derive(Debug, Args)]
pub struct TagsArgs {
    /// Print tags as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Debug, Args)]
pub struct CountsArgs {
    /// Print counts as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub store: StoreArgs,
}

pub fn execute_tags(args: TagsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let session = args.store.open()?;
    let EngineQueryResult::AllTags(tags) = apply_engine_query(EngineQuery::AllTags, &session.conn)?
    else {
        return Err("tag query returned an unexpected result".into());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tags)?);
        return Ok(());
    }
    for tag in tags {
        let scheme = tag.scheme.as_deref().unwrap_or("");
        match &tag.label {
            Some(label) => println!("{}|{}  {}", scheme, tag.term, label),
            None => println!("{}|{}", scheme, tag.term),
        }
    }
    Ok(())
}

pub fn execute_counts(args: CountsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let session = args.store.open()?;
    let EngineQueryResult::ResourceCounts(counts) =
        apply_engine_query(EngineQuery::ResourceCounts, &session.conn)?
    else {
        return Err("count query returned an unexpected result".into());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
        return Ok(());
    }
    for (resource_type, count) in &counts {
        println!("{:<24} {}", resource_type, count);
    }
    Ok(())
}
