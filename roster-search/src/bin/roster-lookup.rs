//! Directory Lookup Binary
//!
//! Loads a JSON store snapshot into memory and resolves admission numbers
//! against it, printing the batch result as JSON to stdout.
//!
//! Usage:
//!   roster-lookup [--method cached|direct] <snapshot.json> <id>...

use std::process::ExitCode;
use std::sync::Arc;

use roster_search::{
    init_tracing, DirectoryService, SearchConfig, SearchMethod, SearchOptions, TelemetryConfig,
};
use roster_storage::{InMemoryStore, StoreSnapshot};

const USAGE: &str = "usage: roster-lookup [--method cached|direct] <snapshot.json> <id>...";

struct Args {
    options: SearchOptions,
    snapshot: String,
    ids: Vec<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut options = SearchOptions::default();
    let mut positional = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--method" => {
                let value = args.next().ok_or("--method needs a value")?;
                let method = match value.as_str() {
                    "cached" => SearchMethod::Cached,
                    "direct" => SearchMethod::Direct,
                    other => return Err(format!("unknown method {:?}", other)),
                };
                options = SearchOptions::forced(method);
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let snapshot = positional.next().ok_or(USAGE)?;
    let ids: Vec<String> = positional.collect();
    if ids.is_empty() {
        return Err(USAGE.to_string());
    }
    Ok(Args {
        options,
        snapshot,
        ids,
    })
}

fn load_store(path: &str) -> Result<InMemoryStore, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
    let snapshot: StoreSnapshot =
        serde_json::from_str(&raw).map_err(|e| format!("Invalid snapshot {}: {}", path, e))?;
    Ok(InMemoryStore::from_snapshot(snapshot))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = init_tracing(&TelemetryConfig::from_env()) {
        eprintln!("{}", e);
    }

    let store = match load_store(&args.snapshot) {
        Ok(store) => Arc::new(store),
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    let config = SearchConfig::from_env();
    let service = match DirectoryService::new(store.clone(), store, config) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = service.init().await {
        tracing::warn!(error = %e, "Continuing with a cold cache");
    }

    let result = match service.batch_search(&args.ids, &args.options).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Batch search failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    service.shutdown().await;

    match serde_json::to_string_pretty(&result) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to serialize result: {}", e);
            ExitCode::FAILURE
        }
    }
}
