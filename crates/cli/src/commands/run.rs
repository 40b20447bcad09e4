//! `finctx pack | evidence | context | tools` — run a tool over a records file.

use std::path::Path;

use clap::Args;
use finctx_config::AppConfig;
use finctx_core::tool::ToolCall;
use finctx_tools::registry_from_config;
use serde_json::{Map, Value, json};
use tokio::io::AsyncReadExt;
use tracing::debug;

use super::config_cmd;

#[derive(Args, Debug)]
pub struct PackArgs {
    /// Natural-language question the context is for
    #[arg(short, long)]
    pub query: String,

    /// Token budget (default from config)
    #[arg(short = 'b', long)]
    pub token_budget: Option<usize>,

    /// Maximum snippets on the card (default from config)
    #[arg(short = 'n', long)]
    pub max_items: Option<usize>,

    /// Skip the spending summary
    #[arg(long)]
    pub no_aggregates: bool,
}

#[derive(Args, Debug)]
pub struct InvocationArgs {
    /// User the records belong to
    #[arg(short, long, default_value = "local")]
    pub user_id: String,

    /// Tool name recorded in the evidence
    #[arg(short, long)]
    pub tool_name: Option<String>,

    /// Invocation time, RFC 3339 (default now)
    #[arg(long)]
    pub timestamp: Option<String>,
}

pub async fn pack(
    config: Option<&Path>,
    file: &Path,
    packing: PackArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = config_cmd::load(config)?;
    let mut arguments = Map::new();
    arguments.insert("records".into(), read_records(file).await?);
    insert_packing(&mut arguments, &packing, &config);
    Ok(dispatch(&config, "pack_context", arguments).await?)
}

pub async fn evidence(
    config: Option<&Path>,
    file: &Path,
    invocation: InvocationArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = config_cmd::load(config)?;
    let mut arguments = Map::new();
    arguments.insert("records".into(), read_records(file).await?);
    if invocation.tool_name.is_none() {
        arguments.insert("tool_name".into(), json!("build_evidence"));
    }
    insert_invocation(&mut arguments, &invocation);
    Ok(dispatch(&config, "build_evidence", arguments).await?)
}

pub async fn context(
    config: Option<&Path>,
    file: &Path,
    packing: PackArgs,
    invocation: InvocationArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = config_cmd::load(config)?;
    let mut arguments = Map::new();
    arguments.insert("records".into(), read_records(file).await?);
    insert_packing(&mut arguments, &packing, &config);
    insert_invocation(&mut arguments, &invocation);
    Ok(dispatch(&config, "financial_context", arguments).await?)
}

pub fn tools() -> finctx_core::Result<()> {
    let registry = finctx_tools::default_registry();
    println!("{}", serde_json::to_string_pretty(&registry.definitions())?);
    Ok(())
}

/// Records from a JSON file: a bare array or an object with a `records` array.
pub async fn read_records(file: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let content = if file == Path::new("-") {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(file)
            .await
            .map_err(|e| format!("Failed to read {}: {e}", file.display()))?
    };
    extract_records(serde_json::from_str(&content)?)
}

fn extract_records(value: Value) -> Result<Value, Box<dyn std::error::Error>> {
    match value {
        Value::Array(_) => Ok(value),
        Value::Object(mut map) => match map.remove("records") {
            Some(records @ Value::Array(_)) => Ok(records),
            _ => Err("expected a JSON array of records or an object with a 'records' array".into()),
        },
        _ => Err("expected a JSON array of records".into()),
    }
}

fn insert_packing(arguments: &mut Map<String, Value>, packing: &PackArgs, config: &AppConfig) {
    arguments.insert("query".into(), json!(packing.query));
    arguments.insert(
        "token_budget".into(),
        json!(packing.token_budget.unwrap_or(config.context.token_budget)),
    );
    arguments.insert(
        "max_items".into(),
        json!(packing.max_items.unwrap_or(config.context.max_items)),
    );
    arguments.insert(
        "include_aggregates".into(),
        json!(config.context.include_aggregates && !packing.no_aggregates),
    );
}

fn insert_invocation(arguments: &mut Map<String, Value>, invocation: &InvocationArgs) {
    arguments.insert("user_id".into(), json!(invocation.user_id));
    if let Some(tool_name) = &invocation.tool_name {
        arguments.insert("tool_name".into(), json!(tool_name));
    }
    if let Some(timestamp) = &invocation.timestamp {
        arguments.insert("timestamp".into(), json!(timestamp));
    }
}

async fn dispatch(
    config: &AppConfig,
    tool: &str,
    arguments: Map<String, Value>,
) -> finctx_core::Result<()> {
    let registry = registry_from_config(config);
    let call = ToolCall {
        id: "cli".into(),
        name: tool.into(),
        arguments: Value::Object(arguments),
    };
    debug!(tool, "Dispatching tool call");
    let result = registry.execute(&call).await?;
    println!("{}", result.output);
    Ok(())
}
