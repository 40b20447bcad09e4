//! `pack_context` tool — a token-bounded context card for one query.

use async_trait::async_trait;
use finctx_context::ContextEngine;
use finctx_core::error::ToolError;
use finctx_core::tool::{Tool, ToolResult};
use tracing::debug;

use crate::args;

#[derive(Default)]
pub struct PackContextTool {
    engine: ContextEngine,
}

impl PackContextTool {
    pub fn new(engine: ContextEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Tool for PackContextTool {
    fn name(&self) -> &str {
        "pack_context"
    }

    fn description(&self) -> &str {
        "Compress financial records into a token-bounded, diversity-selected context card for a query."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "records": args::records_schema(),
                "query": {
                    "type": "string",
                    "description": "Natural-language question the context is for"
                },
                "token_budget": {
                    "type": "integer",
                    "description": "Hard ceiling on the card's total tokens (100-4000)",
                    "minimum": 100,
                    "maximum": 4000
                },
                "max_items": {
                    "type": "integer",
                    "description": "Maximum number of snippets (1-100, default 50)",
                    "minimum": 1,
                    "maximum": 100,
                    "default": 50
                },
                "include_aggregates": {
                    "type": "boolean",
                    "description": "Prepend a spending summary (default true)",
                    "default": true
                }
            },
            "required": ["records", "query", "token_budget"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let records = args::records(&arguments)?;
        let request = args::context_request(&arguments)?;
        debug!(records = records.len(), budget = request.token_budget, "Executing pack_context");

        let card = self.engine.pack(&records, &request);
        args::json_result(self.name(), &card)
    }
}
