//! `financial_context` tool — context card and its evidence in one response.
//!
//! Both halves are computed from the same records at the same instant, so
//! the card's `generated_at` and the evidence's `generated_at` agree.

use async_trait::async_trait;
use chrono::Utc;
use finctx_context::ContextEngine;
use finctx_core::error::ToolError;
use finctx_core::evidence::EvidencePackage;
use finctx_core::snippet::ContextCard;
use finctx_core::tool::{Tool, ToolResult};
use finctx_evidence::EvidenceBuilder;
use serde::Serialize;
use tracing::debug;

use crate::args;

/// The paired response handed to the model.
#[derive(Debug, Serialize)]
pub struct FinancialContext {
    pub context_card: ContextCard,
    pub evidence: EvidencePackage,
}

#[derive(Default)]
pub struct FinancialContextTool {
    engine: ContextEngine,
    builder: EvidenceBuilder,
}

impl FinancialContextTool {
    pub fn new(engine: ContextEngine, builder: EvidenceBuilder) -> Self {
        Self { engine, builder }
    }
}

#[async_trait]
impl Tool for FinancialContextTool {
    fn name(&self) -> &str {
        "financial_context"
    }

    fn description(&self) -> &str {
        "Pack financial records into a context card for a query and attach the evidence behind it."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "records": args::records_schema(),
                "query": { "type": "string" },
                "token_budget": { "type": "integer", "minimum": 100, "maximum": 4000 },
                "max_items": { "type": "integer", "minimum": 1, "maximum": 100, "default": 50 },
                "include_aggregates": { "type": "boolean", "default": true },
                "user_id": { "type": "string" },
                "tool_name": {
                    "type": "string",
                    "description": "Tool name recorded in the evidence (default financial_context)"
                },
                "timestamp": { "type": "string" }
            },
            "required": ["records", "query", "token_budget", "user_id"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let records = args::records(&arguments)?;
        let request = args::context_request(&arguments)?;
        let invocation = args::invocation(&arguments, Some(self.name()))?;
        debug!(records = records.len(), budget = request.token_budget, "Executing financial_context");

        let now = Utc::now();
        let response = FinancialContext {
            context_card: self.engine.pack_at(&records, &request, now),
            evidence: self.builder.build_at(&records, &invocation, now),
        };
        args::json_result(self.name(), &response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn returns_card_and_evidence() {
        let result = FinancialContextTool::default()
            .execute(json!({
                "records": [
                    {"id": "tx_1", "amount": 45.5, "date": "2024-01-01", "merchant_name": "Starbucks"},
                    {"id": "h_1", "symbol": "AAPL", "quantity": 10, "security_name": "Apple Inc.", "institution_value": 1895.3}
                ],
                "query": "apple",
                "token_budget": 400,
                "user_id": "user_1"
            }))
            .await
            .unwrap();

        let data = result.data.unwrap();
        assert_eq!(data["context_card"]["query"], "apple");
        assert_eq!(data["evidence"]["metadata"]["tool_name"], "financial_context");
        assert_eq!(
            data["context_card"]["metadata"]["generated_at"],
            data["evidence"]["metadata"]["generated_at"]
        );
        assert_eq!(data["evidence"]["lineage"]["dependencies"], json!(["plaid_api"]));
    }
}
