//! `build_evidence` tool — provenance for a tool response.

use async_trait::async_trait;
use finctx_core::error::ToolError;
use finctx_core::tool::{Tool, ToolResult};
use finctx_evidence::EvidenceBuilder;
use tracing::debug;

use crate::args;

#[derive(Default)]
pub struct BuildEvidenceTool {
    builder: EvidenceBuilder,
}

impl BuildEvidenceTool {
    pub fn new(builder: EvidenceBuilder) -> Self {
        Self { builder }
    }
}

#[async_trait]
impl Tool for BuildEvidenceTool {
    fn name(&self) -> &str {
        "build_evidence"
    }

    fn description(&self) -> &str {
        "Trace financial records back to their source tables and report aggregates, lineage and confidence."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "records": args::records_schema(),
                "tool_name": {
                    "type": "string",
                    "description": "Name of the tool whose response the evidence is for"
                },
                "user_id": {
                    "type": "string",
                    "description": "User the records belong to"
                },
                "timestamp": {
                    "type": "string",
                    "description": "When the tool was invoked, RFC 3339 (default now)"
                }
            },
            "required": ["records", "tool_name", "user_id"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let records = args::records(&arguments)?;
        let invocation = args::invocation(&arguments, None)?;
        debug!(records = records.len(), tool = %invocation.tool_name, "Executing build_evidence");

        let package = self.builder.build(&records, &invocation);
        args::json_result(self.name(), &package)
    }
}
