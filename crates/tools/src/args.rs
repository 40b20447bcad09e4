//! Argument parsing shared by the tools.

use chrono::Utc;
use finctx_context::ContextRequest;
use finctx_core::error::ToolError;
use finctx_core::evidence::Invocation;
use finctx_core::record::{Record, parse_timestamp};
use finctx_core::tool::ToolResult;
use serde::Serialize;
use serde_json::{Value, json};

/// The `records` array. Each element becomes one record.
pub fn records(arguments: &Value) -> Result<Vec<Record>, ToolError> {
    match arguments.get("records") {
        Some(Value::Array(items)) => Ok(items.iter().cloned().map(Record::from).collect()),
        Some(_) => Err(ToolError::InvalidArguments("'records' must be an array".into())),
        None => Err(ToolError::InvalidArguments("Missing 'records' argument".into())),
    }
}

/// `query`, `token_budget` and the optional packing options, validated.
pub fn context_request(arguments: &Value) -> Result<ContextRequest, ToolError> {
    let query = arguments["query"]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;
    let token_budget = arguments["token_budget"].as_u64().ok_or_else(|| {
        ToolError::InvalidArguments("'token_budget' must be a positive integer".into())
    })?;

    let mut request = ContextRequest::new(query, token_budget as usize);
    match &arguments["max_items"] {
        Value::Null => {}
        value => {
            let max_items = value.as_u64().ok_or_else(|| {
                ToolError::InvalidArguments("'max_items' must be a positive integer".into())
            })?;
            request = request.with_max_items(max_items as usize);
        }
    }
    match &arguments["include_aggregates"] {
        Value::Null => {}
        Value::Bool(include) => request = request.with_aggregates(*include),
        _ => {
            return Err(ToolError::InvalidArguments(
                "'include_aggregates' must be a boolean".into(),
            ));
        }
    }

    request
        .validate()
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
    Ok(request)
}

/// `tool_name`, `user_id` and the optional `timestamp` (defaults to now).
pub fn invocation(arguments: &Value, default_tool: Option<&str>) -> Result<Invocation, ToolError> {
    let tool_name = arguments["tool_name"]
        .as_str()
        .or(default_tool)
        .ok_or_else(|| ToolError::InvalidArguments("Missing 'tool_name' argument".into()))?;
    let user_id = arguments["user_id"]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments("Missing 'user_id' argument".into()))?;
    let timestamp = match &arguments["timestamp"] {
        Value::Null => Utc::now(),
        Value::String(raw) => parse_timestamp(raw).ok_or_else(|| {
            ToolError::InvalidArguments(format!("Unparseable 'timestamp': {raw}"))
        })?,
        _ => {
            return Err(ToolError::InvalidArguments(
                "'timestamp' must be an RFC 3339 string".into(),
            ));
        }
    };
    Ok(Invocation::new(tool_name, user_id, timestamp))
}

/// JSON schema for the `records` argument.
pub fn records_schema() -> Value {
    json!({
        "type": "array",
        "description": "Financial records already fetched for this request: transactions, accounts, holdings, crypto positions or orders",
        "items": { "type": "object" }
    })
}

/// Wrap a serializable value as a successful result.
pub fn json_result<T: Serialize>(tool: &str, value: &T) -> Result<ToolResult, ToolError> {
    let data = serde_json::to_value(value).map_err(|e| ToolError::ExecutionFailed {
        tool_name: tool.into(),
        reason: e.to_string(),
    })?;
    let output = serde_json::to_string_pretty(&data).unwrap_or_default();
    Ok(ToolResult {
        call_id: String::new(),
        success: true,
        output,
        data: Some(data),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_must_be_an_array() {
        assert!(records(&json!({"records": {}})).is_err());
        assert!(records(&json!({})).is_err());
        assert_eq!(records(&json!({"records": [{"a": 1}, 5]})).unwrap().len(), 2);
    }

    #[test]
    fn context_request_defaults() {
        let request = context_request(&json!({"query": "coffee", "token_budget": 500})).unwrap();
        assert_eq!(request.max_items, 50);
        assert!(request.include_aggregates);
    }

    #[test]
    fn context_request_options() {
        let request = context_request(&json!({
            "query": "coffee",
            "token_budget": 500,
            "max_items": 5,
            "include_aggregates": false
        }))
        .unwrap();
        assert_eq!(request.max_items, 5);
        assert!(!request.include_aggregates);
    }

    #[test]
    fn context_request_rejects_bad_values() {
        assert!(context_request(&json!({"token_budget": 500})).is_err());
        assert!(context_request(&json!({"query": "q", "token_budget": 99})).is_err());
        assert!(context_request(&json!({"query": "q", "token_budget": "500"})).is_err());
        assert!(context_request(&json!({"query": "q", "token_budget": 500, "max_items": 0})).is_err());
        assert!(
            context_request(&json!({"query": "q", "token_budget": 500, "include_aggregates": "yes"}))
                .is_err()
        );
    }

    #[test]
    fn invocation_parses_timestamp() {
        let inv = invocation(
            &json!({"tool_name": "t", "user_id": "u", "timestamp": "2024-06-15T12:00:00Z"}),
            None,
        )
        .unwrap();
        assert_eq!(inv.timestamp.to_rfc3339(), "2024-06-15T12:00:00+00:00");
        assert!(invocation(&json!({"tool_name": "t", "user_id": "u", "timestamp": "soon"}), None).is_err());
        assert!(invocation(&json!({"user_id": "u"}), None).is_err());
        assert_eq!(
            invocation(&json!({"user_id": "u"}), Some("fallback")).unwrap().tool_name,
            "fallback"
        );
    }
}
