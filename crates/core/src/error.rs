//! Error types for the finctx domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! The two core entry points (`pack_context`, `build_evidence`) never let
//! these escape: they convert failures into fallback outputs. The errors
//! are visible through the `try_*` variants and the tool adapters.

use thiserror::Error;

/// The top-level error type for all finctx operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Context packing errors ---
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    // --- Evidence errors ---
    #[error("Evidence error: {0}")]
    Evidence(#[from] EvidenceError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextError {
    #[error("token budget {budget} outside allowed range {min}..={max}")]
    InvalidTokenBudget { budget: usize, min: usize, max: usize },

    #[error("max items {max_items} outside allowed range {min}..={max}")]
    InvalidMaxItems {
        max_items: usize,
        min: usize,
        max: usize,
    },

    #[error("non-finite value while computing {0}")]
    NonFinite(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvidenceError {
    #[error("aggregation {operation}({field}) produced a non-finite value")]
    NonFiniteAggregate { operation: String, field: String },

    #[error("tool name must not be empty")]
    MissingToolName,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}
