//! # finctx Core
//!
//! Domain types, the record shape classifier, and error definitions for the
//! finctx context engine. Every other crate depends inward on this one.
//!
//! ## Layout
//!
//! - [`record`]: loosely-typed input records and the closed shape classifier
//!   shared by the snippet normalizer and the evidence builder
//! - [`snippet`]: snippets and the context card
//! - [`evidence`]: provenance items, aggregations, lineage and the evidence package
//! - [`spending`]: spending summary over transaction-like records
//! - [`tool`]: the `Tool` trait the outer tool-execution layer plugs into

pub mod error;
pub mod evidence;
pub mod record;
pub mod snippet;
pub mod spending;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{ContextError, Error, EvidenceError, Result, ToolError};
pub use evidence::{
    AggregationOp, AggregationRecord, DataLineage, EvidenceItem, EvidenceMetadata,
    EvidencePackage, Invocation, LineageSource, SourceTable,
};
pub use record::{Record, RecordShape, parse_timestamp};
pub use snippet::{CardMetadata, ContextCard, Snippet, SnippetKind, SnippetTags};
pub use spending::{CategorySummary, MerchantSummary, Period, SpendingSummary};
pub use tool::{Tool, ToolCall, ToolDefinition, ToolRegistry, ToolResult};
