//! Aggregate synthesizer — summary snippets derived from the full record set.
//!
//! Works on the original records, not on the packed selection, so totals
//! cover everything the caller fetched. Summary snippets carry a fixed high
//! relevance and are prepended ahead of the packed snippets.

use finctx_config::PackingConfig;
use finctx_core::error::ContextError;
use finctx_core::record::Record;
use finctx_core::snippet::{Snippet, SnippetKind, SnippetTags};
use finctx_core::spending::SpendingSummary;

use crate::money::to_fixed2;
use crate::token::estimate_tokens;

/// Summary snippets for `records`. Empty when no record is transaction-like.
pub fn synthesize(records: &[Record], config: &PackingConfig) -> Result<Vec<Snippet>, ContextError> {
    let spending = SpendingSummary::from_records(records);
    if spending.is_empty() {
        return Ok(Vec::new());
    }
    if !spending.total_spent.is_finite() || !spending.total_income.is_finite() {
        return Err(ContextError::NonFinite("transaction totals".into()));
    }

    let text = format!(
        "Summary: ${} spent, ${} income from {} transactions",
        to_fixed2(spending.total_spent),
        to_fixed2(spending.total_income),
        spending.transaction_count
    );
    Ok(vec![Snippet {
        kind: SnippetKind::Summary,
        token_count: estimate_tokens(&text),
        text,
        relevance: config.summary_relevance,
        tags: SnippetTags::default(),
    }])
}
