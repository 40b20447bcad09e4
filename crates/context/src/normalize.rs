//! Snippet normalizer — one record in, one snippet out.
//!
//! Rendering is a deterministic function of the record and never fails:
//! records of an unrecognized shape degrade to a summary snippet built from
//! their first few fields.

use finctx_core::record::{Record, RecordShape};
use finctx_core::snippet::{Snippet, SnippetKind, SnippetTags};
use serde_json::Value;

use crate::money::to_fixed2;
use crate::token::estimate_tokens;

/// Fields shown for a record of unknown shape.
const GENERIC_FIELD_LIMIT: usize = 3;

/// Normalize a record into an unscored snippet.
pub fn normalize(record: &Record) -> Snippet {
    let shape = record.shape();
    let (kind, text, tags) = match shape {
        RecordShape::Transaction => render_transaction(record),
        RecordShape::Account => render_account(record),
        RecordShape::Holding | RecordShape::Position => render_holding(record, shape),
        RecordShape::Generic => render_generic(record),
    };
    Snippet {
        kind,
        token_count: estimate_tokens(&text),
        text,
        relevance: 0.0,
        tags,
    }
}

/// Normalize every record, preserving input order.
pub fn normalize_all(records: &[Record]) -> Vec<Snippet> {
    records.iter().map(normalize).collect()
}

fn render_transaction(record: &Record) -> (SnippetKind, String, SnippetTags) {
    let amount = record.number("amount").unwrap_or(0.0);
    let merchant = record
        .first_text(&["merchant_name", "description"])
        .unwrap_or_else(|| "Unknown".into());
    let category = record.primary_category();
    let date = record.text("date");

    let text = format!(
        "${} at {} ({}) on {}",
        to_fixed2(amount.abs()),
        merchant,
        category.as_deref().unwrap_or("Other"),
        date.as_deref().unwrap_or("Unknown date"),
    );
    let tags = SnippetTags {
        source_id: record.source_id(),
        amount: Some(amount),
        date,
        category,
        symbol: record.text("symbol"),
    };
    (SnippetKind::Transaction, text, tags)
}

fn render_account(record: &Record) -> (SnippetKind, String, SnippetTags) {
    let name = record.text("name").unwrap_or_else(|| "Unknown Account".into());
    let mask = record
        .text("mask")
        .map(|m| format!(" (***{m})"))
        .unwrap_or_default();
    let balance = record
        .first_number(&["balance_current", "balance_available"])
        .unwrap_or(0.0);
    let account_type = record.text("type").unwrap_or_else(|| "unknown".into());

    let text = format!("{name}{mask}: ${} {account_type} account", to_fixed2(balance));
    let tags = SnippetTags {
        source_id: record.source_id(),
        ..SnippetTags::default()
    };
    (SnippetKind::Account, text, tags)
}

fn render_holding(record: &Record, shape: RecordShape) -> (SnippetKind, String, SnippetTags) {
    let symbol = record.text("symbol").unwrap_or_default();
    let quantity = record.number("quantity");
    let quantity_text = quantity
        .map(|q| q.to_string())
        .or_else(|| record.text("quantity"))
        .unwrap_or_else(|| "0".into());
    let name = record
        .first_text(&["security_name", "name"])
        .unwrap_or_else(|| symbol.clone());
    let value = record.position_value().unwrap_or(0.0);

    let mut text = format!(
        "{symbol}: {quantity_text} shares of {name}, value ${}",
        to_fixed2(value)
    );
    if let Some(pnl) = record.number("unrealized_pnl") {
        let sign = if pnl < 0.0 { '-' } else { '+' };
        text.push_str(&format!(", P&L {sign}${}", to_fixed2(pnl.abs())));
    }

    let kind = if shape == RecordShape::Position {
        SnippetKind::Position
    } else {
        SnippetKind::Holding
    };
    let tags = SnippetTags {
        source_id: record.source_id(),
        symbol: Some(symbol).filter(|s| !s.is_empty()),
        ..SnippetTags::default()
    };
    (kind, text, tags)
}

fn render_generic(record: &Record) -> (SnippetKind, String, SnippetTags) {
    let pairs: Vec<String> = record
        .fields()
        .iter()
        .filter(|(_, v)| !v.is_null())
        .take(GENERIC_FIELD_LIMIT)
        .map(|(k, v)| format!("{k}: {}", display_value(v)))
        .collect();
    let text = if pairs.is_empty() {
        "No data available".to_string()
    } else {
        pairs.join(", ")
    };
    let tags = SnippetTags {
        source_id: record.source_id(),
        ..SnippetTags::default()
    };
    (SnippetKind::Summary, text, tags)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
