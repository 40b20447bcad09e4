//! Snippets and the context card.
//!
//! A snippet is the compact textual rendering of one record plus the tags
//! the packer compares for redundancy. The context card is the
//! token-bounded selection handed to the model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a snippet describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnippetKind {
    Transaction,
    Account,
    Holding,
    Position,
    Summary,
}

impl SnippetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::Account => "account",
            Self::Holding => "holding",
            Self::Position => "position",
            Self::Summary => "summary",
        }
    }
}

impl std::fmt::Display for SnippetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured fields pulled out of the record for diversity comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnippetTags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// One normalized record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub kind: SnippetKind,

    /// Human-readable rendering of the record.
    pub text: String,

    /// Estimated token cost of `text`.
    pub token_count: usize,

    /// Relevance to the query. Zero until scored.
    #[serde(default)]
    pub relevance: f64,

    #[serde(default)]
    pub tags: SnippetTags,
}

/// Bookkeeping attached to a context card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardMetadata {
    pub original_count: usize,
    pub included_count: usize,
    pub token_budget: usize,
    pub strategy_name: String,
    pub generated_at: DateTime<Utc>,
}

/// The token-bounded, diversity-selected set of snippets for one query.
///
/// Snippets are in selection order, which is not necessarily relevance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextCard {
    pub query: String,
    pub snippets: Vec<Snippet>,
    pub total_tokens: usize,
    pub compression_ratio: f64,
    pub metadata: CardMetadata,
}

impl ContextCard {
    /// Build a card from a final selection. Totals and ratio are derived here.
    pub fn new(
        query: impl Into<String>,
        snippets: Vec<Snippet>,
        original_count: usize,
        token_budget: usize,
        strategy_name: impl Into<String>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let total_tokens = snippets.iter().map(|s| s.token_count).sum();
        let included_count = snippets.len();
        let compression_ratio = if original_count == 0 {
            0.0
        } else {
            included_count as f64 / original_count as f64
        };
        Self {
            query: query.into(),
            snippets,
            total_tokens,
            compression_ratio,
            metadata: CardMetadata {
                original_count,
                included_count,
                token_budget,
                strategy_name: strategy_name.into(),
                generated_at,
            },
        }
    }

    /// A card with nothing selected.
    pub fn empty(
        query: impl Into<String>,
        original_count: usize,
        token_budget: usize,
        strategy_name: impl Into<String>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            query,
            Vec::new(),
            original_count,
            token_budget,
            strategy_name,
            generated_at,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(text: &str, tokens: usize) -> Snippet {
        Snippet {
            kind: SnippetKind::Transaction,
            text: text.into(),
            token_count: tokens,
            relevance: 1.0,
            tags: SnippetTags::default(),
        }
    }

    #[test]
    fn totals_are_derived() {
        let card = ContextCard::new(
            "coffee",
            vec![snippet("a", 3), snippet("b", 4)],
            8,
            100,
            "test",
            Utc::now(),
        );
        assert_eq!(card.total_tokens, 7);
        assert_eq!(card.metadata.included_count, 2);
        assert!((card.compression_ratio - 0.25).abs() < 1e-12);
    }

    #[test]
    fn empty_input_has_zero_ratio() {
        let card = ContextCard::empty("q", 0, 500, "test", Utc::now());
        assert_eq!(card.compression_ratio, 0.0);
        assert_eq!(card.total_tokens, 0);
        assert!(card.is_empty());
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&SnippetKind::Summary).unwrap();
        assert_eq!(json, "\"summary\"");
    }

    #[test]
    fn empty_tags_are_skipped() {
        let json = serde_json::to_value(snippet("x", 1)).unwrap();
        assert_eq!(json["tags"], serde_json::json!({}));
    }
}
