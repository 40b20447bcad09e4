//! Relevance scorer — bag-of-tokens overlap plus recency and size bonuses.
//!
//! Per snippet, starting from zero:
//!
//! | Signal | Weight (default) |
//! |--------|------------------|
//! | query token present verbatim in the snippet | +1.0 each |
//! | (query token, snippet token) pair where one contains the other | +0.5 each |
//! | `date` tag within 30 days of now | +0.5 |
//! | `amount` tag with magnitude above 1000 | +0.3 |
//!
//! The substring pass also fires for exact matches, so an exact hit earns
//! 1.5. Output compatibility depends on that compounding.

// TODO: revisit the exact/substring double count in a tuning pass once there
// are relevance judgements to tune against.
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use finctx_config::ScoringConfig;
use finctx_core::record::parse_timestamp;
use finctx_core::snippet::Snippet;
use regex_lite::Regex;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W+").expect("NON_WORD regex should compile"));

/// Lower-case `text` and split it on runs of non-word characters.
pub fn tokenize(text: &str) -> Vec<String> {
    NON_WORD
        .split(&text.to_lowercase())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Score every snippet against `query` at the current time.
pub fn score(snippets: Vec<Snippet>, query: &str, config: &ScoringConfig) -> Vec<Snippet> {
    score_at(snippets, query, Utc::now(), config)
}

/// Score every snippet against `query` as of `now`. Order is preserved.
pub fn score_at(
    snippets: Vec<Snippet>,
    query: &str,
    now: DateTime<Utc>,
    config: &ScoringConfig,
) -> Vec<Snippet> {
    let query_tokens = tokenize(query);
    snippets
        .into_iter()
        .map(|mut snippet| {
            snippet.relevance = relevance(&snippet, &query_tokens, now, config);
            snippet
        })
        .collect()
}

/// Relevance of one snippet given pre-tokenized query terms.
pub fn relevance(
    snippet: &Snippet,
    query_tokens: &[String],
    now: DateTime<Utc>,
    config: &ScoringConfig,
) -> f64 {
    let tokens = tokenize(&snippet.text);
    let mut score = 0.0;

    for q in query_tokens {
        if tokens.contains(q) {
            score += config.exact_match_weight;
        }
        for t in &tokens {
            if t.contains(q.as_str()) || q.contains(t.as_str()) {
                score += config.substring_weight;
            }
        }
    }

    let recent = snippet
        .tags
        .date
        .as_deref()
        .and_then(parse_timestamp)
        .is_some_and(|date| (now - date).num_seconds().abs() <= config.recency_days * 86_400);
    if recent {
        score += config.recency_bonus;
    }

    if snippet
        .tags
        .amount
        .is_some_and(|a| a.abs() > config.large_amount_threshold)
    {
        score += config.large_amount_bonus;
    }

    score
}
