//! Token estimation utilities.
//!
//! Uses a word-based heuristic: one whitespace-delimited word costs
//! 1.3 tokens, rounded up per text. This is an approximation, not a real
//! tokenizer, and budgets are enforced against it exactly.

/// Tokens charged per whitespace-delimited word.
pub const TOKENS_PER_WORD: f64 = 1.3;

/// Number of whitespace-delimited runs in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Estimate the token count for a string: `ceil(words × 1.3)`.
pub fn estimate_tokens(text: &str) -> usize {
    (word_count(text) as f64 * TOKENS_PER_WORD).ceil() as usize
}
