//! Budget trimmer — the final pass that enforces the hard token ceiling.
//!
//! The packer checks candidates against the budget left after the
//! aggregate reserve; summaries are prepended afterwards. This pass re-checks
//! the combined list against the full budget and is the single place the
//! `total_tokens ≤ token_budget` invariant is enforced.

use finctx_core::snippet::Snippet;
use tracing::debug;

/// Keep snippets in order until the next one would exceed `token_budget`.
pub fn trim(snippets: Vec<Snippet>, token_budget: usize) -> Vec<Snippet> {
    let total = snippets.len();
    let mut used = 0;
    let mut kept = Vec::with_capacity(total);

    for snippet in snippets {
        if used + snippet.token_count > token_budget {
            break;
        }
        used += snippet.token_count;
        kept.push(snippet);
    }

    if kept.len() < total {
        debug!(
            dropped = total - kept.len(),
            used, token_budget, "Trimmed snippets over budget"
        );
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use finctx_core::snippet::{SnippetKind, SnippetTags};

    fn snippet(tokens: usize) -> Snippet {
        Snippet {
            kind: SnippetKind::Transaction,
            text: format!("{tokens} tokens"),
            token_count: tokens,
            relevance: 1.0,
            tags: SnippetTags::default(),
        }
    }

    #[test]
    fn everything_fits() {
        let out = trim(vec![snippet(10), snippet(20)], 30);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn stops_at_first_overflow() {
        let out = trim(vec![snippet(10), snippet(25), snippet(1)], 30);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].token_count, 10);
    }

    #[test]
    fn oversized_first_snippet_empties_output() {
        assert!(trim(vec![snippet(200), snippet(1)], 100).is_empty());
    }
}
