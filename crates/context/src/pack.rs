//! Diversity-constrained packer — single-pass greedy MMR approximation.
//!
//! # Algorithm
//!
//! 1. Stable-sort snippets by relevance, highest first
//! 2. Available budget = token budget − aggregate reserve
//! 3. Walk at most `max_items` candidates:
//!    - if the candidate does not fit the remaining budget, stop (no
//!      further candidates are considered, even cheaper ones)
//!    - otherwise multiply its relevance by a diversity factor computed
//!      against everything already selected, and accept it when the
//!      product clears the minimum score; rejected candidates are dropped
//! 4. Return the selection in acceptance order
//!
//! Cost is O(n log n) for the sort plus O(n·k) for the diversity pass,
//! with k the selection size.

use finctx_config::PackingConfig;
use finctx_core::snippet::Snippet;
use tracing::debug;

/// Select snippets under `token_budget − reserve` and at most `max_items` candidates.
pub fn pack(
    mut snippets: Vec<Snippet>,
    token_budget: usize,
    max_items: usize,
    reserve: usize,
    config: &PackingConfig,
) -> Vec<Snippet> {
    snippets.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));

    let available = token_budget.saturating_sub(reserve);
    let limit = max_items.min(snippets.len());
    let mut selected: Vec<Snippet> = Vec::new();
    let mut used = 0;
    let mut skipped = 0;

    for (position, candidate) in snippets.into_iter().take(limit).enumerate() {
        if used + candidate.token_count > available {
            debug!(
                position,
                used,
                available,
                candidate_tokens = candidate.token_count,
                "Candidate exceeds remaining budget, stopping"
            );
            break;
        }

        let combined = candidate.relevance * diversity(&candidate, &selected, config);
        if combined > config.min_combined_score {
            used += candidate.token_count;
            selected.push(candidate);
        } else {
            skipped += 1;
        }
    }

    debug!(
        selected = selected.len(),
        skipped,
        used,
        available,
        "Packed snippets"
    );
    selected
}

/// Redundancy multiplier of `candidate` against the current selection, in `[floor, 1]`.
pub fn diversity(candidate: &Snippet, selected: &[Snippet], config: &PackingConfig) -> f64 {
    let mut factor = 1.0;
    for other in selected {
        if other.kind == candidate.kind {
            factor *= config.same_kind_penalty;
        }
        if let (Some(a), Some(b)) = (candidate.tags.amount, other.tags.amount) {
            if (a - b).abs() <= config.similar_amount_window {
                factor *= config.similar_amount_penalty;
            }
        }
        if shares_label(&candidate.tags.category, &other.tags.category)
            || shares_label(&candidate.tags.symbol, &other.tags.symbol)
        {
            factor *= config.shared_label_penalty;
        }
    }
    factor.max(config.diversity_floor)
}

fn shares_label(a: &Option<String>, b: &Option<String>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}
