//! The `pack_context` pipeline.
//!
//! normalize → score → synthesize aggregates → pack → prepend → trim.
//!
//! Validation failures and internal arithmetic failures never escape
//! [`ContextEngine::pack`]: they produce an empty card whose strategy name
//! is [`ERROR_STRATEGY`]. [`ContextEngine::try_pack_at`] exposes the error.

use chrono::{DateTime, Utc};
use finctx_config::{
    AppConfig, MAX_MAX_ITEMS, MAX_TOKEN_BUDGET, MIN_MAX_ITEMS, MIN_TOKEN_BUDGET, PackingConfig,
    ScoringConfig,
};
use finctx_core::error::ContextError;
use finctx_core::record::Record;
use finctx_core::snippet::ContextCard;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{aggregate, normalize, pack, score, trim};

/// Strategy name stamped on every successfully packed card.
pub const STRATEGY_NAME: &str = "diversity_greedy";
/// Strategy name stamped on the fallback card after a failure.
pub const ERROR_STRATEGY: &str = "error";

// ── Request ───────────────────────────────────────────────────────────────

/// Options for one `pack_context` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRequest {
    pub query: String,

    /// Hard ceiling on the card's total tokens. Must be within 100..=4000.
    pub token_budget: usize,

    /// Maximum number of snippets on the card. Must be within 1..=100.
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Prepend synthesized summary snippets.
    #[serde(default = "default_include_aggregates")]
    pub include_aggregates: bool,
}

fn default_max_items() -> usize {
    50
}
fn default_include_aggregates() -> bool {
    true
}

impl ContextRequest {
    pub fn new(query: impl Into<String>, token_budget: usize) -> Self {
        Self {
            query: query.into(),
            token_budget,
            max_items: default_max_items(),
            include_aggregates: default_include_aggregates(),
        }
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn with_aggregates(mut self, include: bool) -> Self {
        self.include_aggregates = include;
        self
    }

    pub fn validate(&self) -> Result<(), ContextError> {
        if !(MIN_TOKEN_BUDGET..=MAX_TOKEN_BUDGET).contains(&self.token_budget) {
            return Err(ContextError::InvalidTokenBudget {
                budget: self.token_budget,
                min: MIN_TOKEN_BUDGET,
                max: MAX_TOKEN_BUDGET,
            });
        }
        if !(MIN_MAX_ITEMS..=MAX_MAX_ITEMS).contains(&self.max_items) {
            return Err(ContextError::InvalidMaxItems {
                max_items: self.max_items,
                min: MIN_MAX_ITEMS,
                max: MAX_MAX_ITEMS,
            });
        }
        Ok(())
    }
}

// ── Engine ────────────────────────────────────────────────────────────────

/// Stateless packer holding the scoring and packing heuristics.
#[derive(Debug, Clone, Default)]
pub struct ContextEngine {
    scoring: ScoringConfig,
    packing: PackingConfig,
}

impl ContextEngine {
    pub fn new(scoring: ScoringConfig, packing: PackingConfig) -> Self {
        Self { scoring, packing }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.scoring.clone(), config.packing.clone())
    }

    /// Pack `records` for `request` at the current time. Never fails.
    pub fn pack(&self, records: &[Record], request: &ContextRequest) -> ContextCard {
        self.pack_at(records, request, Utc::now())
    }

    /// Pack as of `now`. Failures yield an empty card with the error strategy.
    pub fn pack_at(
        &self,
        records: &[Record],
        request: &ContextRequest,
        now: DateTime<Utc>,
    ) -> ContextCard {
        match self.try_pack_at(records, request, now) {
            Ok(card) => card,
            Err(e) => {
                warn!(error = %e, records = records.len(), "Context packing failed, returning empty card");
                ContextCard::empty(
                    request.query.clone(),
                    records.len(),
                    request.token_budget,
                    ERROR_STRATEGY,
                    now,
                )
            }
        }
    }

    /// Pack as of `now`, surfacing validation and arithmetic failures.
    pub fn try_pack_at(
        &self,
        records: &[Record],
        request: &ContextRequest,
        now: DateTime<Utc>,
    ) -> Result<ContextCard, ContextError> {
        request.validate()?;

        let original_count = records.len();
        if original_count == 0 {
            debug!(query = %request.query, "No records to pack");
            return Ok(ContextCard::empty(
                request.query.clone(),
                0,
                request.token_budget,
                STRATEGY_NAME,
                now,
            ));
        }

        let snippets = normalize::normalize_all(records);
        let scored = score::score_at(snippets, &request.query, now, &self.scoring);

        let (aggregates, reserve) = if request.include_aggregates {
            let aggregates = aggregate::synthesize(records, &self.packing)?;
            // Rounded up: the packer may use at most `budget − budget × ratio` whole tokens.
            let reserve =
                (request.token_budget as f64 * self.packing.aggregate_reserve_ratio).ceil() as usize;
            (aggregates, reserve)
        } else {
            (Vec::new(), 0)
        };

        // Summaries count against the item cap like any other snippet.
        let cap = request.max_items.min(original_count);
        let packed = pack::pack(
            scored,
            request.token_budget,
            cap.saturating_sub(aggregates.len()),
            reserve,
            &self.packing,
        );

        let aggregate_count = aggregates.len();
        let mut combined = aggregates;
        combined.extend(packed);
        combined.truncate(cap);
        let selected = trim::trim(combined, request.token_budget);

        let card = ContextCard::new(
            request.query.clone(),
            selected,
            original_count,
            request.token_budget,
            STRATEGY_NAME,
            now,
        );
        info!(
            query = %request.query,
            original = original_count,
            included = card.metadata.included_count,
            aggregates = aggregate_count,
            total_tokens = card.total_tokens,
            token_budget = request.token_budget,
            "Context card packed"
        );
        Ok(card)
    }
}

/// Pack `records` with default heuristics. Never fails.
pub fn pack_context(records: &[Record], request: &ContextRequest) -> ContextCard {
    ContextEngine::default().pack(records, request)
}

/// Pack `records` with default heuristics, surfacing failures.
pub fn try_pack_context(
    records: &[Record],
    request: &ContextRequest,
) -> Result<ContextCard, ContextError> {
    ContextEngine::default().try_pack_at(records, request, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use finctx_core::snippet::SnippetKind;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn starbucks() -> Record {
        Record::from(json!({
            "amount": 45.50,
            "date": "2024-01-01",
            "merchant_name": "Starbucks",
            "category": ["Food and Drink", "Coffee"]
        }))
    }

    fn mixed_records() -> Vec<Record> {
        vec![
            starbucks(),
            Record::from(json!({"amount": 1200, "date": "2024-06-10", "merchant_name": "Delta", "category": ["Travel"]})),
            Record::from(json!({"amount": -3000, "date": "2024-06-01", "description": "Payroll"})),
            Record::from(json!({"name": "Plaid Checking", "mask": "0000", "type": "depository", "balance_current": 110})),
            Record::from(json!({"symbol": "AAPL", "quantity": 10, "security_name": "Apple Inc.", "institution_value": 1895.3})),
            Record::from(json!({"symbol": "BTC", "quantity": 0.5, "market_value": 30000, "unrealized_pnl": 500})),
            Record::from(json!({"note": "free-form"})),
        ]
    }

    /// 10 words of merchant name: 15 words per snippet, 20 tokens.
    fn long_transaction(i: usize) -> Record {
        Record::from(json!({
            "id": format!("tx_{i}"),
            "amount": 20 + i,
            "date": "2024-01-01",
            "merchant_name": "coffee shop corner store main street plaza downtown branch location",
        }))
    }

    #[test]
    fn empty_records_give_empty_card() {
        let card = ContextEngine::default()
            .pack_at(&[], &ContextRequest::new("anything", 500), now());
        assert!(card.snippets.is_empty());
        assert_eq!(card.total_tokens, 0);
        assert_eq!(card.compression_ratio, 0.0);
        assert_eq!(card.metadata.strategy_name, STRATEGY_NAME);
    }

    #[test]
    fn starbucks_snippet_text() {
        let request = ContextRequest::new("starbucks", 500).with_aggregates(false);
        let card = ContextEngine::default().pack_at(&[starbucks()], &request, now());
        assert_eq!(card.snippets.len(), 1);
        assert_eq!(
            card.snippets[0].text,
            "$45.50 at Starbucks (Food and Drink) on 2024-01-01"
        );
        assert_eq!(card.total_tokens, 11);
        assert_eq!(card.compression_ratio, 1.0);
    }

    #[test]
    fn budget_and_item_invariants_hold() {
        let records = mixed_records();
        let engine = ContextEngine::default();
        for budget in [100, 150, 400, 4000] {
            for max_items in [1, 2, 3, 50, 100] {
                for aggregates in [true, false] {
                    let request = ContextRequest::new("travel coffee", budget)
                        .with_max_items(max_items)
                        .with_aggregates(aggregates);
                    let card = engine.pack_at(&records, &request, now());
                    assert!(card.total_tokens <= budget);
                    assert!(card.metadata.included_count <= max_items.min(records.len()));
                    assert_eq!(card.metadata.included_count, card.snippets.len());
                    assert_eq!(
                        card.total_tokens,
                        card.snippets.iter().map(|s| s.token_count).sum::<usize>()
                    );
                }
            }
        }
    }

    #[test]
    fn packing_is_idempotent() {
        let records = mixed_records();
        let request = ContextRequest::new("apple travel", 300);
        let engine = ContextEngine::default();
        let first = engine.pack_at(&records, &request, now());
        let second = engine.pack_at(&records, &request, now());
        assert_eq!(first, second);
    }

    #[test]
    fn hard_budget_stop_on_large_input() {
        let records: Vec<Record> = (0..1000).map(long_transaction).collect();
        for aggregates in [true, false] {
            let request = ContextRequest::new("coffee shop", 100).with_aggregates(aggregates);
            let card = ContextEngine::default().pack_at(&records, &request, now());
            assert!(card.metadata.included_count <= 5);
            assert!(card.total_tokens <= 100);
            assert!(!card.is_empty());
        }
    }

    #[test]
    fn fractional_reserve_rounds_available_budget_down() {
        // budget 105: reserve 31.5, so the packer may spend 73 tokens, not 74
        let words = |n: usize| vec!["zeta"; n].join(" ");
        let records = vec![
            Record::from(json!({"amount": 5, "date": "2024-01-01", "merchant_name": "Shop"})),
            Record::from(json!({"note": words(28)})),
            Record::from(json!({"note": words(26)})),
        ];
        let card = ContextEngine::default().pack_at(
            &records,
            &ContextRequest::new("zeta", 105),
            now(),
        );
        let tokens: Vec<usize> = card.snippets.iter().map(|s| s.token_count).collect();
        // summary (11) then the 38-token note; 38 + 36 = 74 > 73 stops the pack
        assert_eq!(tokens, vec![11, 38]);
        assert_eq!(card.total_tokens, 49);
    }

    #[test]
    fn invalid_budget_yields_error_card() {
        let records = mixed_records();
        let request = ContextRequest::new("coffee", 50);
        let card = ContextEngine::default().pack_at(&records, &request, now());
        assert!(card.snippets.is_empty());
        assert_eq!(card.metadata.strategy_name, ERROR_STRATEGY);
        assert_eq!(card.metadata.original_count, records.len());
        assert_eq!(card.metadata.token_budget, 50);

        let err = ContextEngine::default()
            .try_pack_at(&records, &request, now())
            .unwrap_err();
        assert_eq!(
            err,
            ContextError::InvalidTokenBudget {
                budget: 50,
                min: MIN_TOKEN_BUDGET,
                max: MAX_TOKEN_BUDGET
            }
        );
    }

    #[test]
    fn try_pack_context_surfaces_errors() {
        let records = mixed_records();
        let err = try_pack_context(&records, &ContextRequest::new("coffee", 5000)).unwrap_err();
        assert!(matches!(err, ContextError::InvalidTokenBudget { budget: 5000, .. }));

        let card = try_pack_context(&records, &ContextRequest::new("starbucks", 500)).unwrap();
        assert_eq!(card.metadata.strategy_name, STRATEGY_NAME);
        assert_eq!(card.metadata.original_count, records.len());
        assert!(card.total_tokens <= 500);

        let overflow = vec![
            Record::from(json!({"amount": 1.0e308, "date": "2024-01-01"})),
            Record::from(json!({"amount": 1.0e308, "date": "2024-01-02"})),
        ];
        let err = try_pack_context(&overflow, &ContextRequest::new("q", 500)).unwrap_err();
        assert!(matches!(err, ContextError::NonFinite(_)));
        let card = pack_context(&overflow, &ContextRequest::new("q", 500));
        assert_eq!(card.metadata.strategy_name, ERROR_STRATEGY);
    }

    #[test]
    fn invalid_max_items_is_rejected() {
        let request = ContextRequest::new("coffee", 500).with_max_items(0);
        assert!(matches!(
            request.validate(),
            Err(ContextError::InvalidMaxItems { max_items: 0, .. })
        ));
        let request = ContextRequest::new("coffee", 500).with_max_items(101);
        assert!(request.validate().is_err());
    }

    #[test]
    fn summary_leads_the_card() {
        let card = ContextEngine::default().pack_at(
            &mixed_records(),
            &ContextRequest::new("coffee", 1000),
            now(),
        );
        assert_eq!(card.snippets[0].kind, SnippetKind::Summary);
        assert!(card.snippets[0].text.starts_with("Summary: $1245.50 spent, $3000.00 income"));
    }

    #[test]
    fn summary_counts_against_item_cap() {
        let request = ContextRequest::new("coffee", 1000).with_max_items(2);
        let card = ContextEngine::default().pack_at(&mixed_records(), &request, now());
        assert_eq!(card.snippets.len(), 2);
        assert_eq!(card.snippets[0].kind, SnippetKind::Summary);
    }

    #[test]
    fn no_summary_without_transactions() {
        let records = vec![Record::from(json!({"name": "Savings", "balance_current": 10}))];
        let card = ContextEngine::default().pack_at(&records, &ContextRequest::new("savings", 500), now());
        assert_eq!(card.snippets.len(), 1);
        assert_eq!(card.snippets[0].kind, SnippetKind::Account);
    }

    #[test]
    fn compression_ratio_reflects_selection() {
        let records: Vec<Record> = (0..10).map(long_transaction).collect();
        let request = ContextRequest::new("coffee", 100).with_aggregates(false);
        let card = ContextEngine::default().pack_at(&records, &request, now());
        let expected = card.metadata.included_count as f64 / 10.0;
        assert_eq!(card.compression_ratio, expected);
        assert!(card.compression_ratio < 1.0);
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let request: ContextRequest =
            serde_json::from_value(json!({"query": "q", "token_budget": 300})).unwrap();
        assert_eq!(request.max_items, 50);
        assert!(request.include_aggregates);
    }
}
