//! Evidence builder — provenance items, aggregations and confidence.
//!
//! # Confidence
//!
//! | Signal | Share |
//! |--------|-------|
//! | at least one evidence item | 0.4 |
//! | more than one distinct source table | 0.2 |
//! | at least one aggregation | 0.2 |
//! | invocation within the recency window (default 1 h) | 0.2 |
//!
//! Capped at 1.0. A package without items scores zero: there is nothing
//! for the recency share to vouch for.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use finctx_config::{AppConfig, EvidenceConfig};
use finctx_core::error::EvidenceError;
use finctx_core::evidence::{
    AggregationOp, AggregationRecord, EvidenceItem, EvidenceMetadata, EvidencePackage, Invocation,
    SourceTable,
};
use finctx_core::record::{Record, RecordShape};
use finctx_core::spending::SpendingSummary;
use tracing::{debug, info, warn};

use crate::lineage::derive_lineage;

/// Keys listed for a record that matches none of its table's canonical fields.
const FALLBACK_FIELD_LIMIT: usize = 5;

const ITEM_SHARE: f64 = 0.4;
const MULTI_TABLE_SHARE: f64 = 0.2;
const AGGREGATION_SHARE: f64 = 0.2;
const RECENCY_SHARE: f64 = 0.2;

#[derive(Debug, Clone, Default)]
pub struct EvidenceBuilder {
    config: EvidenceConfig,
}

impl EvidenceBuilder {
    pub fn new(config: EvidenceConfig) -> Self {
        Self { config }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.evidence.clone())
    }

    /// Build evidence as of the current time. Never fails.
    pub fn build(&self, records: &[Record], invocation: &Invocation) -> EvidencePackage {
        self.build_at(records, invocation, Utc::now())
    }

    /// Build evidence as of `now`. Failures yield a minimal package.
    pub fn build_at(
        &self,
        records: &[Record],
        invocation: &Invocation,
        now: DateTime<Utc>,
    ) -> EvidencePackage {
        match self.try_build_at(records, invocation, now) {
            Ok(package) => package,
            Err(e) => {
                warn!(
                    error = %e,
                    tool = %invocation.tool_name,
                    records = records.len(),
                    "Evidence build failed, returning minimal package"
                );
                EvidencePackage::minimal(invocation.tool_name.clone(), now)
            }
        }
    }

    pub fn try_build_at(
        &self,
        records: &[Record],
        invocation: &Invocation,
        now: DateTime<Utc>,
    ) -> Result<EvidencePackage, EvidenceError> {
        if invocation.tool_name.trim().is_empty() {
            return Err(EvidenceError::MissingToolName);
        }

        let items: Vec<EvidenceItem> = records.iter().map(evidence_item).collect();
        let tables: BTreeSet<SourceTable> = items.iter().map(|i| i.source_table).collect();
        let aggregations = aggregate(records)?;
        let lineage = derive_lineage(records, invocation.timestamp);

        let mut confidence = 0.0;
        if !items.is_empty() {
            confidence += ITEM_SHARE;
            if tables.len() > 1 {
                confidence += MULTI_TABLE_SHARE;
            }
            if !aggregations.is_empty() {
                confidence += AGGREGATION_SHARE;
            }
            let age = (now - invocation.timestamp).num_seconds().abs();
            if age <= self.config.recency_window_secs {
                confidence += RECENCY_SHARE;
            }
        }
        let confidence = f64::min(confidence, 1.0);

        debug!(
            items = items.len(),
            tables = tables.len(),
            aggregations = aggregations.len(),
            "Evidence assembled"
        );
        info!(
            tool = %invocation.tool_name,
            user = %invocation.user_id,
            records = records.len(),
            confidence,
            "Evidence package built"
        );

        Ok(EvidencePackage {
            query_description: describe(invocation, records.len(), &tables),
            items,
            aggregations,
            lineage,
            metadata: EvidenceMetadata {
                total_records: records.len(),
                distinct_source_tables: tables,
                confidence_score: confidence,
                generated_at: now,
                tool_name: invocation.tool_name.clone(),
            },
        })
    }
}

/// Build evidence with default settings. Never fails.
pub fn build_evidence(records: &[Record], invocation: &Invocation) -> EvidencePackage {
    EvidenceBuilder::default().build(records, invocation)
}

pub fn try_build_evidence(
    records: &[Record],
    invocation: &Invocation,
) -> Result<EvidencePackage, EvidenceError> {
    EvidenceBuilder::default().try_build_at(records, invocation, Utc::now())
}

// ── Items ─────────────────────────────────────────────────────────────────

fn evidence_item(record: &Record) -> EvidenceItem {
    let source_table = record.source_table();
    let mut fields: Vec<String> = source_table
        .canonical_fields()
        .iter()
        .filter_map(|f| record.present_key(f))
        .collect();
    if fields.is_empty() {
        fields = record
            .fields()
            .keys()
            .take(FALLBACK_FIELD_LIMIT)
            .cloned()
            .collect();
    }
    EvidenceItem {
        source_table,
        source_id: record.source_id().unwrap_or_else(|| "unknown".into()),
        fields,
    }
}

// ── Aggregations ──────────────────────────────────────────────────────────

fn aggregate(records: &[Record]) -> Result<Vec<AggregationRecord>, EvidenceError> {
    let mut out = Vec::new();

    let transactions: Vec<&Record> = records
        .iter()
        .filter(|r| r.shape() == RecordShape::Transaction)
        .collect();
    if !transactions.is_empty() {
        let table = if transactions
            .iter()
            .all(|r| r.source_table() == SourceTable::InvestmentTransactions)
        {
            SourceTable::InvestmentTransactions
        } else {
            SourceTable::Transactions
        };
        let total: f64 = transactions
            .iter()
            .map(|r| r.number("amount").unwrap_or(0.0).abs())
            .sum();
        out.push(checked(AggregationRecord {
            source_table: table,
            operation: AggregationOp::Sum,
            field: "amount".into(),
            value: total,
            sample_count: transactions.len(),
            group_key: None,
        })?);

        for category in SpendingSummary::from_records(records).categories {
            out.push(AggregationRecord {
                source_table: table,
                operation: AggregationOp::Count,
                field: "category".into(),
                value: category.transaction_count as f64,
                sample_count: category.transaction_count,
                group_key: Some(category.category),
            });
        }
    }

    let positions: Vec<&Record> = records
        .iter()
        .filter(|r| matches!(r.shape(), RecordShape::Holding | RecordShape::Position))
        .collect();
    if !positions.is_empty() {
        let table = if positions.iter().all(|r| r.shape() == RecordShape::Position) {
            SourceTable::CryptoPositions
        } else {
            SourceTable::Holdings
        };
        let total: f64 = positions
            .iter()
            .map(|r| r.position_value().unwrap_or(0.0))
            .sum();
        out.push(checked(AggregationRecord {
            source_table: table,
            operation: AggregationOp::Sum,
            field: "value".into(),
            value: total,
            sample_count: positions.len(),
            group_key: None,
        })?);
    }

    Ok(out)
}

fn checked(record: AggregationRecord) -> Result<AggregationRecord, EvidenceError> {
    if record.value.is_finite() {
        Ok(record)
    } else {
        Err(EvidenceError::NonFiniteAggregate {
            operation: record.operation.as_str().into(),
            field: record.field,
        })
    }
}

fn describe(invocation: &Invocation, count: usize, tables: &BTreeSet<SourceTable>) -> String {
    if count == 0 {
        return format!("{}: no records for user {}", invocation.tool_name, invocation.user_id);
    }
    let tables: Vec<&str> = tables.iter().map(SourceTable::as_str).collect();
    format!(
        "{}: {} records for user {} from {}",
        invocation.tool_name,
        count,
        invocation.user_id,
        tables.join(", ")
    )
}
