//! Evidence package types.
//!
//! An evidence package traces every displayed fact back to the record it
//! came from. Items are references (table, id, field names), never copies
//! of the data itself.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Table a record was read from, inferred from its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTable {
    Transactions,
    InvestmentTransactions,
    Accounts,
    Holdings,
    CryptoPositions,
    CryptoOrders,
    Unknown,
}

impl SourceTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::InvestmentTransactions => "investment_transactions",
            Self::Accounts => "accounts",
            Self::Holdings => "holdings",
            Self::CryptoPositions => "crypto_positions",
            Self::CryptoOrders => "crypto_orders",
            Self::Unknown => "unknown",
        }
    }

    /// Canonical column names for this table, in display order.
    pub fn canonical_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Transactions => &[
                "id",
                "transaction_id",
                "account_id",
                "date",
                "amount",
                "merchant_name",
                "description",
                "category",
                "is_pending",
            ],
            Self::InvestmentTransactions => &[
                "id",
                "account_id",
                "date",
                "name",
                "quantity",
                "amount",
                "price",
                "fees",
                "type",
                "symbol",
                "security_name",
            ],
            Self::Accounts => &[
                "id",
                "account_id",
                "name",
                "mask",
                "type",
                "subtype",
                "balance_current",
                "balance_available",
                "balance_limit",
                "currency",
            ],
            Self::Holdings => &[
                "id",
                "account_id",
                "symbol",
                "security_name",
                "quantity",
                "institution_price",
                "institution_value",
                "cost_basis",
            ],
            Self::CryptoPositions => &[
                "id",
                "symbol",
                "name",
                "quantity",
                "average_price",
                "market_value",
                "cost_basis",
                "unrealized_pnl",
                "last_price",
            ],
            Self::CryptoOrders => &[
                "id",
                "symbol",
                "side",
                "quantity",
                "order_type",
                "price",
                "status",
                "filled_quantity",
                "average_fill_price",
                "placed_at",
            ],
            Self::Unknown => &[],
        }
    }
}

impl std::fmt::Display for SourceTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where one displayed fact came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub source_table: SourceTable,
    pub source_id: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationOp {
    Sum,
    Count,
    Avg,
    Max,
    Min,
}

impl AggregationOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Count => "count",
            Self::Avg => "avg",
            Self::Max => "max",
            Self::Min => "min",
        }
    }
}

/// A computed aggregate and the sample it was computed over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRecord {
    pub source_table: SourceTable,
    pub operation: AggregationOp,
    pub field: String,
    pub value: f64,
    pub sample_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,
}

/// A named upstream source and how fresh its data is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageSource {
    pub name: String,
    pub source_type: String,
    pub freshness: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataLineage {
    pub sources: Vec<LineageSource>,
    pub transformations: Vec<String>,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceMetadata {
    pub total_records: usize,
    pub distinct_source_tables: BTreeSet<SourceTable>,
    pub confidence_score: f64,
    pub generated_at: DateTime<Utc>,
    pub tool_name: String,
}

/// Provenance for one tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidencePackage {
    pub query_description: String,
    pub items: Vec<EvidenceItem>,
    pub aggregations: Vec<AggregationRecord>,
    pub lineage: DataLineage,
    pub metadata: EvidenceMetadata,
}

impl EvidencePackage {
    /// An empty but valid package: zero records, zero confidence.
    pub fn minimal(tool_name: impl Into<String>, generated_at: DateTime<Utc>) -> Self {
        let tool_name = tool_name.into();
        Self {
            query_description: format!("{tool_name}: no evidence available"),
            items: Vec::new(),
            aggregations: Vec::new(),
            lineage: DataLineage::default(),
            metadata: EvidenceMetadata {
                total_records: 0,
                distinct_source_tables: BTreeSet::new(),
                confidence_score: 0.0,
                generated_at,
                tool_name,
            },
        }
    }
}

/// Metadata about the tool call the evidence is attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub tool_name: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
}

impl Invocation {
    pub fn new(tool_name: impl Into<String>, user_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            tool_name: tool_name.into(),
            user_id: user_id.into(),
            timestamp,
        }
    }
}
