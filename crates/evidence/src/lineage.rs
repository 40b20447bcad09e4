//! Data lineage derivation.
//!
//! Every package names the database the records were read from. Crypto
//! and investment records add the upstream API they were synced from and
//! the calculations applied on the way.

use chrono::{DateTime, Utc};
use finctx_core::evidence::{DataLineage, LineageSource};
use finctx_core::record::Record;

pub const DATABASE_SOURCE: &str = "financial_db";
pub const CRYPTO_API: &str = "robinhood_crypto_api";
pub const BANKING_API: &str = "plaid_api";

/// Timestamp fields that say when a row was last synced.
const FRESHNESS_FIELDS: &[&str] = &["last_refresh", "updated_at", "placed_at"];

/// Lineage for `records` fetched for an invocation at `invoked_at`.
pub fn derive_lineage(records: &[Record], invoked_at: DateTime<Utc>) -> DataLineage {
    let mut lineage = DataLineage {
        sources: vec![LineageSource {
            name: DATABASE_SOURCE.into(),
            source_type: "database".into(),
            freshness: freshness(records).unwrap_or(invoked_at),
        }],
        ..DataLineage::default()
    };

    if records.iter().any(Record::is_crypto_related) {
        add_api(&mut lineage, CRYPTO_API, invoked_at);
        lineage
            .transformations
            .extend(["price_calculation".to_string(), "pnl_calculation".to_string()]);
    }
    if records.iter().any(Record::is_investment_related) {
        add_api(&mut lineage, BANKING_API, invoked_at);
        lineage
            .transformations
            .extend(["valuation".to_string(), "performance_metrics".to_string()]);
    }
    lineage
}

fn add_api(lineage: &mut DataLineage, name: &str, invoked_at: DateTime<Utc>) {
    lineage.sources.push(LineageSource {
        name: name.into(),
        source_type: "api".into(),
        freshness: invoked_at,
    });
    lineage.dependencies.push(name.into());
}

/// Newest sync timestamp across all records.
fn freshness(records: &[Record]) -> Option<DateTime<Utc>> {
    records
        .iter()
        .flat_map(|r| FRESHNESS_FIELDS.iter().filter_map(|f| r.timestamp(f)))
        .max()
}
