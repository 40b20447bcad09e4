//! Records — loosely-typed financial facts and the shape classifier.
//!
//! Records arrive from whatever the data-access layer produced: bank
//! transactions, account balances, brokerage holdings, crypto positions or
//! orders. Nothing about their identity is assumed. The classifier maps a
//! record onto a closed set of shapes by looking at which fields are present,
//! and both the snippet normalizer and the evidence builder dispatch on it.
//!
//! # Field lookup
//!
//! Lookups take the canonical snake_case key and fall back to its camelCase
//! spelling (`merchant_name` → `merchantName`). A field counts as present
//! only when its value is not JSON `null`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::evidence::SourceTable;

/// Crypto symbols supported by the brokerage integration.
const CRYPTO_SYMBOLS: &[&str] = &[
    "BTC", "ETH", "DOGE", "LTC", "BCH", "ETC", "BSV", "ADA", "XRP", "SOL", "MATIC", "AVAX", "DOT",
    "LINK", "UNI", "ALGO", "ATOM", "XLM", "COMP", "AAVE",
];

/// Fields only crypto positions and orders carry.
const POSITION_FIELDS: &[&str] = &[
    "unrealized_pnl",
    "average_price",
    "market_value",
    "last_price",
    "side",
];

/// Fields that mark a transaction as an investment transaction.
const INVESTMENT_TRANSACTION_FIELDS: &[&str] = &["symbol", "security_name", "quantity", "price", "fees"];

/// Fields that mark a record as coming from a brokerage feed.
const INVESTMENT_FIELDS: &[&str] = &["security_name", "cusip", "institution_value"];

/// A single untyped financial record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

/// The closed set of record shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordShape {
    Transaction,
    Account,
    Holding,
    Position,
    Generic,
}

impl RecordShape {
    /// Classify a record by the fields it carries.
    ///
    /// Checked in order: `amount` + `date` is a transaction; a current or
    /// available balance is an account; `quantity` + `symbol` is a holding,
    /// or a position when crypto position/order fields are present.
    pub fn classify(record: &Record) -> Self {
        if record.has("amount") && record.has("date") {
            Self::Transaction
        } else if record.has_any(&["balance_current", "balance_available"]) {
            Self::Account
        } else if record.has("quantity") && record.has("symbol") {
            if record.has_any(POSITION_FIELDS) {
                Self::Position
            } else {
                Self::Holding
            }
        } else {
            Self::Generic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::Account => "account",
            Self::Holding => "holding",
            Self::Position => "position",
            Self::Generic => "generic",
        }
    }
}

impl std::fmt::Display for RecordShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Raw fields in insertion order.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a field, falling back to its camelCase spelling. Nulls are absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0
            .get(key)
            .filter(|v| !v.is_null())
            .or_else(|| {
                camel_case(key)
                    .and_then(|alt| self.0.get(alt.as_str()))
                    .filter(|v| !v.is_null())
            })
    }

    /// The key that actually carries `key` on this record: itself or its camelCase spelling.
    pub fn present_key(&self, key: &str) -> Option<String> {
        let carries = |k: &str| self.0.get(k).is_some_and(|v| !v.is_null());
        if carries(key) {
            return Some(key.to_string());
        }
        camel_case(key).filter(|alt| carries(alt.as_str()))
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn has_any(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.has(k))
    }

    /// A field rendered as text: non-empty strings, numbers and booleans.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// First of `keys` that renders as text.
    pub fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.text(k))
    }

    /// A finite numeric field. Numeric strings are accepted.
    pub fn number(&self, key: &str) -> Option<f64> {
        let value = match self.get(key)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }

    /// First of `keys` that parses as a finite number.
    pub fn first_number(&self, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|k| self.number(k))
    }

    /// Primary category: the first element of a `category` array, or a plain string.
    pub fn primary_category(&self) -> Option<String> {
        match self.get("category")? {
            Value::Array(items) => items.iter().find_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                _ => None,
            }),
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// A field parsed as a timestamp (RFC 3339, naive datetime or `YYYY-MM-DD`).
    pub fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.get(key)? {
            Value::String(s) => parse_timestamp(s),
            _ => None,
        }
    }

    pub fn shape(&self) -> RecordShape {
        RecordShape::classify(self)
    }

    /// Identifier of the record in its source table, if it carries one.
    pub fn source_id(&self) -> Option<String> {
        let keys: &[&str] = match self.shape() {
            RecordShape::Transaction => &["id", "transaction_id"],
            RecordShape::Account => &["id", "account_id"],
            RecordShape::Position => &["id", "order_id"],
            RecordShape::Holding | RecordShape::Generic => &["id"],
        };
        self.first_text(keys)
    }

    /// The table this record was most likely read from.
    pub fn source_table(&self) -> SourceTable {
        match self.shape() {
            RecordShape::Transaction if self.has_any(INVESTMENT_TRANSACTION_FIELDS) => {
                SourceTable::InvestmentTransactions
            }
            RecordShape::Transaction => SourceTable::Transactions,
            RecordShape::Account => SourceTable::Accounts,
            RecordShape::Holding => SourceTable::Holdings,
            RecordShape::Position if self.has("side") => SourceTable::CryptoOrders,
            RecordShape::Position => SourceTable::CryptoPositions,
            RecordShape::Generic => SourceTable::Unknown,
        }
    }

    pub fn is_crypto_related(&self) -> bool {
        if matches!(
            self.source_table(),
            SourceTable::CryptoPositions | SourceTable::CryptoOrders
        ) {
            return true;
        }
        self.text("symbol")
            .map(|s| CRYPTO_SYMBOLS.contains(&s.trim().to_uppercase().as_str()))
            .unwrap_or(false)
    }

    pub fn is_investment_related(&self) -> bool {
        matches!(
            self.source_table(),
            SourceTable::Holdings | SourceTable::InvestmentTransactions
        ) || self.has_any(INVESTMENT_FIELDS)
    }

    /// Market value of a holding or position: the reported value, else quantity × price.
    pub fn position_value(&self) -> Option<f64> {
        self.first_number(&["institution_value", "market_value", "value"])
            .or_else(|| {
                let price = self.first_number(&["institution_price", "last_price", "price"])?;
                Some(self.number("quantity")? * price)
            })
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Any JSON value becomes a record; scalars are wrapped under `value`.
impl From<Value> for Record {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self(fields),
            Value::Null => Self::default(),
            other => {
                let mut fields = Map::new();
                fields.insert("value".into(), other);
                Self(fields)
            }
        }
    }
}

/// Parse a timestamp as produced by the data sources.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `balance_current` → `balanceCurrent`. `None` when there is nothing to convert.
fn camel_case(key: &str) -> Option<String> {
    if !key.contains('_') {
        return None;
    }
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from(value)
    }

    #[test]
    fn amount_and_date_is_transaction() {
        let r = record(json!({"amount": 12.5, "date": "2024-01-01"}));
        assert_eq!(r.shape(), RecordShape::Transaction);
        assert_eq!(r.source_table(), SourceTable::Transactions);
    }

    #[test]
    fn balance_is_account() {
        let r = record(json!({"name": "Checking", "balance_available": 10}));
        assert_eq!(r.shape(), RecordShape::Account);
        assert_eq!(r.source_table(), SourceTable::Accounts);
    }

    #[test]
    fn quantity_and_symbol_is_holding() {
        let r = record(json!({"symbol": "AAPL", "quantity": 3, "security_name": "Apple Inc"}));
        assert_eq!(r.shape(), RecordShape::Holding);
        assert!(r.is_investment_related());
        assert!(!r.is_crypto_related());
    }

    #[test]
    fn crypto_fields_make_a_position() {
        let r = record(json!({"symbol": "BTC", "quantity": 0.5, "unrealized_pnl": 120.0}));
        assert_eq!(r.shape(), RecordShape::Position);
        assert_eq!(r.source_table(), SourceTable::CryptoPositions);
        assert!(r.is_crypto_related());
    }

    #[test]
    fn order_side_makes_a_crypto_order() {
        let r = record(json!({"symbol": "ETH", "quantity": 1, "side": "buy", "status": "filled"}));
        assert_eq!(r.source_table(), SourceTable::CryptoOrders);
    }

    #[test]
    fn transaction_with_symbol_is_investment_transaction() {
        let r = record(json!({"amount": 500, "date": "2024-03-01", "symbol": "VTI", "quantity": 2}));
        assert_eq!(r.shape(), RecordShape::Transaction);
        assert_eq!(r.source_table(), SourceTable::InvestmentTransactions);
        assert!(r.is_investment_related());
    }

    #[test]
    fn unknown_shape_is_generic() {
        let r = record(json!({"foo": "bar"}));
        assert_eq!(r.shape(), RecordShape::Generic);
        assert_eq!(r.source_table(), SourceTable::Unknown);
    }

    #[test]
    fn null_fields_are_absent() {
        let r = record(json!({"amount": null, "date": "2024-01-01"}));
        assert_eq!(r.shape(), RecordShape::Generic);
    }

    #[test]
    fn camel_case_fallback() {
        let r = record(json!({"balanceCurrent": 42.0, "merchantName": "Shell"}));
        assert_eq!(r.shape(), RecordShape::Account);
        assert_eq!(r.text("merchant_name").as_deref(), Some("Shell"));
        assert_eq!(r.number("balance_current"), Some(42.0));
    }

    #[test]
    fn numeric_strings_parse() {
        let r = record(json!({"amount": " 19.99 ", "bad": "abc"}));
        assert_eq!(r.number("amount"), Some(19.99));
        assert_eq!(r.number("bad"), None);
    }

    #[test]
    fn primary_category_from_array_or_string() {
        let a = record(json!({"category": ["Travel", "Airlines"]}));
        let b = record(json!({"category": "Groceries"}));
        let c = record(json!({"category": []}));
        assert_eq!(a.primary_category().as_deref(), Some("Travel"));
        assert_eq!(b.primary_category().as_deref(), Some("Groceries"));
        assert_eq!(c.primary_category(), None);
    }

    #[test]
    fn source_id_depends_on_shape() {
        let txn = record(json!({"transaction_id": "tx_1", "account_id": "acc_9", "amount": 1, "date": "2024-01-01"}));
        let acct = record(json!({"account_id": "acc_9", "balance_current": 1}));
        assert_eq!(txn.source_id().as_deref(), Some("tx_1"));
        assert_eq!(acct.source_id().as_deref(), Some("acc_9"));
    }

    #[test]
    fn scalar_values_become_records() {
        let r = Record::from(json!(7));
        assert_eq!(r.number("value"), Some(7.0));
        assert!(Record::from(Value::Null).is_empty());
    }

    #[test]
    fn timestamps_in_several_formats() {
        assert!(parse_timestamp("2024-01-01").is_some());
        assert!(parse_timestamp("2024-01-01T10:30:00Z").is_some());
        assert!(parse_timestamp("2024-01-01T10:30:00").is_some());
        assert!(parse_timestamp("2024-01-01T10:30:00.250").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn camel_case_conversion() {
        assert_eq!(camel_case("unrealized_pnl").as_deref(), Some("unrealizedPnl"));
        assert_eq!(camel_case("amount"), None);
    }

    #[test]
    fn position_value_prefers_reported_value() {
        let r = record(json!({"symbol": "AAPL", "quantity": 2, "institution_value": 380, "institution_price": 1}));
        assert_eq!(r.position_value(), Some(380.0));
        let r = record(json!({"symbol": "ETH", "quantity": 2, "last_price": 1500}));
        assert_eq!(r.position_value(), Some(3000.0));
        let r = record(json!({"symbol": "ETH", "quantity": 2}));
        assert_eq!(r.position_value(), None);
    }

    #[test]
    fn present_key_names_the_spelling_used() {
        let r = record(json!({"merchantName": "Shell", "amount": 3, "date": null}));
        assert_eq!(r.present_key("merchant_name").as_deref(), Some("merchantName"));
        assert_eq!(r.present_key("amount").as_deref(), Some("amount"));
        assert_eq!(r.present_key("date"), None);
    }
}
