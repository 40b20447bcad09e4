//! Spending summary over transaction-like records.
//!
//! Amounts follow the bank-feed sign convention: positive is money spent,
//! negative is money received. Categories and merchants keep first-seen
//! order so the summary is a deterministic function of input order.

use serde::{Deserialize, Serialize};

use crate::record::{Record, RecordShape};

/// Label for transactions without a category.
pub const UNCATEGORIZED: &str = "Other";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    /// Money spent in this category.
    pub amount: f64,
    pub transaction_count: usize,
    /// Share of `total_spent`, 0–100.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantSummary {
    pub merchant: String,
    pub amount: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub start_date: String,
    pub end_date: String,
    pub days: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpendingSummary {
    pub total_spent: f64,
    pub total_income: f64,
    pub net_cash_flow: f64,
    pub transaction_count: usize,
    pub categories: Vec<CategorySummary>,
    pub merchants: Vec<MerchantSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

impl SpendingSummary {
    /// Summarize the transaction-like records in `records`; everything else is ignored.
    pub fn from_records(records: &[Record]) -> Self {
        let mut summary = Self::default();
        let mut first = None;
        let mut last = None;

        for record in records.iter().filter(|r| r.shape() == RecordShape::Transaction) {
            let amount = record.number("amount").unwrap_or(0.0);
            summary.transaction_count += 1;
            if amount > 0.0 {
                summary.total_spent += amount;
            } else {
                summary.total_income += amount.abs();
            }
            let spent = amount.max(0.0);

            let category = record
                .primary_category()
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            match summary.categories.iter_mut().find(|c| c.category == category) {
                Some(entry) => {
                    entry.amount += spent;
                    entry.transaction_count += 1;
                }
                None => summary.categories.push(CategorySummary {
                    category,
                    amount: spent,
                    transaction_count: 1,
                    percentage: 0.0,
                }),
            }

            if let Some(merchant) = record.first_text(&["merchant_name", "description"]) {
                match summary.merchants.iter_mut().find(|m| m.merchant == merchant) {
                    Some(entry) => {
                        entry.amount += spent;
                        entry.transaction_count += 1;
                    }
                    None => summary.merchants.push(MerchantSummary {
                        merchant,
                        amount: spent,
                        transaction_count: 1,
                    }),
                }
            }

            if let Some(ts) = record.timestamp("date") {
                if first.is_none_or(|f| ts < f) {
                    first = Some(ts);
                }
                if last.is_none_or(|l| ts > l) {
                    last = Some(ts);
                }
            }
        }

        summary.net_cash_flow = summary.total_income - summary.total_spent;
        if summary.total_spent > 0.0 {
            for c in &mut summary.categories {
                c.percentage = c.amount / summary.total_spent * 100.0;
            }
        }
        if let (Some(start), Some(end)) = (first, last) {
            summary.period = Some(Period {
                start_date: start.format("%Y-%m-%d").to_string(),
                end_date: end.format("%Y-%m-%d").to_string(),
                days: (end - start).num_days(),
            });
        }
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn txn(amount: f64, date: &str, merchant: &str, category: &str) -> Record {
        Record::from(json!({
            "amount": amount,
            "date": date,
            "merchant_name": merchant,
            "category": [category],
        }))
    }

    #[test]
    fn splits_spent_and_income() {
        let records = vec![
            txn(40.0, "2024-01-01", "Whole Foods", "Groceries"),
            txn(-2500.0, "2024-01-15", "ACME Payroll", "Income"),
            txn(10.0, "2024-01-20", "Whole Foods", "Groceries"),
        ];
        let s = SpendingSummary::from_records(&records);
        assert_eq!(s.transaction_count, 3);
        assert_eq!(s.total_spent, 50.0);
        assert_eq!(s.total_income, 2500.0);
        assert_eq!(s.net_cash_flow, 2450.0);
    }

    #[test]
    fn categories_keep_first_seen_order() {
        let records = vec![
            txn(30.0, "2024-01-01", "Shell", "Travel"),
            txn(10.0, "2024-01-02", "Trader Joe's", "Groceries"),
            txn(10.0, "2024-01-03", "Uber", "Travel"),
        ];
        let s = SpendingSummary::from_records(&records);
        let names: Vec<_> = s.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Travel", "Groceries"]);
        assert_eq!(s.categories[0].transaction_count, 2);
        assert!((s.categories[0].percentage - 80.0).abs() < 1e-9);
    }

    #[test]
    fn merchants_aggregate() {
        let records = vec![
            txn(5.0, "2024-01-01", "Starbucks", "Food and Drink"),
            txn(6.0, "2024-01-02", "Starbucks", "Food and Drink"),
        ];
        let s = SpendingSummary::from_records(&records);
        assert_eq!(s.merchants.len(), 1);
        assert_eq!(s.merchants[0].amount, 11.0);
        assert_eq!(s.merchants[0].transaction_count, 2);
    }

    #[test]
    fn period_spans_dates() {
        let records = vec![
            txn(5.0, "2024-01-10", "A", "X"),
            txn(5.0, "2024-01-01", "B", "X"),
        ];
        let period = SpendingSummary::from_records(&records).period.unwrap();
        assert_eq!(period.start_date, "2024-01-01");
        assert_eq!(period.end_date, "2024-01-10");
        assert_eq!(period.days, 9);
    }

    #[test]
    fn non_transactions_are_ignored() {
        let records = vec![Record::from(json!({"name": "Checking", "balance_current": 100}))];
        let s = SpendingSummary::from_records(&records);
        assert!(s.is_empty());
        assert!(s.period.is_none());
    }

    #[test]
    fn missing_category_is_other() {
        let records = vec![Record::from(json!({"amount": 3, "date": "2024-01-01"}))];
        let s = SpendingSummary::from_records(&records);
        assert_eq!(s.categories[0].category, UNCATEGORIZED);
    }
}
