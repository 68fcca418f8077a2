//! Rule-based transaction enrichment
//!
//! Guesses a merchant name from the description, rounds the amount to
//! cents and assigns a category from a small keyword table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_CURRENCY: &str = "BRL";
pub const DEFAULT_CATEGORY: &str = "Uncategorized";
pub const UNKNOWN_MERCHANT: &str = "Unknown";

/// Minimum run of letters/whitespace accepted as a merchant name
const MIN_MERCHANT_RUN: usize = 3;

/// (keywords, category), checked in order
const CATEGORY_RULES: &[(&[&str], &str)] = &[
    (&["uber", "99"], "Transport"),
    (&["mercado", "super", "market"], "Groceries"),
    (&["pix"], "Transfer"),
    (&["café", "cafeter", "coffee"], "Food & Drink"),
];

/// Transaction as accepted by `POST /enrich`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichInput {
    pub id: String,
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub amount: f64,
    #[serde(default = "default_category")]
    pub category: String,
    /// Unrecognized fields are echoed back untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl EnrichInput {
    /// Map an upstream transaction, filling the gaps
    ///
    /// `date` falls back to `today`, `currency` comes from `currencyCode`,
    /// and a non-numeric amount becomes 0.
    pub fn from_upstream(tx: &Value, today: NaiveDate) -> Self {
        let id = match tx.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        Self {
            id,
            date: tx
                .get("date")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
            description: tx
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            currency: tx
                .get("currencyCode")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_CURRENCY)
                .to_string(),
            amount: tx.get("amount").and_then(Value::as_f64).unwrap_or(0.0),
            category: default_category(),
            extra: Map::new(),
        }
    }

    pub fn enrich(self) -> EnrichedTransaction {
        let merchant = guess_merchant(&self.description);
        let normalized_amount = normalize_amount(self.amount);
        let inferred_category = infer_category(&self.description, self.amount).to_string();

        EnrichedTransaction {
            input: self,
            merchant,
            normalized_amount,
            inferred_category,
        }
    }
}

/// Body of `POST /enrich`
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichRequest {
    pub data: Vec<EnrichInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTransaction {
    #[serde(flatten)]
    pub input: EnrichInput,
    pub merchant: String,
    pub normalized_amount: f64,
    pub inferred_category: String,
}

pub fn enrich_all(data: Vec<EnrichInput>) -> Vec<EnrichedTransaction> {
    data.into_iter().map(EnrichInput::enrich).collect()
}

fn is_merchant_char(c: char) -> bool {
    c.is_ascii_alphabetic() || ('\u{C0}'..='\u{FF}').contains(&c) || c.is_whitespace()
}

/// First run of 3+ letters (ASCII or `À`-`ÿ`) and whitespace, trimmed
pub fn guess_merchant(description: &str) -> String {
    let mut run = String::new();
    let mut run_len = 0;

    for c in description.chars().chain(std::iter::once('\0')) {
        if is_merchant_char(c) {
            run.push(c);
            run_len += 1;
            continue;
        }

        if run_len >= MIN_MERCHANT_RUN {
            let trimmed = run.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
            break;
        }
        run.clear();
        run_len = 0;
    }

    UNKNOWN_MERCHANT.to_string()
}

pub fn infer_category(description: &str, amount: f64) -> &'static str {
    let lowered = description.to_lowercase();

    CATEGORY_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(_, category)| *category)
        .unwrap_or(if amount > 0.0 { "Income" } else { DEFAULT_CATEGORY })
}

/// Round to 2 decimal places
pub fn normalize_amount(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
