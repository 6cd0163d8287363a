use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quotation::Quotation;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteRecordId(pub String);

impl QuoteRecordId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuoteRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position in the store's lifetime sequence. Never reused, even after the
/// record holding it is deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteNumber(pub u64);

impl QuoteNumber {
    /// Human label, e.g. `SC-000042`.
    pub fn label(&self, prefix: &str) -> String {
        format!("{prefix}-{:06}", self.0)
    }
}

impl fmt::Display for QuoteNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// List view of a stored quotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSummary {
    pub id: QuoteRecordId,
    pub quote_number: QuoteNumber,
    pub client: String,
    /// Creation time, epoch seconds.
    pub date: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// A stored quotation with everything needed to resume editing it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub id: QuoteRecordId,
    pub quote_number: QuoteNumber,
    pub client: String,
    pub date: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(flatten)]
    pub quotation: Quotation,
}

impl QuoteRecord {
    pub fn summary(&self) -> QuoteSummary {
        QuoteSummary {
            id: self.id.clone(),
            quote_number: self.quote_number,
            client: self.client.clone(),
            date: self.date,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{QuoteNumber, QuoteRecord, QuoteRecordId};
    use crate::domain::quotation::{Client, LineItem, Quotation};

    #[test]
    fn quote_number_label_is_zero_padded() {
        assert_eq!(QuoteNumber(42).label("SC"), "SC-000042");
        assert_eq!(QuoteNumber(1_234_567).label("SC"), "SC-1234567");
    }

    #[test]
    fn record_serializes_flat_for_resume_editing() {
        let quotation = Quotation::generate(
            Client { client_name: Some("Asha".to_string()), ..Client::default() },
            vec![LineItem::new("Basin", "1000")],
            Decimal::ZERO,
            Decimal::from(18),
        )
        .expect("quotation");
        let record = QuoteRecord {
            id: QuoteRecordId("rec-1".to_string()),
            quote_number: QuoteNumber(7),
            client: "Asha".to_string(),
            date: 1_700_000_000,
            total: quotation.totals.grand_total,
            quotation,
        };

        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["id"], "rec-1");
        assert_eq!(value["quote_number"], 7);
        assert_eq!(value["client_name"], "Asha");
        assert_eq!(value["gst_rate"], 18.0);
        assert_eq!(value["grand_total"], 1180.0);
        assert_eq!(value["items"][0]["price"], 1000);

        let restored: QuoteRecord = serde_json::from_value(value).expect("deserialize");
        assert_eq!(restored.summary().total, Decimal::from(1180));
        assert_eq!(restored.quotation.items[0].name, "Basin");
    }
}
