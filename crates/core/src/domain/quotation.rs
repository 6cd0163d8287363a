use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::FormNumber;
use crate::errors::DomainError;
use crate::pricing::{self, QuoteTotals};

/// GST slabs a quotation may be generated with.
pub const GST_RATES: [u32; 5] = [0, 5, 12, 18, 28];

pub const DEFAULT_GST_RATE: u32 = 18;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Client {
    pub fn name(&self) -> Option<&str> {
        present(&self.client_name)
    }

    pub fn mobile(&self) -> Option<&str> {
        present(&self.mobile)
    }

    pub fn email(&self) -> Option<&str> {
        present(&self.email)
    }

    pub fn company(&self) -> Option<&str> {
        present(&self.company)
    }

    pub fn gstin(&self) -> Option<&str> {
        present(&self.gst)
    }

    pub fn address(&self) -> Option<&str> {
        present(&self.address)
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

/// Editable quotation line. Numeric fields keep what the user typed; see
/// [`pricing::evaluate_line`] for how they are interpreted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: FormNumber,
    #[serde(default)]
    pub quantity: FormNumber,
    #[serde(default, rename = "discount", alias = "discountPercent")]
    pub discount_percent: FormNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, rename = "rawText")]
    pub raw_text: String,
}

impl LineItem {
    pub fn new(name: impl Into<String>, price: impl Into<FormNumber>) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
            quantity: FormNumber::from(1),
            discount_percent: FormNumber::from(0),
            image: None,
            raw_text: String::new(),
        }
    }

    pub fn with_quantity(mut self, quantity: impl Into<FormNumber>) -> Self {
        self.quantity = quantity.into();
        self
    }

    pub fn with_discount(mut self, discount_percent: impl Into<FormNumber>) -> Self {
        self.discount_percent = discount_percent.into();
        self
    }

    pub fn display_name(&self, index: usize) -> String {
        let name = self.name.trim();
        if name.is_empty() {
            format!("Item {}", index + 1)
        } else {
            name.to_string()
        }
    }
}

fn default_gst_rate() -> Decimal {
    Decimal::from(DEFAULT_GST_RATE)
}

/// A priced quotation. The money fields are always derived from `items`,
/// `discount_percent` and `gst_rate`; values supplied by a client are
/// replaced by [`Quotation::recompute`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quotation {
    #[serde(flatten)]
    pub client: Client,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub discount_percent: Decimal,
    #[serde(default = "default_gst_rate", with = "rust_decimal::serde::float")]
    pub gst_rate: Decimal,
    #[serde(flatten)]
    pub totals: QuoteTotals,
}

impl Default for Quotation {
    fn default() -> Self {
        Self {
            client: Client::default(),
            items: Vec::new(),
            discount_percent: Decimal::ZERO,
            gst_rate: default_gst_rate(),
            totals: QuoteTotals::default(),
        }
    }
}

impl Quotation {
    /// Validates the settings and prices the items.
    pub fn generate(
        client: Client,
        items: Vec<LineItem>,
        discount_percent: Decimal,
        gst_rate: Decimal,
    ) -> Result<Self, DomainError> {
        let mut quotation =
            Self { client, items, discount_percent, gst_rate, totals: QuoteTotals::default() };
        quotation.validate()?;
        quotation.recompute();
        Ok(quotation)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.discount_percent < Decimal::ZERO || self.discount_percent > Decimal::ONE_HUNDRED {
            return Err(DomainError::DiscountOutOfRange(self.discount_percent));
        }

        let allowed = GST_RATES.iter().any(|rate| Decimal::from(*rate) == self.gst_rate);
        if !allowed {
            return Err(DomainError::UnsupportedGstRate(self.gst_rate));
        }

        Ok(())
    }

    pub fn recompute(&mut self) {
        self.totals = pricing::compute(&self.items, self.discount_percent, self.gst_rate);
    }

    pub fn client_label(&self) -> &str {
        self.client.name().unwrap_or("Customer")
    }
}
