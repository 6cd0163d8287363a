use serde::{Deserialize, Serialize};

use crate::domain::FormNumber;

/// One indexed block of catalog text, as produced by the external
/// OCR/indexing pipeline. `text` is the source of truth; the other fields are
/// hints that may be missing or stale.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub text: String,
    #[serde(default)]
    pub price: FormNumber,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// `source` recorded on products entered by hand rather than indexed.
pub const MANUAL_ENTRY_SOURCE: &str = "Manual Entry";

impl CatalogProduct {
    /// A product typed in by staff. The text mirrors an indexed block, with
    /// the price on an `MRP` line, so search and price extraction treat it
    /// like any other.
    pub fn manual_entry(
        name: &str,
        price: &str,
        brand: &str,
        category: Option<&str>,
        image: Option<String>,
    ) -> Self {
        let name = name.trim();
        let price = price.trim();
        Self {
            text: format!("{name}\nMRP : ` {price}/-"),
            price: FormNumber::from(price),
            images: image.into_iter().collect(),
            name: Some(name.to_string()),
            brand: Some(brand.trim().to_string()),
            category: category.map(str::trim).filter(|category| !category.is_empty()).map(str::to_string),
            page: 0,
            source: Some(MANUAL_ENTRY_SOURCE.to_string()),
        }
    }

    pub fn primary_image(&self) -> Option<&str> {
        self.images.iter().map(String::as_str).find(|image| !image.trim().is_empty())
    }

    /// Listed price when the indexer captured a real one; `"0"` and blanks
    /// count as absent.
    pub fn listed_price(&self) -> Option<&str> {
        let raw = self.price.as_str().trim();
        match self.price.leading_decimal() {
            Some(value) if !value.is_zero() => Some(raw),
            _ => None,
        }
    }

    /// Brand of the block, falling back to the source document name for
    /// blocks indexed before brands were recorded.
    pub fn brand_hint(&self, known_brands: &[String]) -> Option<String> {
        if let Some(brand) = self.brand.as_deref().map(str::trim).filter(|brand| !brand.is_empty())
        {
            return Some(brand.to_string());
        }

        let source = self.source.as_deref()?.to_lowercase();
        known_brands.iter().find(|brand| source.contains(&brand.to_lowercase())).cloned()
    }
}

/// Request shape of the external catalog search interface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub q: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default)]
    pub exact: bool,
}

/// Request shape of the external catalog browse interface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogBrowse {
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}
