use serde::Serialize;
use showroom_core::catalog::{extract_price_with_rule, PriceRule};

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct ExtractedPrice {
    price: Option<String>,
    rule: Option<PriceRule>,
}

/// Runs the price extraction cascade over raw catalog text.
pub fn run(text: &str) -> CommandResult {
    let (price, rule) = match extract_price_with_rule(text) {
        Some((price, rule)) => (Some(price), Some(rule)),
        None => (None, None),
    };
    let message = match &price {
        Some(price) => format!("price {price}"),
        None => "no price found".to_string(),
    };
    CommandResult::success_with_data("extract_price", message, &ExtractedPrice { price, rule })
}
