//! Cascading quotation pricing.
//!
//! Line totals are summed into the subtotal, the global discount is taken off
//! the subtotal and GST is charged on what remains. Every intermediate value
//! keeps full decimal precision; rounding to two places is left to whoever
//! presents the numbers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quotation::LineItem;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteTotals {
    #[serde(default, with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub discount_amount: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub taxable_amount: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub gst_amount: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
}

/// How a single line was read and priced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineEvaluation {
    pub quantity: i64,
    pub price: Decimal,
    pub discount_percent: Decimal,
    pub total: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub totals: QuoteTotals,
    pub steps: Vec<PricingTraceStep>,
}

/// Reads a line leniently. Quantity is the leading integer of the field with a
/// floor of 1; price and discount are leading decimals defaulting to 0. Price
/// is floored at 0 and the discount is clamped to 0-100 so no line goes
/// negative.
pub fn evaluate_line(item: &LineItem) -> LineEvaluation {
    let quantity = item.quantity.leading_integer().filter(|value| *value >= 1).unwrap_or(1);
    let price = item.price.leading_decimal().unwrap_or_default().max(Decimal::ZERO);
    let discount_percent = clamp_percent(item.discount_percent.leading_decimal().unwrap_or_default());

    let total = price
        .checked_mul(Decimal::from(quantity))
        .and_then(|gross| gross.checked_mul(Decimal::ONE - discount_percent / Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO);

    LineEvaluation { quantity, price, discount_percent, total }
}

pub fn compute(items: &[LineItem], discount_percent: Decimal, gst_rate: Decimal) -> QuoteTotals {
    compute_with_trace(items, discount_percent, gst_rate).totals
}

pub fn compute_with_trace(
    items: &[LineItem],
    discount_percent: Decimal,
    gst_rate: Decimal,
) -> PricingResult {
    let discount_percent = clamp_percent(discount_percent);
    let gst_rate = clamp_percent(gst_rate);
    let mut steps = Vec::with_capacity(items.len() + 5);

    let mut subtotal = Decimal::ZERO;
    for (index, item) in items.iter().enumerate() {
        let line = evaluate_line(item);
        steps.push(PricingTraceStep {
            stage: format!("line_{}", index + 1),
            detail: format!(
                "{} x {} less {}%",
                line.price.normalize(),
                line.quantity,
                line.discount_percent.normalize()
            ),
            amount: line.total,
        });
        subtotal = subtotal.checked_add(line.total).unwrap_or(subtotal);
    }

    let discount_amount = subtotal
        .checked_mul(discount_percent / Decimal::ONE_HUNDRED)
        .unwrap_or(Decimal::ZERO);
    let taxable_amount = subtotal - discount_amount;
    let gst_amount =
        taxable_amount.checked_mul(gst_rate / Decimal::ONE_HUNDRED).unwrap_or(Decimal::ZERO);
    let grand_total = taxable_amount.checked_add(gst_amount).unwrap_or(taxable_amount);

    steps.push(step("subtotal", "sum(line totals)", subtotal));
    steps.push(step("discount", &format!("{}% of subtotal", discount_percent.normalize()), discount_amount));
    steps.push(step("taxable", "subtotal - discount", taxable_amount));
    steps.push(step("gst", &format!("{}% of taxable", gst_rate.normalize()), gst_amount));
    steps.push(step("grand_total", "taxable + gst", grand_total));

    PricingResult {
        totals: QuoteTotals { subtotal, discount_amount, taxable_amount, gst_amount, grand_total },
        steps,
    }
}

fn step(stage: &str, detail: &str, amount: Decimal) -> PricingTraceStep {
    PricingTraceStep { stage: stage.to_string(), detail: detail.to_string(), amount }
}

fn clamp_percent(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO).min(Decimal::ONE_HUNDRED)
}
