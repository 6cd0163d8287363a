use rust_decimal::Decimal;

use crate::share::money::format_inr;

pub const UNKNOWN_PRODUCT: &str = "Unknown Product";
pub const DEFAULT_SUMMARY: &str = "Premium sanitaryware collection";
pub const PRICE_ON_REQUEST: &str = "MRP on request";

/// First non-empty line of the block.
pub fn product_name(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or(UNKNOWN_PRODUCT)
        .to_string()
}

/// Up to two descriptive lines for a product card.
pub fn display_summary(text: &str, name: &str) -> String {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| line.chars().count() > 4 && *line != name)
        .filter(|line| {
            let lower = line.to_lowercase();
            !lower.contains("mrp") && !lower.contains("sku code")
        })
        .take(2)
        .collect();

    if lines.is_empty() {
        DEFAULT_SUMMARY.to_string()
    } else {
        lines.join(" | ")
    }
}

/// `Rs 35,000` for a positive price, `MRP on request` otherwise.
pub fn price_label(raw: &str) -> String {
    let cleaned: String = raw.trim().chars().filter(|ch| *ch != ',').collect();
    match cleaned.parse::<Decimal>() {
        Ok(value) if value > Decimal::ZERO => format!("Rs {}", format_inr(value)),
        _ => PRICE_ON_REQUEST.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{display_summary, price_label, product_name};

    const BLOCK: &str = "  AQUANT 9272 Wall Mixer\nMRP : ` 26,250/-\nBrushed Rose Gold finish\nSKU CODE 9272BRG\nCP\nConcealed body sold separately";

    #[test]
    fn name_is_first_non_empty_line() {
        assert_eq!(product_name("\n\n  Veil toilet  \nK-28362IN"), "Veil toilet");
        assert_eq!(product_name("   \n"), "Unknown Product");
    }

    #[test]
    fn summary_skips_name_prices_codes_and_short_lines() {
        let name = product_name(BLOCK);
        assert_eq!(
            display_summary(BLOCK, &name),
            "Brushed Rose Gold finish | Concealed body sold separately"
        );
    }

    #[test]
    fn summary_falls_back_when_nothing_descriptive_remains() {
        assert_eq!(display_summary("", ""), "Premium sanitaryware collection");
        assert_eq!(display_summary("K-1\nMRP 100", "K-1"), "Premium sanitaryware collection");
    }

    #[test]
    fn price_label_groups_positive_prices_only() {
        assert_eq!(price_label("35000"), "Rs 35,000");
        assert_eq!(price_label("1,45,000"), "Rs 1,45,000");
        assert_eq!(price_label("0"), "MRP on request");
        assert_eq!(price_label(""), "MRP on request");
        assert_eq!(price_label("call us"), "MRP on request");
    }
}
