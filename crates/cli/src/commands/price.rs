use std::fs;
use std::path::Path;

use showroom_core::domain::quotation::Quotation;
use showroom_core::pricing::compute_with_trace;
use showroom_core::share::format_inr;

use crate::commands::CommandResult;

/// Prices a quotation payload offline and reports every cascade step. Totals
/// already present in the file are ignored.
pub fn run(path: &Path) -> CommandResult {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                "price",
                "invalid_input",
                format!("could not read `{}`: {error}", path.display()),
                8,
            );
        }
    };

    let quotation: Quotation = match serde_json::from_str(&raw) {
        Ok(quotation) => quotation,
        Err(error) => {
            return CommandResult::failure(
                "price",
                "invalid_input",
                format!("`{}` is not a quotation payload: {error}", path.display()),
                8,
            );
        }
    };

    if let Err(error) = quotation.validate() {
        return CommandResult::failure("price", "domain_validation", error.to_string(), 8);
    }

    let result = compute_with_trace(&quotation.items, quotation.discount_percent, quotation.gst_rate);
    let message = format!("grand total ₹{}", format_inr(result.totals.grand_total));
    CommandResult::success_with_data("price", message, &result)
}
