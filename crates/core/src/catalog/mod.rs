//! Interpretation of noisy catalog text: prices, display summaries and the
//! exact-versus-fuzzy decision for search queries.

pub mod price;
pub mod query;
pub mod summary;

pub use price::{extract_price, extract_price_with_rule, PriceRule};
pub use query::{QueryClassifier, QueryKind, QueryRule, SearchPlan};
pub use summary::{display_summary, price_label, product_name};
