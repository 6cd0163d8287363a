pub mod cart;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;
pub mod share;

pub use cart::{cart_key, Cart, CartLine};
pub use catalog::{extract_price, QueryClassifier, QueryKind, SearchPlan};
pub use domain::catalog::{CatalogBrowse, CatalogProduct, CatalogQuery};
pub use domain::quotation::{Client, LineItem, Quotation, GST_RATES};
pub use domain::record::{QuoteNumber, QuoteRecord, QuoteRecordId, QuoteSummary};
pub use domain::FormNumber;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use pricing::{compute, QuoteTotals};
pub use share::{CompanyProfile, ShareContext};
