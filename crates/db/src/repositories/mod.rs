use async_trait::async_trait;
use thiserror::Error;

use showroom_core::domain::quotation::Quotation;
use showroom_core::domain::record::{QuoteRecord, QuoteRecordId, QuoteSummary};
use showroom_core::errors::ApplicationError;

pub mod memory;
pub mod quote_history;

pub use memory::InMemoryQuoteHistoryStore;
pub use quote_history::SqlQuoteHistoryStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("quote record `{0}` not found")]
    NotFound(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(id) => Self::NotFound(format!("quotation `{id}`")),
            other => Self::Persistence(other.to_string()),
        }
    }
}

/// Durable history of generated quotations.
///
/// `create` is the only operation that allocates: each call receives the next
/// quote number, and no two calls ever receive the same one, even when they
/// race. Deleting a record never frees its number.
#[async_trait]
pub trait QuoteHistoryStore: Send + Sync {
    async fn create(&self, quotation: Quotation) -> Result<QuoteRecord, RepositoryError>;

    /// Summaries, most recent first.
    async fn list(&self) -> Result<Vec<QuoteSummary>, RepositoryError>;

    async fn get(&self, id: &QuoteRecordId) -> Result<QuoteRecord, RepositoryError>;

    async fn delete(&self, id: &QuoteRecordId) -> Result<(), RepositoryError>;
}
