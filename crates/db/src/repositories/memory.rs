use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use showroom_core::domain::quotation::Quotation;
use showroom_core::domain::record::{QuoteNumber, QuoteRecord, QuoteRecordId, QuoteSummary};

use super::{QuoteHistoryStore, RepositoryError};

#[derive(Default)]
struct HistoryState {
    records: HashMap<String, QuoteRecord>,
    last_number: u64,
}

/// Process-local history, used by tests and by the server when no database is
/// wanted. Allocation happens under the write lock.
#[derive(Default)]
pub struct InMemoryQuoteHistoryStore {
    state: RwLock<HistoryState>,
}

#[async_trait::async_trait]
impl QuoteHistoryStore for InMemoryQuoteHistoryStore {
    async fn create(&self, quotation: Quotation) -> Result<QuoteRecord, RepositoryError> {
        let mut state = self.state.write().await;
        state.last_number += 1;

        let record = QuoteRecord {
            id: QuoteRecordId::generate(),
            quote_number: QuoteNumber(state.last_number),
            client: quotation.client_label().to_string(),
            date: Utc::now().timestamp(),
            total: quotation.totals.grand_total,
            quotation,
        };
        state.records.insert(record.id.0.clone(), record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<QuoteSummary>, RepositoryError> {
        let state = self.state.read().await;
        let mut summaries: Vec<QuoteSummary> =
            state.records.values().map(QuoteRecord::summary).collect();
        summaries.sort_by(|a, b| b.date.cmp(&a.date).then(b.quote_number.cmp(&a.quote_number)));
        Ok(summaries)
    }

    async fn get(&self, id: &QuoteRecordId) -> Result<QuoteRecord, RepositoryError> {
        let state = self.state.read().await;
        state.records.get(&id.0).cloned().ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: &QuoteRecordId) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        state
            .records
            .remove(&id.0)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }
}
