use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::Row;
use tokio::sync::Mutex;

use showroom_core::domain::quotation::Quotation;
use showroom_core::domain::record::{QuoteNumber, QuoteRecord, QuoteRecordId, QuoteSummary};

use super::{QuoteHistoryStore, RepositoryError};
use crate::DbPool;

pub struct SqlQuoteHistoryStore {
    pool: DbPool,
    // Single writer for number allocation within this process; the sequence
    // update inside the transaction covers other processes.
    create_lock: Mutex<()>,
}

impl SqlQuoteHistoryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool, create_lock: Mutex::new(()) }
    }
}

fn decode_err(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

fn quote_number_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuoteNumber, RepositoryError> {
    let raw: i64 = row.try_get("quote_number").map_err(decode_err)?;
    u64::try_from(raw).map(QuoteNumber).map_err(decode_err)
}

fn row_to_summary(row: &sqlx::sqlite::SqliteRow) -> Result<QuoteSummary, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let client: String = row.try_get("client").map_err(decode_err)?;
    let date: i64 = row.try_get("created_at").map_err(decode_err)?;
    let total: String = row.try_get("total").map_err(decode_err)?;

    Ok(QuoteSummary {
        id: QuoteRecordId(id),
        quote_number: quote_number_from_row(row)?,
        client,
        date,
        total: Decimal::from_str(&total).map_err(decode_err)?,
    })
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<QuoteRecord, RepositoryError> {
    let summary = row_to_summary(row)?;
    let payload: String = row.try_get("payload").map_err(decode_err)?;
    let quotation: Quotation = serde_json::from_str(&payload).map_err(decode_err)?;

    Ok(QuoteRecord {
        id: summary.id,
        quote_number: summary.quote_number,
        client: summary.client,
        date: summary.date,
        total: summary.total,
        quotation,
    })
}

#[async_trait::async_trait]
impl QuoteHistoryStore for SqlQuoteHistoryStore {
    async fn create(&self, quotation: Quotation) -> Result<QuoteRecord, RepositoryError> {
        let payload = serde_json::to_string(&quotation).map_err(decode_err)?;
        let id = QuoteRecordId::generate();
        let client = quotation.client_label().to_string();
        let total = quotation.totals.grand_total;
        let date = Utc::now().timestamp();

        let _writer = self.create_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let allocated: i64 = sqlx::query(
            "UPDATE quote_sequence SET last_number = last_number + 1 WHERE id = 1
             RETURNING last_number",
        )
        .fetch_one(&mut *tx)
        .await?
        .try_get("last_number")
        .map_err(decode_err)?;

        sqlx::query(
            "INSERT INTO quote_record (id, quote_number, client, created_at, total, payload)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(allocated)
        .bind(&client)
        .bind(date)
        .bind(total.to_string())
        .bind(&payload)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(QuoteRecord {
            id,
            quote_number: QuoteNumber(u64::try_from(allocated).map_err(decode_err)?),
            client,
            date,
            total,
            quotation,
        })
    }

    async fn list(&self) -> Result<Vec<QuoteSummary>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, quote_number, client, created_at, total
             FROM quote_record
             ORDER BY created_at DESC, quote_number DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_summary).collect()
    }

    async fn get(&self, id: &QuoteRecordId) -> Result<QuoteRecord, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, quote_number, client, created_at, total, payload
             FROM quote_record WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => row_to_record(r),
            None => Err(RepositoryError::NotFound(id.to_string())),
        }
    }

    async fn delete(&self, id: &QuoteRecordId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM quote_record WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use showroom_core::domain::quotation::{Client, LineItem, Quotation};
    use showroom_core::domain::record::{QuoteNumber, QuoteRecordId};

    use super::SqlQuoteHistoryStore;
    use crate::repositories::{QuoteHistoryStore, RepositoryError};
    use crate::{connect_with_settings, migrations};

    async fn memory_store() -> SqlQuoteHistoryStore {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlQuoteHistoryStore::new(pool)
    }

    fn quotation(client: &str, price: &str) -> Quotation {
        Quotation::generate(
            Client { client_name: Some(client.to_string()), ..Client::default() },
            vec![LineItem::new("Wall hung WC", price).with_quantity(2).with_discount(10)],
            Decimal::ZERO,
            Decimal::from(18),
        )
        .expect("quotation")
    }

    #[tokio::test]
    async fn create_then_get_returns_resumable_payload() {
        let store = memory_store().await;

        let created = store.create(quotation("Asha", "100")).await.expect("create");
        assert_eq!(created.quote_number, QuoteNumber(1));
        assert_eq!(created.client, "Asha");
        assert_eq!(created.total, Decimal::new(2124, 1));

        let fetched = store.get(&created.id).await.expect("get");
        assert_eq!(fetched, created);
        assert_eq!(fetched.quotation.items[0].quantity.as_str(), "2");
        assert_eq!(fetched.quotation.gst_rate, Decimal::from(18));
    }

    #[tokio::test]
    async fn list_is_most_recent_first_without_payloads() {
        let store = memory_store().await;
        let first = store.create(quotation("First", "100")).await.expect("create");
        let second = store.create(quotation("Second", "200")).await.expect("create");

        let summaries = store.list().await.expect("list");
        let ids: Vec<&QuoteRecordId> = summaries.iter().map(|summary| &summary.id).collect();
        assert_eq!(ids, vec![&second.id, &first.id]);
        assert_eq!(summaries[0].total, second.total);
    }

    #[tokio::test]
    async fn delete_is_visible_immediately_and_numbers_are_not_reused() {
        let store = memory_store().await;
        let doomed = store.create(quotation("Doomed", "100")).await.expect("create");

        store.delete(&doomed.id).await.expect("delete");
        assert!(matches!(store.get(&doomed.id).await, Err(RepositoryError::NotFound(_))));
        assert!(matches!(store.delete(&doomed.id).await, Err(RepositoryError::NotFound(_))));

        let next = store.create(quotation("Next", "100")).await.expect("create");
        assert_eq!(next.quote_number, QuoteNumber(2));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = memory_store().await;
        let missing = QuoteRecordId("does-not-exist".to_string());

        assert!(matches!(store.get(&missing).await, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn concurrent_creates_receive_distinct_increasing_numbers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}", dir.path().join("history.db").display());
        let pool = connect_with_settings(&url, 4, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let store = Arc::new(SqlQuoteHistoryStore::new(pool));

        let mut handles = Vec::new();
        for index in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.create(quotation(&format!("Client {index}"), "100")).await
            }));
        }

        let mut numbers = Vec::new();
        for handle in handles {
            let record = handle.await.expect("join").expect("create");
            numbers.push(record.quote_number.0);
        }

        let distinct: HashSet<u64> = numbers.iter().copied().collect();
        assert_eq!(distinct.len(), 16);
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=16).collect::<Vec<u64>>());
    }
}
