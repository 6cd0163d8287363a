use rust_decimal::Decimal;
use serde_json::Value;

use showroom_core::domain::quotation::{Client, LineItem, Quotation};
use showroom_db::{
    connect_with_settings, migrations, InMemoryQuoteHistoryStore, QuoteHistoryStore,
    RepositoryError, SqlQuoteHistoryStore,
};

type ContractResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
}

fn require_field<'a>(value: &'a Value, field_name: &str) -> ContractResult<&'a Value> {
    value.get(field_name).ok_or_else(|| format!("{field_name} should be present"))
}

fn showroom_quotation() -> ContractResult<Quotation> {
    Quotation::generate(
        Client {
            client_name: Some("Mehta Residence".to_string()),
            mobile: Some("98250 12345".to_string()),
            email: Some("mehta@example.com".to_string()),
            ..Client::default()
        },
        vec![
            LineItem::new("Wall hung WC", "100").with_quantity(2).with_discount(10),
            LineItem::new("Basin mixer", "4500"),
        ],
        Decimal::from(5),
        Decimal::from(18),
    )
    .map_err(|err| err.to_string())
}

/// Behaviour every store must share, whatever keeps the records.
async fn exercise_store(store: &dyn QuoteHistoryStore) -> ContractResult {
    let first = store.create(showroom_quotation()?).await.map_err(|err| err.to_string())?;
    let second = store.create(showroom_quotation()?).await.map_err(|err| err.to_string())?;
    require!(second.quote_number > first.quote_number, "numbers must increase");
    require_eq!(first.total, first.quotation.totals.grand_total);

    let listed = store.list().await.map_err(|err| err.to_string())?;
    require_eq!(listed.len(), 2);
    require_eq!(listed[0].id, second.id);

    let resumed = store.get(&first.id).await.map_err(|err| err.to_string())?;
    require_eq!(resumed.quotation.items.len(), 2);
    require_eq!(resumed.quotation.discount_percent, Decimal::from(5));
    require_eq!(resumed.quotation.client.email(), Some("mehta@example.com"));

    let wire = serde_json::to_value(&resumed).map_err(|err| err.to_string())?;
    for field in ["id", "quote_number", "client", "date", "total", "client_name", "items"] {
        require_field(&wire, field)?;
    }
    for field in ["subtotal", "discount_amount", "taxable_amount", "gst_amount", "grand_total"] {
        require!(require_field(&wire, field)?.is_number(), "{field} should be numeric");
    }

    store.delete(&first.id).await.map_err(|err| err.to_string())?;
    require!(
        matches!(store.get(&first.id).await, Err(RepositoryError::NotFound(_))),
        "deleted record must not be readable"
    );
    require!(
        matches!(store.delete(&first.id).await, Err(RepositoryError::NotFound(_))),
        "second delete must report not found"
    );

    let third = store.create(showroom_quotation()?).await.map_err(|err| err.to_string())?;
    require!(third.quote_number > second.quote_number, "deleted numbers must not be reused");

    Ok(())
}

#[tokio::test]
async fn sql_store_honours_history_contract() -> ContractResult {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.map_err(|err| err.to_string())?;
    migrations::run_pending(&pool).await.map_err(|err| err.to_string())?;

    exercise_store(&SqlQuoteHistoryStore::new(pool)).await
}

#[tokio::test]
async fn in_memory_store_honours_history_contract() -> ContractResult {
    exercise_store(&InMemoryQuoteHistoryStore::default()).await
}
