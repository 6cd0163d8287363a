//! Operator access to the quotation history without the HTTP service.

use serde::Serialize;
use showroom_core::config::AppConfig;
use showroom_core::domain::record::QuoteRecordId;
use showroom_db::{
    connect_with_config, migrations, QuoteHistoryStore, RepositoryError, SqlQuoteHistoryStore,
};

use crate::commands::{current_thread_runtime, load_config, CommandResult};

#[derive(Debug, Serialize)]
struct HistoryRow {
    id: String,
    quote_number: String,
    client: String,
    date: i64,
    total: String,
}

type Failure = (&'static str, String, u8);

fn repository_failure(error: RepositoryError) -> Failure {
    match error {
        RepositoryError::NotFound(id) => ("not_found", format!("quotation `{id}` not found"), 7),
        other => ("persistence", other.to_string(), 4),
    }
}

async fn open_store(config: &AppConfig) -> Result<SqlQuoteHistoryStore, Failure> {
    let pool = connect_with_config(&config.database)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5u8))?;
    Ok(SqlQuoteHistoryStore::new(pool))
}

pub fn list() -> CommandResult {
    let config = match load_config("history_list") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match current_thread_runtime("history_list") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let store = open_store(&config).await?;
        store.list().await.map_err(repository_failure)
    });

    match result {
        Ok(summaries) => {
            let prefix = &config.documents.quote_prefix;
            let rows: Vec<HistoryRow> = summaries
                .into_iter()
                .map(|summary| HistoryRow {
                    quote_number: summary.quote_number.label(prefix),
                    id: summary.id.0,
                    client: summary.client,
                    date: summary.date,
                    total: summary.total.round_dp(2).to_string(),
                })
                .collect();
            CommandResult::success_with_data(
                "history_list",
                format!("{} stored quotations", rows.len()),
                &rows,
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("history_list", error_class, message, exit_code)
        }
    }
}

pub fn delete(id: &str) -> CommandResult {
    let config = match load_config("history_delete") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match current_thread_runtime("history_delete") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let id = QuoteRecordId(id.trim().to_string());
    let result = runtime.block_on(async {
        let store = open_store(&config).await?;
        store.delete(&id).await.map_err(repository_failure)
    });

    match result {
        Ok(()) => CommandResult::success("history_delete", format!("deleted quotation `{id}`")),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("history_delete", error_class, message, exit_code)
        }
    }
}
