use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use showroom_db::DbPool;

use crate::catalog::CatalogSource;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    catalog: Arc<dyn CatalogSource>,
}

impl HealthState {
    pub fn new(db_pool: DbPool, catalog: Arc<dyn CatalogSource>) -> Self {
        Self { db_pool, catalog }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub catalog: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// Ready when the database answers. An empty catalog is reported but does not
/// degrade the service; quotations can still be built by hand.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let catalog = catalog_check(state.catalog.as_ref()).await;
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "showroom-server runtime initialized".to_string(),
        },
        database,
        catalog,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

async fn catalog_check(catalog: &dyn CatalogSource) -> HealthCheck {
    match catalog.product_count().await {
        0 => HealthCheck { status: "empty", detail: "catalog index has no products".to_string() },
        count => HealthCheck { status: "ready", detail: format!("{count} products indexed") },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use showroom_core::config::{AppConfig, CatalogConfig};
    use showroom_core::domain::catalog::CatalogProduct;
    use showroom_db::connect_with_settings;

    use crate::catalog::JsonCatalog;
    use crate::health::{health, HealthState};

    fn catalog_config() -> CatalogConfig {
        AppConfig::default().catalog
    }

    #[tokio::test]
    async fn health_returns_ready_when_database_is_reachable() {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 5)
            .await
            .expect("pool should connect");
        let catalog = JsonCatalog::with_products(
            &catalog_config(),
            vec![CatalogProduct { text: "AQUANT 9272".to_string(), ..CatalogProduct::default() }],
        );

        let (status, Json(payload)) =
            health(State(HealthState::new(pool.clone(), Arc::new(catalog)))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.database.status, "ready");
        assert_eq!(payload.service.status, "ready");
        assert_eq!(payload.catalog.detail, "1 products indexed");

        pool.close().await;
    }

    #[tokio::test]
    async fn empty_catalog_is_reported_without_degrading() {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 5)
            .await
            .expect("pool should connect");
        let catalog = JsonCatalog::new(&catalog_config());

        let (status, Json(payload)) =
            health(State(HealthState::new(pool.clone(), Arc::new(catalog)))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.catalog.status, "empty");

        pool.close().await;
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_database_is_unavailable() {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 5)
            .await
            .expect("pool should connect");
        pool.close().await;
        let catalog = JsonCatalog::new(&catalog_config());

        let (status, Json(payload)) =
            health(State(HealthState::new(pool, Arc::new(catalog)))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.database.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
