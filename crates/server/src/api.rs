//! Showroom HTTP endpoints.
//!
//! - `GET    /search?q=&brand=&exact=`         catalog lookup (exact or fuzzy)
//! - `GET    /catalog/browse?brand=&collection=` products of one collection
//! - `GET    /catalog/index`                    brands and their collections
//! - `POST   /catalog/add`                      hand-entered product (multipart)
//! - `GET    /status`                           index size and sample products
//! - `POST   /generate-quote`                   price, persist, publish; answers with the document
//! - `GET    /list-quotes`                      history, most recent first
//! - `GET    /get-quote/{id}`                   resumable quotation payload
//! - `DELETE /delete-quote/{id}`                permanent delete
//! - `POST   /share/{channel}`                  `full`, `link` or `email` payloads
//! - `POST   /send-quote-whatsapp`              Cloud API dispatch
//! - `POST   /send-quote-email`                 SMTP dispatch with the document attached
//! - `POST   /upload`, `GET /refresh`           catalog ingestion triggers
//! - `GET    /list-uploads`                     uploaded catalog PDFs
//! - `DELETE /delete-upload/{filename}`         remove an upload and reload
//! - `POST   /rename-upload`                    rename an upload and reload
//! - `GET    /static/*`                         published documents

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tracing::{error, info, warn};
use uuid::Uuid;

use showroom_core::catalog::{QueryClassifier, QueryKind};
use showroom_core::config::AppConfig;
use showroom_core::domain::catalog::{CatalogBrowse, CatalogProduct};
use showroom_core::domain::quotation::Quotation;
use showroom_core::domain::record::{QuoteRecord, QuoteRecordId};
use showroom_core::errors::{ApplicationError, InterfaceError};
use showroom_core::share::{
    email_body, email_subject, full_detail_message, link_only_message, local_quote_date,
    resolve_whatsapp_number, ShareContext,
};
use showroom_db::QuoteHistoryStore;

use crate::catalog::{BrandCollections, CatalogSource};
use crate::email::{MailError, QuotationEmail, QuoteMailer};
use crate::pdf::{PublishedDocument, QuoteDocuments};
use crate::share_links::{gmail_compose_link, whatsapp_link};
use crate::uploads::{UploadError, UploadStore, UploadedCatalog};
use crate::whatsapp::WhatsAppClient;

const UPLOAD_LIMIT_BYTES: usize = 64 * 1024 * 1024;
const IMAGE_LIMIT_BYTES: usize = 16 * 1024 * 1024;
const STATUS_SAMPLES: usize = 5;
const SAMPLE_TEXT_CHARS: usize = 100;

static QUOTE_ID: HeaderName = HeaderName::from_static("x-quote-id");
static QUOTE_FILE_URL: HeaderName = HeaderName::from_static("x-quote-file-url");
static QUOTE_FILE_NAME: HeaderName = HeaderName::from_static("x-quote-file-name");
static QUOTE_NUMBER: HeaderName = HeaderName::from_static("x-quote-number");

#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    history: Arc<dyn QuoteHistoryStore>,
    catalog: Arc<dyn CatalogSource>,
    documents: Arc<QuoteDocuments>,
    classifier: Arc<QueryClassifier>,
    whatsapp: Option<Arc<WhatsAppClient>>,
    mailer: Option<Arc<QuoteMailer>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        history: Arc<dyn QuoteHistoryStore>,
        catalog: Arc<dyn CatalogSource>,
        documents: QuoteDocuments,
        whatsapp: Option<WhatsAppClient>,
        mailer: Option<QuoteMailer>,
    ) -> Self {
        let classifier = QueryClassifier::new(&config.catalog.known_brands);
        Self {
            config: Arc::new(config),
            history,
            catalog,
            documents: Arc::new(documents),
            classifier: Arc::new(classifier),
            whatsapp: whatsapp.map(Arc::new),
            mailer: mailer.map(Arc::new),
        }
    }

    fn uploads(&self) -> UploadStore {
        UploadStore::new(&self.config.catalog.upload_dir)
    }

    pub fn catalog(&self) -> Arc<dyn CatalogSource> {
        Arc::clone(&self.catalog)
    }

    fn document_url(&self, document: &PublishedDocument) -> String {
        format!("{}{}", self.config.server.public_base_url(), document.link_path())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ApiError(InterfaceError);

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    detail: &'a str,
    correlation_id: &'a str,
}

impl From<InterfaceError> for ApiError {
    fn from(error: InterfaceError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::PreconditionFailed { .. } => StatusCode::PRECONDITION_FAILED,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.0.user_message(),
            detail: self.0.message(),
            correlation_id: self.0.correlation_id(),
        };
        (status, Json(body)).into_response()
    }
}

fn correlation_id() -> String {
    Uuid::new_v4().to_string()
}

fn fail(error: impl Into<ApplicationError>, correlation_id: &str) -> ApiError {
    let interface = error.into().into_interface(correlation_id);
    warn!(
        event_name = "api.request.failed",
        correlation_id = %correlation_id,
        error = %interface,
        "request failed"
    );
    ApiError(interface)
}

fn bad_request(message: impl Into<String>, correlation_id: &str) -> ApiError {
    ApiError(InterfaceError::BadRequest {
        message: message.into(),
        correlation_id: correlation_id.to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self { message: message.into() })
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    let static_dir = state.config.documents.output_dir.clone();

    Router::new()
        .route("/search", get(search))
        .route("/catalog/browse", get(browse))
        .route("/catalog/index", get(catalog_index))
        .route(
            "/catalog/add",
            post(add_catalog_product).layer(DefaultBodyLimit::max(IMAGE_LIMIT_BYTES)),
        )
        .route("/status", get(catalog_status))
        .route("/generate-quote", post(generate_quote))
        .route("/list-quotes", get(list_quotes))
        .route("/get-quote/{id}", get(get_quote))
        .route("/delete-quote/{id}", delete(delete_quote))
        .route("/share/{channel}", post(share_quote))
        .route("/send-quote-whatsapp", post(send_quote_whatsapp))
        .route("/send-quote-email", post(send_quote_email))
        .route("/upload", post(upload_catalog).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)))
        .route("/refresh", get(refresh_catalog))
        .route("/list-uploads", get(list_uploads))
        .route("/delete-upload/{filename}", delete(delete_upload))
        .route("/rename-upload", post(rename_upload))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub brand: Option<String>,
    #[serde(default)]
    pub exact: bool,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub kind: QueryKind,
    pub exact: bool,
    pub results: Vec<CatalogProduct>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let correlation_id = correlation_id();
    let Some(plan) = state.classifier.plan(&params.q, params.brand.as_deref(), params.exact) else {
        return Err(bad_request("search query is empty", &correlation_id));
    };

    let results = state.catalog.search(&plan).await;
    info!(
        event_name = "catalog.search.completed",
        correlation_id = %correlation_id,
        kind = ?plan.kind,
        results = results.len(),
        "catalog search completed"
    );

    Ok(Json(SearchResponse { kind: plan.kind, exact: plan.query.exact, results }))
}

#[derive(Debug, Serialize)]
pub struct BrowseResponse {
    pub results: Vec<CatalogProduct>,
}

pub async fn browse(
    State(state): State<AppState>,
    Query(request): Query<CatalogBrowse>,
) -> Json<BrowseResponse> {
    Json(BrowseResponse { results: state.catalog.browse(&request).await })
}

pub async fn catalog_index(State(state): State<AppState>) -> Json<Vec<BrandCollections>> {
    Json(state.catalog.index().await)
}

#[derive(Debug, Serialize)]
pub struct IndexSample {
    pub text: String,
    pub page: u32,
    pub source: String,
}

#[derive(Debug, Serialize)]
pub struct CatalogStatus {
    pub indexed_items: usize,
    pub index_path: String,
    pub sample_items: Vec<IndexSample>,
}

pub async fn catalog_status(State(state): State<AppState>) -> Json<CatalogStatus> {
    let sample_items = state
        .catalog
        .sample(STATUS_SAMPLES)
        .await
        .into_iter()
        .map(|product| IndexSample {
            text: product.text.chars().take(SAMPLE_TEXT_CHARS).collect(),
            page: product.page,
            source: product.source.unwrap_or_else(|| "N/A".to_string()),
        })
        .collect();

    Json(CatalogStatus {
        indexed_items: state.catalog.product_count().await,
        index_path: state.config.catalog.index_path.display().to_string(),
        sample_items,
    })
}

#[derive(Debug, Serialize)]
pub struct AddedProduct {
    pub message: String,
    pub item: CatalogProduct,
}

/// Keeps letters, digits, `.`, `-` and `_` of the uploaded image's own name.
fn image_file_name(raw: &str) -> String {
    let base = FsPath::new(raw).file_name().and_then(|name| name.to_str()).unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Adds a product typed in by staff (multipart fields `name`, `price`,
/// `brand`, optional `category` and image `file`). The image is published
/// under `/static/images/manual/`.
pub async fn add_catalog_product(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AddedProduct>, ApiError> {
    let correlation_id = correlation_id();
    let (mut name, mut price, mut brand, mut category) =
        (String::new(), String::new(), String::new(), None);
    let mut image: Option<(String, Vec<u8>)> = None;

    while let Some(field) =
        multipart.next_field().await.map_err(|e| bad_request(e.to_string(), &correlation_id))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        if field_name == "file" {
            let file_name = field.file_name().map(image_file_name);
            let bytes =
                field.bytes().await.map_err(|e| bad_request(e.to_string(), &correlation_id))?;
            if let Some(file_name) = file_name.filter(|_| !bytes.is_empty()) {
                image = Some((file_name, bytes.to_vec()));
            }
            continue;
        }

        let value = field.text().await.map_err(|e| bad_request(e.to_string(), &correlation_id))?;
        match field_name.as_str() {
            "name" => name = value,
            "price" => price = value,
            "brand" => brand = value,
            "category" => category = Some(value),
            _ => {}
        }
    }

    for (label, value) in [("name", &name), ("price", &price), ("brand", &brand)] {
        if value.trim().is_empty() {
            return Err(bad_request(format!("`{label}` is required"), &correlation_id));
        }
    }

    let image_link = match image {
        Some((file_name, bytes)) => {
            let stored_name =
                format!("manual_{}_{}", chrono::Utc::now().timestamp(), file_name);
            let dir = state.config.documents.output_dir.join("images").join("manual");
            let stored = async {
                tokio::fs::create_dir_all(&dir).await?;
                tokio::fs::write(dir.join(&stored_name), &bytes).await
            }
            .await;
            stored.map_err(|e| {
                fail(
                    ApplicationError::Persistence(format!("could not store product image: {e}")),
                    &correlation_id,
                )
            })?;
            Some(format!("/static/images/manual/{stored_name}"))
        }
        None => None,
    };

    let item = CatalogProduct::manual_entry(&name, &price, &brand, category.as_deref(), image_link);
    let products = state.catalog.add(item.clone()).await.map_err(|e| {
        fail(ApplicationError::Persistence(e.to_string()), &correlation_id)
    })?;

    info!(
        event_name = "catalog.add.completed",
        correlation_id = %correlation_id,
        brand = %brand.trim(),
        products,
        "manual catalog entry added"
    );
    Ok(Json(AddedProduct { message: "Success".to_string(), item }))
}

fn spawn_reload(catalog: Arc<dyn CatalogSource>, trigger: &'static str) {
    tokio::spawn(async move {
        match catalog.reload().await {
            Ok(products) => info!(
                event_name = "catalog.reload.completed",
                trigger,
                products,
                "catalog reloaded"
            ),
            Err(error) => error!(
                event_name = "catalog.reload.failed",
                trigger,
                error = %error,
                "catalog reload failed"
            ),
        }
    });
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
}

fn upload_failure(error: UploadError, correlation_id: &str) -> ApiError {
    match error {
        UploadError::InvalidName(_) | UploadError::AlreadyExists(_) => {
            bad_request(error.to_string(), correlation_id)
        }
        UploadError::NotFound(_) => fail(ApplicationError::NotFound(error.to_string()), correlation_id),
        UploadError::Io(_) => fail(ApplicationError::Persistence(error.to_string()), correlation_id),
    }
}

/// Stores an uploaded catalog PDF for the indexing pipeline and reloads the
/// index in the background.
pub async fn upload_catalog(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let correlation_id = correlation_id();

    while let Some(field) =
        multipart.next_field().await.map_err(|e| bad_request(e.to_string(), &correlation_id))?
    {
        let Some(raw_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let file_name = FsPath::new(&raw_name)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();

        let bytes = field.bytes().await.map_err(|e| bad_request(e.to_string(), &correlation_id))?;
        let file_name = state
            .uploads()
            .store(&file_name, &bytes)
            .await
            .map_err(|e| upload_failure(e, &correlation_id))?;

        info!(
            event_name = "catalog.upload.stored",
            correlation_id = %correlation_id,
            filename = %file_name,
            size = bytes.len(),
            "catalog upload stored"
        );
        spawn_reload(state.catalog(), "upload");

        return Ok(Json(UploadResponse {
            message: "Upload successful. Processing started in background.".to_string(),
            filename: file_name,
        }));
    }

    Err(bad_request("multipart body has no file field", &correlation_id))
}

#[derive(Debug, Serialize)]
pub struct UploadList {
    pub files: Vec<UploadedCatalog>,
}

pub async fn list_uploads(State(state): State<AppState>) -> Result<Json<UploadList>, ApiError> {
    let correlation_id = correlation_id();
    let files = state.uploads().list().await.map_err(|e| upload_failure(e, &correlation_id))?;
    Ok(Json(UploadList { files }))
}

pub async fn delete_upload(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let correlation_id = correlation_id();
    state.uploads().delete(&filename).await.map_err(|e| upload_failure(e, &correlation_id))?;

    info!(
        event_name = "catalog.upload.deleted",
        correlation_id = %correlation_id,
        filename = %filename,
        "catalog upload deleted"
    );
    spawn_reload(state.catalog(), "delete_upload");
    Ok(MessageResponse::new(format!("'{}' deleted. Catalog reload started.", filename.trim())))
}

#[derive(Debug, Deserialize)]
pub struct RenameUploadRequest {
    #[serde(default)]
    pub old_name: Option<String>,
    #[serde(default)]
    pub new_name: Option<String>,
}

pub async fn rename_upload(
    State(state): State<AppState>,
    Json(request): Json<RenameUploadRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let correlation_id = correlation_id();
    let present = |name: Option<String>| name.filter(|name| !name.trim().is_empty());
    let (Some(old_name), Some(new_name)) = (present(request.old_name), present(request.new_name))
    else {
        return Err(bad_request("both `old_name` and `new_name` are required", &correlation_id));
    };

    let renamed = state
        .uploads()
        .rename(&old_name, &new_name)
        .await
        .map_err(|e| upload_failure(e, &correlation_id))?;

    info!(
        event_name = "catalog.upload.renamed",
        correlation_id = %correlation_id,
        from = %old_name.trim(),
        to = %renamed,
        "catalog upload renamed"
    );
    spawn_reload(state.catalog(), "rename_upload");
    Ok(MessageResponse::new(format!("Renamed to {renamed}")))
}

pub async fn refresh_catalog(State(state): State<AppState>) -> Json<MessageResponse> {
    spawn_reload(state.catalog(), "refresh");
    MessageResponse::new("Catalog refresh started in background.")
}

// ---------------------------------------------------------------------------
// Quotations
// ---------------------------------------------------------------------------

fn header_value(value: &str) -> Result<HeaderValue, ApplicationError> {
    let invalid =
        || ApplicationError::Configuration(format!("`{value}` cannot be sent as a header value"));
    if !value.is_ascii() {
        return Err(invalid());
    }
    HeaderValue::from_str(value).map_err(|_| invalid())
}

/// Publishes the stored record and answers with the document bytes, its
/// metadata in `X-Quote-*` headers.
async fn deliver_document(
    state: &AppState,
    record: &QuoteRecord,
) -> Result<Response, ApplicationError> {
    let document = state
        .documents
        .publish(record)
        .await
        .map_err(|e| ApplicationError::Integration(format!("document rendering failed: {e}")))?;
    let content = tokio::fs::read(&document.path).await.map_err(|e| {
        ApplicationError::Integration(format!("published document could not be read: {e}"))
    })?;

    let headers = [
        (CONTENT_TYPE, header_value(document.format.content_type())?),
        (QUOTE_ID.clone(), header_value(&record.id.0)?),
        (QUOTE_FILE_URL.clone(), header_value(&state.document_url(&document))?),
        (QUOTE_FILE_NAME.clone(), header_value(&document.file_name)?),
        (QUOTE_NUMBER.clone(), header_value(&state.documents.quote_label(record.quote_number))?),
    ];
    Ok((headers, content).into_response())
}

/// Prices the submitted quotation, persists it and publishes its document,
/// answering with the document itself. Totals sent by the client are ignored.
/// Any failure after the record is stored removes it again, so a failed
/// generation leaves no history entry.
pub async fn generate_quote(
    State(state): State<AppState>,
    Json(mut quotation): Json<Quotation>,
) -> Result<Response, ApiError> {
    let correlation_id = correlation_id();

    quotation.validate().map_err(|e| fail(e, &correlation_id))?;
    quotation.recompute();

    let record = state.history.create(quotation).await.map_err(|e| fail(e, &correlation_id))?;

    match deliver_document(&state, &record).await {
        Ok(response) => {
            info!(
                event_name = "quote.generate.completed",
                correlation_id = %correlation_id,
                quote_id = %record.id,
                quote_number = %state.documents.quote_label(record.quote_number),
                "quotation generated"
            );
            Ok(response)
        }
        Err(delivery_error) => {
            if let Err(cleanup_error) = state.history.delete(&record.id).await {
                error!(
                    event_name = "quote.generate.rollback_failed",
                    correlation_id = %correlation_id,
                    quote_id = %record.id,
                    error = %cleanup_error,
                    "could not remove quotation after document failure"
                );
            }
            Err(fail(delivery_error, &correlation_id))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListedQuote {
    pub id: QuoteRecordId,
    pub quote_number: String,
    pub client: String,
    pub date: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct QuoteList {
    pub quotes: Vec<ListedQuote>,
}

pub async fn list_quotes(State(state): State<AppState>) -> Result<Json<QuoteList>, ApiError> {
    let correlation_id = correlation_id();
    let summaries = state.history.list().await.map_err(|e| fail(e, &correlation_id))?;

    let quotes = summaries
        .into_iter()
        .map(|summary| ListedQuote {
            quote_number: state.documents.quote_label(summary.quote_number),
            id: summary.id,
            client: summary.client,
            date: summary.date,
            total: summary.total,
        })
        .collect();
    Ok(Json(QuoteList { quotes }))
}

pub async fn get_quote(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QuoteRecord>, ApiError> {
    let correlation_id = correlation_id();
    let record =
        state.history.get(&QuoteRecordId(id)).await.map_err(|e| fail(e, &correlation_id))?;
    Ok(Json(record))
}

pub async fn delete_quote(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let correlation_id = correlation_id();
    let id = QuoteRecordId(id);
    state.history.delete(&id).await.map_err(|e| fail(e, &correlation_id))?;

    info!(
        event_name = "quote.history.deleted",
        correlation_id = %correlation_id,
        quote_id = %id,
        "quotation deleted"
    );
    Ok(MessageResponse::new("Deleted"))
}

// ---------------------------------------------------------------------------
// Sharing
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShareChannel {
    Full,
    Link,
    Email,
}

impl ShareChannel {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "full" | "whatsapp" => Some(Self::Full),
            "link" => Some(Self::Link),
            "email" => Some(Self::Email),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Link => "link",
            Self::Email => "email",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub id: QuoteRecordId,
}

#[derive(Debug, Serialize)]
pub struct SharePayload {
    pub channel: &'static str,
    pub quote_number: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_url: Option<String>,
}

pub async fn share_quote(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Json(request): Json<ShareRequest>,
) -> Result<Json<SharePayload>, ApiError> {
    let correlation_id = correlation_id();
    let channel = ShareChannel::parse(&channel)
        .ok_or_else(|| bad_request(format!("unknown share channel `{channel}`"), &correlation_id))?;

    let record = state.history.get(&request.id).await.map_err(|e| fail(e, &correlation_id))?;
    let client = &record.quotation.client;

    if channel == ShareChannel::Email && client.email().is_none() {
        return Err(fail(
            ApplicationError::Precondition("client email is required to share by email".to_string()),
            &correlation_id,
        ));
    }

    let quote_number = state.documents.quote_label(record.quote_number);
    let date = local_quote_date(record.date).unwrap_or_default();
    let document_url =
        state.documents.locate(&record).await.map(|document| state.document_url(&document));
    let company = &state.config.company;
    let ctx = ShareContext {
        quote_number: &quote_number,
        date: &date,
        document_link: document_url.as_deref().unwrap_or_default(),
        company,
    };

    let payload = match channel {
        ShareChannel::Full | ShareChannel::Link => {
            let message = if channel == ShareChannel::Full {
                full_detail_message(&record.quotation, &ctx)
            } else {
                link_only_message(&record.quotation, &ctx)
            };
            let recipient = client
                .mobile()
                .and_then(|mobile| resolve_whatsapp_number(mobile, &company.country_code));
            let whatsapp_url = whatsapp_link(recipient.as_deref(), &message)
                .map_err(|e| fail(e, &correlation_id))?;
            SharePayload {
                channel: channel.as_str(),
                quote_number,
                message,
                subject: None,
                recipient,
                document_url,
                whatsapp_url: Some(whatsapp_url),
                email_url: None,
            }
        }
        ShareChannel::Email => {
            let to = client.email().unwrap_or_default().to_string();
            let subject = email_subject(&ctx);
            let message = email_body(&record.quotation, &ctx);
            let email_url = gmail_compose_link(&to, &subject, &message)
                .map_err(|e| fail(e, &correlation_id))?;
            SharePayload {
                channel: channel.as_str(),
                quote_number,
                message,
                subject: Some(subject),
                recipient: Some(to),
                document_url,
                whatsapp_url: None,
                email_url: Some(email_url),
            }
        }
    };

    info!(
        event_name = "share.payload.composed",
        correlation_id = %correlation_id,
        quote_id = %record.id,
        channel = payload.channel,
        "share payload composed"
    );
    Ok(Json(payload))
}

#[derive(Debug, Deserialize)]
pub struct SendWhatsAppRequest {
    pub id: QuoteRecordId,
    /// Overrides the client's mobile number.
    #[serde(default)]
    pub to_number: Option<String>,
    /// Overrides the full-detail message.
    #[serde(default)]
    pub body: Option<String>,
}

/// Sends the quotation through the WhatsApp Cloud API. The recipient and the
/// API credentials are checked before anything is sent.
pub async fn send_quote_whatsapp(
    State(state): State<AppState>,
    Json(request): Json<SendWhatsAppRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let correlation_id = correlation_id();
    let record = state.history.get(&request.id).await.map_err(|e| fail(e, &correlation_id))?;
    let company = &state.config.company;

    let raw_number = request
        .to_number
        .as_deref()
        .map(str::trim)
        .filter(|number| !number.is_empty())
        .or_else(|| record.quotation.client.mobile())
        .unwrap_or_default();
    let Some(to) = resolve_whatsapp_number(raw_number, &company.country_code) else {
        return Err(fail(
            ApplicationError::Precondition("a valid WhatsApp number is required".to_string()),
            &correlation_id,
        ));
    };

    let Some(client) = state.whatsapp.as_ref() else {
        return Err(fail(
            ApplicationError::Precondition(
                "WhatsApp API not configured: set whatsapp.token and whatsapp.phone_number_id"
                    .to_string(),
            ),
            &correlation_id,
        ));
    };

    let document = match state.documents.locate(&record).await {
        Some(document) => document,
        None => state.documents.publish(&record).await.map_err(|e| {
            fail(
                ApplicationError::Integration(format!("document rendering failed: {e}")),
                &correlation_id,
            )
        })?,
    };

    let quote_number = state.documents.quote_label(record.quote_number);
    let body = match request.body {
        Some(body) => body,
        None => {
            let date = local_quote_date(record.date).unwrap_or_default();
            let document_url = state.document_url(&document);
            full_detail_message(
                &record.quotation,
                &ShareContext {
                    quote_number: &quote_number,
                    date: &date,
                    document_link: &document_url,
                    company,
                },
            )
        }
    };

    client.send_quotation(&to, &body, &document).await.map_err(|e| {
        fail(ApplicationError::Integration(e.to_string()), &correlation_id)
    })?;

    info!(
        event_name = "share.whatsapp.dispatched",
        correlation_id = %correlation_id,
        quote_id = %record.id,
        quote_number = %quote_number,
        "quotation dispatched over WhatsApp"
    );
    Ok(MessageResponse::new("WhatsApp sent with PDF document"))
}

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub id: QuoteRecordId,
    /// Overrides the client's email address.
    #[serde(default)]
    pub to_email: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    /// Overrides the composed email body.
    #[serde(default)]
    pub body: Option<String>,
}

/// Emails the quotation document through the configured SMTP relay. The
/// recipient and the relay are checked before anything is sent.
pub async fn send_quote_email(
    State(state): State<AppState>,
    Json(request): Json<SendEmailRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let correlation_id = correlation_id();
    let record = state.history.get(&request.id).await.map_err(|e| fail(e, &correlation_id))?;

    let to = request
        .to_email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .or_else(|| record.quotation.client.email())
        .map(str::to_string);
    let Some(to) = to else {
        return Err(fail(
            ApplicationError::Precondition("a recipient email is required".to_string()),
            &correlation_id,
        ));
    };

    let Some(mailer) = state.mailer.as_ref() else {
        return Err(fail(
            ApplicationError::Precondition(
                "SMTP not configured: set smtp.host and smtp.from".to_string(),
            ),
            &correlation_id,
        ));
    };

    let document = match state.documents.locate(&record).await {
        Some(document) => document,
        None => state.documents.publish(&record).await.map_err(|e| {
            fail(
                ApplicationError::Integration(format!("document rendering failed: {e}")),
                &correlation_id,
            )
        })?,
    };

    let quote_number = state.documents.quote_label(record.quote_number);
    let date = local_quote_date(record.date).unwrap_or_default();
    let document_url = state.document_url(&document);
    let ctx = ShareContext {
        quote_number: &quote_number,
        date: &date,
        document_link: &document_url,
        company: &state.config.company,
    };
    let subject = request
        .subject
        .filter(|subject| !subject.trim().is_empty())
        .unwrap_or_else(|| email_subject(&ctx));
    let body = request.body.unwrap_or_else(|| email_body(&record.quotation, &ctx));

    let email = QuotationEmail { to: &to, subject: &subject, body: &body };
    mailer.send_quotation(&email, &document).await.map_err(|e| match e {
        invalid @ MailError::Address { .. } => bad_request(invalid.to_string(), &correlation_id),
        other => fail(ApplicationError::Integration(other.to_string()), &correlation_id),
    })?;

    info!(
        event_name = "share.email.dispatched",
        correlation_id = %correlation_id,
        quote_id = %record.id,
        quote_number = %quote_number,
        "quotation emailed"
    );
    Ok(MessageResponse::new("Email sent with PDF attachment"))
}

#[cfg(test)]
mod tests {
    use std::path::Path as FsPath;
    use std::sync::Arc;

    use axum::{
        body::Body,
        extract::{Query, State},
        http::{Request, StatusCode},
        response::{IntoResponse, Response},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use showroom_core::config::{AppConfig, SmtpSecurity};
    use showroom_core::domain::catalog::CatalogProduct;
    use showroom_db::InMemoryQuoteHistoryStore;

    use super::{router, search, AppState, SearchParams};
    use crate::catalog::JsonCatalog;
    use crate::email::QuoteMailer;
    use crate::pdf::QuoteDocuments;

    const BOUNDARY: &str = "showroom-form-boundary";

    fn config(output_dir: &FsPath) -> AppConfig {
        let mut config = AppConfig::default();
        config.documents.output_dir = output_dir.to_path_buf();
        config.catalog.upload_dir = output_dir.join("uploads");
        config.catalog.index_path = output_dir.join("catalog.json");
        config.server.public_base_url = Some("https://quotes.example.com/".to_string());
        config
    }

    fn state_with(config: AppConfig) -> AppState {
        let catalog = JsonCatalog::with_products(
            &config.catalog,
            vec![
                CatalogProduct {
                    text: "K-28362IN-0\nVeil wall hung toilet\nMRP : Rs. 51,000".to_string(),
                    brand: Some("Kohler".to_string()),
                    source: Some("Kohler 2024.pdf".to_string()),
                    page: 12,
                    ..CatalogProduct::default()
                },
                CatalogProduct {
                    text: "K-28362IN-7\nVeil wall hung toilet, white\nMRP : Rs. 52,000".to_string(),
                    brand: Some("Kohler".to_string()),
                    ..CatalogProduct::default()
                },
            ],
        );
        let documents =
            QuoteDocuments::with_embedded_template(&config.documents, config.company.clone())
                .expect("documents")
                .without_converter();
        let mailer = QuoteMailer::from_config(&config.smtp).expect("mailer");

        AppState::new(
            config,
            Arc::new(InMemoryQuoteHistoryStore::default()),
            Arc::new(catalog),
            documents,
            None,
            mailer,
        )
    }

    fn app(dir: &FsPath) -> Router {
        router(state_with(config(dir)))
    }

    fn quotation_body() -> Value {
        json!({
            "client_name": "Mehta Residence",
            "mobile": "98250 12345",
            "items": [
                { "name": "Wall hung WC", "price": "100", "quantity": "2", "discount": "10" }
            ],
            "discount_percent": 0,
            "gst_rate": 18,
            "grand_total": 999999
        })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };
        app.clone().oneshot(request).await.expect("response")
    }

    /// Posts a multipart form; parts are `(field, file name, content)`.
    async fn send_form(app: &Router, uri: &str, parts: &[(&str, Option<&str>, &str)]) -> Response {
        let mut body = String::new();
        for (field, file_name, content) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match file_name {
                Some(file_name) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )),
                None => body
                    .push_str(&format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n")),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .expect("request");
        app.clone().oneshot(request).await.expect("response")
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    async fn text_body(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        String::from_utf8_lossy(&bytes).to_string()
    }

    /// Generates the standard quotation and returns its record id.
    async fn generate(app: &Router) -> String {
        let response = send(app, "POST", "/generate-quote", Some(quotation_body())).await;
        assert_eq!(response.status(), StatusCode::OK);
        response.headers()["x-quote-id"].to_str().expect("ascii id").to_string()
    }

    #[tokio::test]
    async fn blank_search_is_rejected_before_lookup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = state_with(config(dir.path()));

        let result = search(
            State(state),
            Query(SearchParams { q: "   ".to_string(), ..SearchParams::default() }),
        )
        .await;

        let response = result.expect_err("blank query").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn code_search_returns_at_most_one_product() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(dir.path());

        let response = send(&app, "GET", "/search?q=K-28362IN-7&brand=all", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["kind"], "exact");
        assert_eq!(body["results"].as_array().map(Vec::len), Some(1));

        let response = send(&app, "GET", "/search?q=veil%20toilet", None).await;
        let body = json_body(response).await;
        assert_eq!(body["kind"], "fuzzy");
        assert_eq!(body["results"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn generate_answers_with_the_document_and_its_metadata() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(dir.path());

        let response = send(&app, "POST", "/generate-quote", Some(quotation_body())).await;
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers().clone();
        assert_eq!(headers["content-type"], "text/html");
        assert_eq!(headers["x-quote-number"], "SC-000001");
        assert_eq!(headers["x-quote-file-name"], "quote_1_Mehta_Residence.html");
        assert_eq!(
            headers["x-quote-file-url"],
            "https://quotes.example.com/static/quotes/quote_1_Mehta_Residence.html"
        );
        let id = headers["x-quote-id"].to_str().expect("ascii id").to_string();

        let document = text_body(response).await;
        assert!(document.contains("Mehta Residence"));
        assert!(document.contains("SC-000001"));

        let stored = json_body(send(&app, "GET", &format!("/get-quote/{id}"), None).await).await;
        assert_eq!(stored["grand_total"], json!(212.4));
        assert_eq!(stored["subtotal"], json!(180.0));

        let served = send(&app, "GET", "/static/quotes/quote_1_Mehta_Residence.html", None).await;
        assert_eq!(served.status(), StatusCode::OK);
        assert_eq!(text_body(served).await, document);
    }

    #[tokio::test]
    async fn invalid_gst_rate_is_rejected_without_persisting() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(dir.path());

        let mut body = quotation_body();
        body["gst_rate"] = json!(7);
        let response = send(&app, "POST", "/generate-quote", Some(body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let listed = json_body(send(&app, "GET", "/list-quotes", None).await).await;
        assert_eq!(listed["quotes"].as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn failed_document_leaves_no_history_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, "not a directory").expect("write blocker");
        let app = router(state_with(config(&blocked)));

        let response = send(&app, "POST", "/generate-quote", Some(quotation_body())).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let listed = json_body(send(&app, "GET", "/list-quotes", None).await).await;
        assert_eq!(listed["quotes"].as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn unsendable_header_value_rolls_the_quotation_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = config(dir.path());
        config.server.public_base_url = Some("https://devis.example.com/répertoire".to_string());
        let app = router(state_with(config));

        let response = send(&app, "POST", "/generate-quote", Some(quotation_body())).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let listed = json_body(send(&app, "GET", "/list-quotes", None).await).await;
        assert_eq!(listed["quotes"].as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn history_lifecycle_list_get_delete() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(dir.path());

        let id = generate(&app).await;

        let listed = json_body(send(&app, "GET", "/list-quotes", None).await).await;
        assert_eq!(listed["quotes"][0]["id"], id.as_str());
        assert_eq!(listed["quotes"][0]["client"], "Mehta Residence");
        assert_eq!(listed["quotes"][0]["quote_number"], "SC-000001");
        assert_eq!(listed["quotes"][0]["total"], json!(212.4));

        let fetched = json_body(send(&app, "GET", &format!("/get-quote/{id}"), None).await).await;
        assert_eq!(fetched["client_name"], "Mehta Residence");
        assert_eq!(fetched["items"][0]["quantity"], json!(2));
        assert_eq!(fetched["gst_rate"], json!(18.0));

        let deleted = send(&app, "DELETE", &format!("/delete-quote/{id}"), None).await;
        assert_eq!(deleted.status(), StatusCode::OK);

        let again = send(&app, "DELETE", &format!("/delete-quote/{id}"), None).await;
        assert_eq!(again.status(), StatusCode::NOT_FOUND);
        let missing = send(&app, "GET", &format!("/get-quote/{id}"), None).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn share_payloads_per_channel() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(dir.path());

        let request = json!({ "id": generate(&app).await });

        let full = send(&app, "POST", "/share/full", Some(request.clone())).await;
        assert_eq!(full.status(), StatusCode::OK);
        let full = json_body(full).await;
        assert_eq!(full["recipient"], "919825012345");
        assert!(full["whatsapp_url"]
            .as_str()
            .is_some_and(|url| url.starts_with("https://wa.me/919825012345?text=")));
        assert!(full["message"].as_str().is_some_and(|text| text.contains("GRAND TOTAL")));

        let link = json_body(send(&app, "POST", "/share/link", Some(request.clone())).await).await;
        assert!(link["message"]
            .as_str()
            .is_some_and(|text| text.contains("quote_1_Mehta_Residence.html")));

        let email = send(&app, "POST", "/share/email", Some(request.clone())).await;
        assert_eq!(email.status(), StatusCode::PRECONDITION_FAILED);

        let unknown = send(&app, "POST", "/share/fax", Some(request)).await;
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn whatsapp_dispatch_checks_preconditions_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(dir.path());

        let id = generate(&app).await;

        let bad_number = send(
            &app,
            "POST",
            "/send-quote-whatsapp",
            Some(json!({ "id": id, "to_number": "12345" })),
        )
        .await;
        assert_eq!(bad_number.status(), StatusCode::PRECONDITION_FAILED);

        let unconfigured =
            send(&app, "POST", "/send-quote-whatsapp", Some(json!({ "id": id }))).await;
        assert_eq!(unconfigured.status(), StatusCode::PRECONDITION_FAILED);
        let body = json_body(unconfigured).await;
        assert!(body["detail"].as_str().is_some_and(|detail| detail.contains("not configured")));
    }

    #[tokio::test]
    async fn email_dispatch_needs_a_recipient_and_a_relay() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(dir.path());

        let id = generate(&app).await;

        let no_recipient = send(&app, "POST", "/send-quote-email", Some(json!({ "id": id }))).await;
        assert_eq!(no_recipient.status(), StatusCode::PRECONDITION_FAILED);
        let body = json_body(no_recipient).await;
        assert!(body["detail"].as_str().is_some_and(|detail| detail.contains("recipient")));

        let unconfigured = send(
            &app,
            "POST",
            "/send-quote-email",
            Some(json!({ "id": id, "to_email": "mehta@example.com" })),
        )
        .await;
        assert_eq!(unconfigured.status(), StatusCode::PRECONDITION_FAILED);
        let body = json_body(unconfigured).await;
        assert!(body["detail"].as_str().is_some_and(|detail| detail.contains("SMTP not configured")));

        let missing = send(
            &app,
            "POST",
            "/send-quote-email",
            Some(json!({ "id": "no-such-quote", "to_email": "mehta@example.com" })),
        )
        .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unreachable_relay_is_reported_as_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let closed_port = std::net::TcpListener::bind("127.0.0.1:0")
            .expect("bind")
            .local_addr()
            .expect("local addr")
            .port();

        let mut config = config(dir.path());
        config.smtp.host = Some("127.0.0.1".to_string());
        config.smtp.port = closed_port;
        config.smtp.from = Some("Showroom <sales@example.com>".to_string());
        config.smtp.security = SmtpSecurity::Plain;
        config.smtp.timeout_secs = 2;
        let app = router(state_with(config));

        let id = generate(&app).await;

        let bad_address = send(
            &app,
            "POST",
            "/send-quote-email",
            Some(json!({ "id": id, "to_email": "not an address" })),
        )
        .await;
        assert_eq!(bad_address.status(), StatusCode::BAD_REQUEST);

        let refused = send(
            &app,
            "POST",
            "/send-quote-email",
            Some(json!({ "id": id, "to_email": "mehta@example.com", "subject": "Your quote" })),
        )
        .await;
        assert_eq!(refused.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn refresh_and_index_answer_immediately() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(dir.path());

        let refresh = send(&app, "GET", "/refresh", None).await;
        assert_eq!(refresh.status(), StatusCode::OK);

        let index = json_body(send(&app, "GET", "/catalog/index", None).await).await;
        assert_eq!(index[0]["brand"], "Kohler");
        assert_eq!(index[0]["collections"], json!(["Standard Products"]));
    }

    #[tokio::test]
    async fn status_reports_count_and_trimmed_samples() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(dir.path());

        let status = json_body(send(&app, "GET", "/status", None).await).await;
        assert_eq!(status["indexed_items"], 2);
        assert!(status["index_path"].as_str().is_some_and(|path| path.ends_with("catalog.json")));
        assert_eq!(status["sample_items"][0]["page"], 12);
        assert_eq!(status["sample_items"][0]["source"], "Kohler 2024.pdf");
        assert_eq!(status["sample_items"][1]["source"], "N/A");
    }

    #[tokio::test]
    async fn manual_product_is_indexed_with_its_image() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(dir.path());

        let missing_price = send_form(
            &app,
            "/catalog/add",
            &[("name", None, "Aquant basin mixer"), ("brand", None, "Aquant")],
        )
        .await;
        assert_eq!(missing_price.status(), StatusCode::BAD_REQUEST);

        let added = send_form(
            &app,
            "/catalog/add",
            &[
                ("name", None, "Aquant basin mixer 1932"),
                ("price", None, "12,500"),
                ("brand", None, "Aquant"),
                ("category", None, "Faucets"),
                ("file", Some("../mixer photo.jpg"), "jpeg bytes"),
            ],
        )
        .await;
        assert_eq!(added.status(), StatusCode::OK);
        let added = json_body(added).await;
        assert_eq!(added["message"], "Success");
        assert_eq!(added["item"]["source"], "Manual Entry");
        assert_eq!(added["item"]["category"], "Faucets");
        let image = added["item"]["images"][0].as_str().expect("image link").to_string();
        assert!(image.starts_with("/static/images/manual/manual_"));
        assert!(image.ends_with("_mixerphoto.jpg"));

        let served = send(&app, "GET", &image, None).await;
        assert_eq!(served.status(), StatusCode::OK);
        assert_eq!(text_body(served).await, "jpeg bytes");

        let status = json_body(send(&app, "GET", "/status", None).await).await;
        assert_eq!(status["indexed_items"], 3);

        let found = json_body(send(&app, "GET", "/search?q=basin%20mixer&brand=Aquant", None).await).await;
        assert_eq!(found["results"][0]["name"], "Aquant basin mixer 1932");

        let saved = std::fs::read_to_string(dir.path().join("catalog.json")).expect("saved index");
        assert!(saved.contains("Aquant basin mixer 1932"));
    }

    #[tokio::test]
    async fn uploads_are_listed_renamed_and_deleted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(dir.path());

        for name in ["aquant.pdf", "kohler.pdf"] {
            let uploaded = send_form(&app, "/upload", &[("file", Some(name), "%PDF-1.4")]).await;
            assert_eq!(uploaded.status(), StatusCode::OK);
        }
        let not_pdf = send_form(&app, "/upload", &[("file", Some("notes.txt"), "hello")]).await;
        assert_eq!(not_pdf.status(), StatusCode::BAD_REQUEST);

        let listed = json_body(send(&app, "GET", "/list-uploads", None).await).await;
        assert_eq!(listed["files"].as_array().map(Vec::len), Some(2));

        let conflict = send(
            &app,
            "POST",
            "/rename-upload",
            Some(json!({ "old_name": "aquant.pdf", "new_name": "kohler.pdf" })),
        )
        .await;
        assert_eq!(conflict.status(), StatusCode::BAD_REQUEST);

        let blank =
            send(&app, "POST", "/rename-upload", Some(json!({ "old_name": "aquant.pdf" }))).await;
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

        let renamed = send(
            &app,
            "POST",
            "/rename-upload",
            Some(json!({ "old_name": "aquant.pdf", "new_name": "aquant-2025.pdf" })),
        )
        .await;
        assert_eq!(renamed.status(), StatusCode::OK);
        assert_eq!(json_body(renamed).await["message"], "Renamed to aquant-2025.pdf");

        let missing = send(
            &app,
            "POST",
            "/rename-upload",
            Some(json!({ "old_name": "aquant.pdf", "new_name": "other.pdf" })),
        )
        .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let traversal = send(&app, "DELETE", "/delete-upload/..%2Fcatalog.json", None).await;
        assert_eq!(traversal.status(), StatusCode::BAD_REQUEST);

        let deleted = send(&app, "DELETE", "/delete-upload/aquant-2025.pdf", None).await;
        assert_eq!(deleted.status(), StatusCode::OK);
        let again = send(&app, "DELETE", "/delete-upload/aquant-2025.pdf", None).await;
        assert_eq!(again.status(), StatusCode::NOT_FOUND);

        let listed = json_body(send(&app, "GET", "/list-uploads", None).await).await;
        assert_eq!(listed["files"][0]["name"], "kohler.pdf");
        assert_eq!(listed["files"].as_array().map(Vec::len), Some(1));
    }
}
