//! Quotation documents.
//!
//! A stored quotation is rendered to HTML with tera and converted with
//! wkhtmltopdf when it is on the `PATH`. Without the converter, or when the
//! conversion fails, the HTML itself is published so the customer can print it
//! from a browser.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use tera::{Context, Tera};
use tokio::process::Command;
use tracing::{error, info, warn};

use showroom_core::config::DocumentsConfig;
use showroom_core::domain::record::{QuoteNumber, QuoteRecord};
use showroom_core::pricing::evaluate_line;
use showroom_core::share::{fixed2, format_inr, local_quote_date, CompanyProfile};

pub const QUOTE_TEMPLATE: &str = "quotation.html.tera";

/// Register custom Tera filters used by quote templates.
///
/// - `money`: two decimals, e.g. `amount | money` gives `1180.00`
/// - `inr`:   Indian digit grouping, e.g. `amount | inr` gives `1,45,000`
pub fn register_template_filters(tera: &mut Tera) {
    tera.register_filter("money", tera_money_filter);
    tera.register_filter("inr", tera_inr_filter);
}

fn decimal_value(value: &tera::Value) -> Decimal {
    match value {
        tera::Value::Number(n) => {
            n.as_f64().and_then(|float| Decimal::try_from(float).ok()).unwrap_or_default()
        }
        tera::Value::String(s) => Decimal::from_str(s.trim()).unwrap_or_default(),
        _ => Decimal::ZERO,
    }
}

fn tera_money_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    Ok(tera::Value::String(fixed2(decimal_value(value))))
}

fn tera_inr_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    Ok(tera::Value::String(format_inr(decimal_value(value))))
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("template error: {0}")]
    Template(String),
    #[error("conversion error: {0}")]
    Conversion(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Html,
}

impl DocumentFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Html => "html",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Html => "text/html",
        }
    }
}

/// A document written under the published quotes directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedDocument {
    pub file_name: String,
    pub path: PathBuf,
    pub format: DocumentFormat,
}

impl PublishedDocument {
    /// Link relative to the public base URL.
    pub fn link_path(&self) -> String {
        format!("/static/quotes/{}", self.file_name)
    }
}

/// `Mehta Residence` becomes `Mehta_Residence`; anything that is not a letter,
/// digit, `-` or `_` is dropped.
pub fn client_slug(client: &str) -> String {
    let slug: String = client
        .trim()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-')
        .collect();

    if slug.is_empty() {
        "Customer".to_string()
    } else {
        slug
    }
}

pub fn document_file_name(number: QuoteNumber, client: &str, format: DocumentFormat) -> String {
    format!("quote_{}_{}.{}", number.0, client_slug(client), format.extension())
}

#[derive(Serialize)]
struct ClientView<'a> {
    name: &'a str,
    mobile: Option<&'a str>,
    email: Option<&'a str>,
    company: Option<&'a str>,
    gst: Option<&'a str>,
    address: Option<&'a str>,
}

#[derive(Serialize)]
struct ItemView {
    index: usize,
    name: String,
    quantity: i64,
    price: String,
    discount_percent: String,
    total: String,
    image: Option<String>,
}

#[derive(Serialize)]
struct TotalsView {
    discount_percent: String,
    gst_rate: String,
    subtotal: String,
    discount_amount: String,
    taxable_amount: String,
    gst_amount: String,
    grand_total: String,
    has_discount: bool,
    has_gst: bool,
}

#[derive(Clone, Debug)]
pub struct QuoteDocuments {
    tera: Tera,
    wkhtmltopdf_path: Option<PathBuf>,
    quotes_dir: PathBuf,
    company: CompanyProfile,
    quote_prefix: String,
}

impl QuoteDocuments {
    /// Loads templates from `<template_dir>/quotes`, falling back to the
    /// built-in quotation layout when the directory has none.
    pub fn new(config: &DocumentsConfig, company: CompanyProfile) -> Result<Self, DocumentError> {
        let pattern = format!("{}/quotes/**/*.tera", config.template_dir.display());
        let mut tera = match Tera::new(&pattern) {
            Ok(tera) => tera,
            Err(e) => {
                warn!(
                    event_name = "system.documents.template_load_failed",
                    error = %e,
                    "failed to load quotation templates from filesystem, using built-in layout"
                );
                Tera::default()
            }
        };

        if !tera.get_template_names().any(|name| name == QUOTE_TEMPLATE) {
            add_builtin_template(&mut tera)?;
        }

        Ok(Self::assemble(tera, config, company))
    }

    /// Renderer with the built-in layout only.
    pub fn with_embedded_template(
        config: &DocumentsConfig,
        company: CompanyProfile,
    ) -> Result<Self, DocumentError> {
        let mut tera = Tera::default();
        add_builtin_template(&mut tera)?;
        Ok(Self::assemble(tera, config, company))
    }

    fn assemble(mut tera: Tera, config: &DocumentsConfig, company: CompanyProfile) -> Self {
        register_template_filters(&mut tera);
        tera.autoescape_on(vec![".html", ".html.tera"]);

        let wkhtmltopdf_path = which::which("wkhtmltopdf").ok();
        match &wkhtmltopdf_path {
            Some(path) => info!(
                event_name = "system.documents.converter_found",
                path = %path.display(),
                "wkhtmltopdf found"
            ),
            None => warn!(
                event_name = "system.documents.converter_missing",
                "wkhtmltopdf not found in PATH - quotations will be published as HTML"
            ),
        }

        Self {
            tera,
            wkhtmltopdf_path,
            quotes_dir: config.output_dir.join("quotes"),
            company,
            quote_prefix: config.quote_prefix.clone(),
        }
    }

    /// Always publish HTML, even when wkhtmltopdf is installed.
    pub fn without_converter(mut self) -> Self {
        self.wkhtmltopdf_path = None;
        self
    }

    pub fn converter_available(&self) -> bool {
        self.wkhtmltopdf_path.is_some()
    }

    pub fn quotes_dir(&self) -> &Path {
        &self.quotes_dir
    }

    pub fn quote_label(&self, number: QuoteNumber) -> String {
        number.label(&self.quote_prefix)
    }

    pub fn render_html(&self, record: &QuoteRecord) -> Result<String, DocumentError> {
        let quotation = &record.quotation;
        let client = &quotation.client;
        let totals = &quotation.totals;

        let items: Vec<ItemView> = quotation
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let line = evaluate_line(item);
                ItemView {
                    index: index + 1,
                    name: item.display_name(index),
                    quantity: line.quantity,
                    price: line.price.to_string(),
                    discount_percent: line.discount_percent.normalize().to_string(),
                    total: line.total.to_string(),
                    image: item.image.clone(),
                }
            })
            .collect();

        let mut context = Context::new();
        context.insert("company", &self.company);
        context.insert("quote_number", &self.quote_label(record.quote_number));
        context.insert("date", &local_quote_date(record.date).unwrap_or_default());
        context.insert(
            "client",
            &ClientView {
                name: quotation.client_label(),
                mobile: client.mobile(),
                email: client.email(),
                company: client.company(),
                gst: client.gstin(),
                address: client.address(),
            },
        );
        context.insert("items", &items);
        context.insert(
            "totals",
            &TotalsView {
                discount_percent: quotation.discount_percent.normalize().to_string(),
                gst_rate: quotation.gst_rate.normalize().to_string(),
                subtotal: totals.subtotal.to_string(),
                discount_amount: totals.discount_amount.to_string(),
                taxable_amount: totals.taxable_amount.to_string(),
                gst_amount: totals.gst_amount.to_string(),
                grand_total: totals.grand_total.to_string(),
                has_discount: totals.discount_amount > Decimal::ZERO,
                has_gst: totals.gst_amount > Decimal::ZERO,
            },
        );

        self.tera.render(QUOTE_TEMPLATE, &context).map_err(|e| DocumentError::Template(e.to_string()))
    }

    /// Renders and writes the document for `record`, returning where it was
    /// published.
    pub async fn publish(&self, record: &QuoteRecord) -> Result<PublishedDocument, DocumentError> {
        let html = self.render_html(record)?;
        tokio::fs::create_dir_all(&self.quotes_dir).await?;

        let (format, bytes) = match &self.wkhtmltopdf_path {
            Some(wkhtmltopdf) => match self.convert_html_to_pdf(&html, wkhtmltopdf).await {
                Ok(pdf_bytes) => (DocumentFormat::Pdf, pdf_bytes),
                Err(e) => {
                    warn!(
                        event_name = "system.documents.conversion_failed",
                        error = %e,
                        "PDF conversion failed, falling back to HTML"
                    );
                    (DocumentFormat::Html, html.into_bytes())
                }
            },
            None => (DocumentFormat::Html, html.into_bytes()),
        };

        let file_name = document_file_name(record.quote_number, &record.client, format);
        let path = self.quotes_dir.join(&file_name);
        tokio::fs::write(&path, &bytes).await?;

        info!(
            event_name = "quote.document.published",
            quote_id = %record.id,
            file_name = %file_name,
            size = bytes.len(),
            "quotation document published"
        );

        Ok(PublishedDocument { file_name, path, format })
    }

    /// The document already published for `record`, if any.
    pub async fn locate(&self, record: &QuoteRecord) -> Option<PublishedDocument> {
        for format in [DocumentFormat::Pdf, DocumentFormat::Html] {
            let file_name = document_file_name(record.quote_number, &record.client, format);
            let path = self.quotes_dir.join(&file_name);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Some(PublishedDocument { file_name, path, format });
            }
        }
        None
    }

    /// Convert HTML to PDF using wkhtmltopdf
    async fn convert_html_to_pdf(
        &self,
        html: &str,
        wkhtmltopdf_path: &Path,
    ) -> Result<Vec<u8>, DocumentError> {
        let temp_dir = std::env::temp_dir();
        let html_path = temp_dir.join(format!("quote_{}.html", uuid::Uuid::new_v4()));
        let pdf_path = temp_dir.join(format!("quote_{}.pdf", uuid::Uuid::new_v4()));

        tokio::fs::write(&html_path, html).await?;

        let output = Command::new(wkhtmltopdf_path)
            .arg("--page-size")
            .arg("A4")
            .arg("--margin-top")
            .arg("10mm")
            .arg("--margin-bottom")
            .arg("10mm")
            .arg("--margin-left")
            .arg("10mm")
            .arg("--margin-right")
            .arg("10mm")
            .arg("--encoding")
            .arg("utf-8")
            .arg("--enable-local-file-access")
            .arg(&html_path)
            .arg(&pdf_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        let _ = tokio::fs::remove_file(&html_path).await;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(event_name = "system.documents.wkhtmltopdf_failed", stderr = %stderr, "wkhtmltopdf failed");
            let _ = tokio::fs::remove_file(&pdf_path).await;
            return Err(DocumentError::Conversion(stderr.to_string()));
        }

        let pdf_bytes = tokio::fs::read(&pdf_path).await?;
        let _ = tokio::fs::remove_file(&pdf_path).await;

        Ok(pdf_bytes)
    }
}

fn add_builtin_template(tera: &mut Tera) -> Result<(), DocumentError> {
    tera.add_raw_template(
        QUOTE_TEMPLATE,
        include_str!("../../../templates/quotes/quotation.html.tera"),
    )
    .map_err(|e| DocumentError::Template(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rust_decimal::Decimal;
    use showroom_core::config::DocumentsConfig;
    use showroom_core::domain::quotation::{Client, LineItem, Quotation};
    use showroom_core::domain::record::{QuoteNumber, QuoteRecord, QuoteRecordId};
    use showroom_core::share::CompanyProfile;

    use super::*;

    fn documents(output_dir: PathBuf) -> QuoteDocuments {
        let config = DocumentsConfig {
            output_dir,
            template_dir: PathBuf::from("does-not-exist"),
            quote_prefix: "SC".to_string(),
        };
        QuoteDocuments::with_embedded_template(&config, CompanyProfile::default())
            .expect("built-in template")
            .without_converter()
    }

    fn record(client: &str) -> QuoteRecord {
        let quotation = Quotation::generate(
            Client { client_name: Some(client.to_string()), ..Client::default() },
            vec![
                LineItem::new("Wall hung WC", "145000").with_quantity(2).with_discount(10),
                LineItem::new("<b>Basin</b>", "4500"),
            ],
            Decimal::ZERO,
            Decimal::from(18),
        )
        .expect("quotation");

        QuoteRecord {
            id: QuoteRecordId("rec-1".to_string()),
            quote_number: QuoteNumber(42),
            client: quotation.client_label().to_string(),
            date: 1_760_000_000,
            total: quotation.totals.grand_total,
            quotation,
        }
    }

    #[test]
    fn client_slug_keeps_file_names_safe() {
        assert_eq!(client_slug("Mehta  Residence"), "Mehta_Residence");
        assert_eq!(client_slug("../../etc/passwd"), "etcpasswd");
        assert_eq!(client_slug("   "), "Customer");
        assert_eq!(
            document_file_name(QuoteNumber(7), "Asha K", DocumentFormat::Pdf),
            "quote_7_Asha_K.pdf"
        );
    }

    #[test]
    fn filters_format_money_and_indian_grouping() {
        let mut tera = Tera::default();
        register_template_filters(&mut tera);
        tera.add_raw_template("t", "{{ a | money }} {{ b | inr }} {{ c | inr }}").expect("template");

        let mut context = Context::new();
        context.insert("a", &1180);
        context.insert("b", "145000");
        context.insert("c", "not a number");

        assert_eq!(tera.render("t", &context).expect("render"), "1180.00 1,45,000 0");
    }

    #[test]
    fn html_lists_items_totals_and_escapes_user_text() {
        let dir = tempfile::tempdir().expect("tempdir");
        let html = documents(dir.path().to_path_buf()).render_html(&record("Mehta")).expect("html");

        assert!(html.contains("SC-000042"));
        assert!(html.contains("Mehta"));
        assert!(html.contains("Wall hung WC"));
        assert!(html.contains("2,61,000"));
        assert!(html.contains("&lt;b&gt;Basin&lt;&#x2F;b&gt;"));
        assert!(!html.contains("<b>Basin</b>"));
    }

    #[tokio::test]
    async fn publish_writes_html_without_converter_and_locate_finds_it() {
        let dir = tempfile::tempdir().expect("tempdir");
        let documents = documents(dir.path().to_path_buf());
        let stored = record("Mehta Residence");

        let published = documents.publish(&stored).await.expect("publish");
        assert_eq!(published.format, DocumentFormat::Html);
        assert_eq!(published.file_name, "quote_42_Mehta_Residence.html");
        assert_eq!(published.link_path(), "/static/quotes/quote_42_Mehta_Residence.html");
        assert!(published.path.starts_with(dir.path().join("quotes")));
        assert!(published.path.exists());

        assert_eq!(documents.locate(&stored).await, Some(published));
        assert_eq!(documents.locate(&record("Somebody Else")).await, None);
    }
}
