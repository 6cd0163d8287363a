//! Catalog source backed by the JSON index the OCR pipeline writes.
//!
//! The pipeline itself is an external collaborator. This module reads its
//! output, answers search/browse/index requests against it, reloads it on
//! demand and appends hand-entered products to it.

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use showroom_core::catalog::{QueryKind, SearchPlan};
use showroom_core::config::CatalogConfig;
use showroom_core::domain::catalog::{CatalogBrowse, CatalogProduct};

const FUZZY_RESULT_LIMIT: usize = 30;
const COLLECTIONS_PER_BRAND: usize = 25;
const HEADER_LINES: usize = 6;
const ALL_COLLECTIONS: [&str; 2] = ["All Products", "Standard Products"];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog index `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog index `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("could not write catalog index `{path}`: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("could not encode catalog index: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BrandCollections {
    pub brand: String,
    pub collections: Vec<String>,
}

#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Ranked matches for a planned query. Exact plans resolve to at most one
    /// product.
    async fn search(&self, plan: &SearchPlan) -> Vec<CatalogProduct>;

    async fn browse(&self, request: &CatalogBrowse) -> Vec<CatalogProduct>;

    async fn index(&self) -> Vec<BrandCollections>;

    async fn product_count(&self) -> usize;

    /// The first `limit` products in index order.
    async fn sample(&self, limit: usize) -> Vec<CatalogProduct>;

    /// Adds a hand-entered product and persists the index, returning the new
    /// product count. On failure the catalog is left as it was.
    async fn add(&self, product: CatalogProduct) -> Result<usize, CatalogError>;

    /// Re-reads the underlying index, returning the number of products loaded.
    async fn reload(&self) -> Result<usize, CatalogError>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IndexFile {
    Products(Vec<CatalogProduct>),
    Wrapped { items: Vec<CatalogProduct> },
}

pub struct JsonCatalog {
    path: PathBuf,
    known_brands: Vec<String>,
    browse_limit: usize,
    products: RwLock<Vec<CatalogProduct>>,
}

impl JsonCatalog {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            path: config.index_path.clone(),
            known_brands: config.known_brands.clone(),
            browse_limit: config.browse_limit,
            products: RwLock::new(Vec::new()),
        }
    }

    /// Catalog over `config`'s index file. A missing file yields an empty
    /// catalog; the indexing pipeline may simply not have run yet.
    pub async fn load(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let catalog = Self::new(config);
        catalog.reload().await?;
        Ok(catalog)
    }

    pub fn with_products(config: &CatalogConfig, products: Vec<CatalogProduct>) -> Self {
        let catalog = Self::new(config);
        Self { products: RwLock::new(products), ..catalog }
    }

    async fn read_index(&self) -> Result<Vec<CatalogProduct>, CatalogError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                warn!(
                    event_name = "catalog.index.missing",
                    path = %self.path.display(),
                    "catalog index not found, serving an empty catalog"
                );
                return Ok(Vec::new());
            }
            Err(source) => return Err(CatalogError::Read { path: self.path.clone(), source }),
        };

        let parsed: IndexFile = serde_json::from_str(&raw)
            .map_err(|source| CatalogError::Parse { path: self.path.clone(), source })?;
        Ok(match parsed {
            IndexFile::Products(products) | IndexFile::Wrapped { items: products } => products,
        })
    }

    async fn write_index(&self, products: &[CatalogProduct]) -> Result<(), CatalogError> {
        let encoded = serde_json::to_vec_pretty(products).map_err(CatalogError::Encode)?;
        let write_error = |source| CatalogError::Write { path: self.path.clone(), source };
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }
        tokio::fs::write(&self.path, encoded).await.map_err(write_error)
    }

    fn brand_of(&self, product: &CatalogProduct) -> Option<String> {
        product.brand_hint(&self.known_brands)
    }

    fn matches_brand(&self, product: &CatalogProduct, brand: Option<&str>) -> bool {
        match brand {
            None => true,
            Some(brand) => self
                .brand_of(product)
                .is_some_and(|candidate| candidate.eq_ignore_ascii_case(brand.trim())),
        }
    }
}

#[async_trait]
impl CatalogSource for JsonCatalog {
    async fn search(&self, plan: &SearchPlan) -> Vec<CatalogProduct> {
        let products = self.products.read().await;
        let candidates: Vec<&CatalogProduct> = products
            .iter()
            .filter(|product| self.matches_brand(product, plan.query.brand.as_deref()))
            .collect();

        let results = match plan.kind {
            QueryKind::Exact => exact_match(&plan.query.q, &candidates).into_iter().collect(),
            QueryKind::Fuzzy => fuzzy_rank(&plan.query.q, &candidates),
        };
        plan.restrict(results)
    }

    async fn browse(&self, request: &CatalogBrowse) -> Vec<CatalogProduct> {
        let brand = request.brand.trim().to_lowercase();
        let collection = request
            .collection
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty() && !ALL_COLLECTIONS.contains(name))
            .map(str::to_lowercase);

        let products = self.products.read().await;
        products
            .iter()
            .filter(|product| {
                let owner = self
                    .brand_of(product)
                    .or_else(|| product.source.clone())
                    .unwrap_or_default()
                    .to_lowercase();
                owner.contains(&brand)
            })
            .filter(|product| match &collection {
                None => true,
                Some(collection) => {
                    let category = product.category.as_deref().unwrap_or_default().to_lowercase();
                    category.contains(collection.as_str())
                        || product.text.to_lowercase().contains(collection.as_str())
                }
            })
            .take(self.browse_limit)
            .cloned()
            .collect()
    }

    async fn index(&self) -> Vec<BrandCollections> {
        let products = self.products.read().await;
        let mut brands: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for product in products.iter() {
            let brand = self.brand_of(product).unwrap_or_else(|| "Generic".to_string());
            let collections = brands.entry(brand).or_default();
            let heading = product
                .category
                .as_deref()
                .map(str::trim)
                .filter(|category| !category.is_empty())
                .map(str::to_string)
                .or_else(|| collection_heading(&product.text));
            if let Some(heading) = heading {
                collections.insert(heading);
            }
        }

        let mut summary = Vec::with_capacity(brands.len());
        for known in &self.known_brands {
            if let Some(collections) = brands.remove(known) {
                summary.push(brand_summary(known.clone(), collections));
            }
        }
        summary.extend(brands.into_iter().map(|(brand, collections)| brand_summary(brand, collections)));
        summary
    }

    async fn product_count(&self) -> usize {
        self.products.read().await.len()
    }

    async fn sample(&self, limit: usize) -> Vec<CatalogProduct> {
        self.products.read().await.iter().take(limit).cloned().collect()
    }

    async fn add(&self, product: CatalogProduct) -> Result<usize, CatalogError> {
        let mut products = self.products.write().await;
        products.push(product);
        if let Err(error) = self.write_index(&products).await {
            products.pop();
            return Err(error);
        }

        info!(
            event_name = "catalog.product.added",
            path = %self.path.display(),
            products = products.len(),
            "manual catalog entry saved"
        );
        Ok(products.len())
    }

    async fn reload(&self) -> Result<usize, CatalogError> {
        let fresh = self.read_index().await?;
        let count = fresh.len();
        *self.products.write().await = fresh;

        info!(
            event_name = "catalog.index.loaded",
            path = %self.path.display(),
            products = count,
            "catalog index loaded"
        );
        Ok(count)
    }
}

fn brand_summary(brand: String, collections: BTreeSet<String>) -> BrandCollections {
    let mut collections: Vec<String> =
        collections.into_iter().take(COLLECTIONS_PER_BRAND).collect();
    if collections.is_empty() {
        collections.push("Standard Products".to_string());
    }
    BrandCollections { brand, collections }
}

/// Upper-case heading (4 to 28 letters and spaces) opening the first line of
/// an uncategorised block.
fn collection_heading(text: &str) -> Option<String> {
    let first_line = text.lines().next()?.trim();
    let prefix: String = first_line
        .chars()
        .take_while(|ch| ch.is_ascii_uppercase() || *ch == ' ')
        .take(28)
        .collect();
    let heading = prefix.trim();
    (prefix.chars().count() >= 4 && heading.len() > 3).then(|| heading.to_string())
}

fn compact_alnum(text: &str) -> String {
    text.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// Folds the usual OCR confusions in model codes: `o`/`0` and `i`/`l`/`1`.
fn relaxed_code(code: &str) -> String {
    code.chars()
        .map(|ch| match ch {
            'o' => '0',
            'i' | 'l' => '1',
            other => other,
        })
        .collect()
}

fn code_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '/' || ch == '-'))
        .map(compact_alnum)
        .filter(|token| token.len() >= 3 && token.bytes().any(|byte| byte.is_ascii_digit()))
        .collect()
}

/// The code the user is most likely asking for: the first mixed letter/digit
/// token, else the first long number, else the whole query compacted.
fn query_code(query: &str) -> String {
    let tokens = code_tokens(query);
    tokens
        .iter()
        .find(|token| token.bytes().any(|byte| byte.is_ascii_alphabetic()))
        .or_else(|| tokens.iter().find(|token| token.bytes().all(|byte| byte.is_ascii_digit())))
        .cloned()
        .unwrap_or_else(|| compact_alnum(query))
}

/// Lines naming the product, stopping at the price line so that price digits
/// never match a code.
fn header_lines(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut header: Vec<String> = Vec::new();
    for line in lowered.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if line.contains("mrp") || header.len() >= HEADER_LINES {
            break;
        }
        header.push(line.to_string());
    }
    if header.is_empty() {
        header = lowered.lines().map(str::trim).filter(|l| !l.is_empty()).take(3).map(String::from).collect();
    }
    header
}

fn digit_segments(token: &str) -> impl Iterator<Item = &str> {
    token.split(|ch: char| !ch.is_ascii_digit()).filter(|segment| segment.len() >= 3)
}

fn exact_match(query: &str, candidates: &[&CatalogProduct]) -> Option<CatalogProduct> {
    let code = query_code(query);
    if code.is_empty() {
        return None;
    }
    let relaxed = relaxed_code(&code);
    let numeric = code.bytes().all(|byte| byte.is_ascii_digit());

    let mut scored: Vec<(u32, usize)> = Vec::new();
    for (position, product) in candidates.iter().enumerate() {
        let header = header_lines(&product.text);
        let blob = format!("{}\n{}", product.name.as_deref().unwrap_or_default(), header.join("\n"));
        let tokens = code_tokens(&blob);

        let mut score = 0;
        if tokens.iter().any(|token| *token == code || relaxed_code(token) == relaxed) {
            let line_exact = header.iter().take(4).any(|line| compact_alnum(line) == code);
            score = 3000 + if line_exact { 80 } else { 0 };
        } else if numeric
            && tokens.iter().any(|token| digit_segments(token).any(|segment| segment == code))
        {
            score = 1700;
        }

        if score > 0 {
            scored.push((score, position));
        }
    }

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    let (top_score, top_position) = *scored.first()?;

    // A bare number shared by several products is ambiguous; no answer beats
    // a wrong one.
    if numeric && scored.iter().filter(|(score, _)| *score == top_score).count() > 1 {
        return None;
    }
    Some(candidates[top_position].clone())
}

fn fuzzy_rank(query: &str, candidates: &[&CatalogProduct]) -> Vec<CatalogProduct> {
    let query = query.trim().to_lowercase();
    let words: Vec<&str> = query
        .split(|ch: char| ch.is_whitespace() || matches!(ch, '-' | '/' | '.' | '_'))
        .filter(|word| word.len() >= 2)
        .collect();

    let mut scored: Vec<(u32, usize)> = Vec::new();
    for (position, product) in candidates.iter().enumerate() {
        let name = product.name.as_deref().unwrap_or_default().to_lowercase();
        let text = product.text.to_lowercase();
        let first_line = text.lines().next().unwrap_or_default();
        let combined = format!("{name}\n{text}");

        let mut score = 0;
        if !name.is_empty() && name.contains(&query) {
            score += 380;
        }
        if first_line.contains(&query) {
            score += 300;
        } else if text.contains(&query) {
            score += 120;
        }
        for word in &words {
            if combined.contains(word) {
                score += 45;
                if name.contains(word) || first_line.contains(word) {
                    score += 35;
                }
            }
        }
        if !words.is_empty() && words.iter().all(|word| combined.contains(word)) {
            score += 140;
        }

        if score > 0 {
            scored.push((score, position));
        }
    }

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored
        .into_iter()
        .take(FUZZY_RESULT_LIMIT)
        .map(|(_, position)| candidates[position].clone())
        .collect()
}
