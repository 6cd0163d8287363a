//! Catalog PDFs waiting for (or already through) the indexing pipeline.
//!
//! Every name handled here is a bare file name inside the upload directory;
//! anything with a path component is refused before touching the disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("`{0}` is not a PDF file name")]
    InvalidName(String),
    #[error("upload `{0}`")]
    NotFound(String),
    #[error("an upload named `{0}` already exists")]
    AlreadyExists(String),
    #[error("upload storage failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UploadedCatalog {
    pub name: String,
    /// Megabytes, two decimals.
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    /// Last modification, epoch seconds.
    pub date: i64,
}

/// `name` itself when it is a bare, visible `.pdf` file name.
pub fn pdf_file_name(name: &str) -> Result<&str, UploadError> {
    let name = name.trim();
    let bare = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().is_some_and(|file_name| file_name == name);
    if bare && name.to_ascii_lowercase().ends_with(".pdf") {
        Ok(name)
    } else {
        Err(UploadError::InvalidName(name.to_string()))
    }
}

fn size_in_mb(bytes: u64) -> Decimal {
    (Decimal::from(bytes) / Decimal::from(BYTES_PER_MB)).round_dp(2)
}

pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn existing(&self, name: &str) -> Result<PathBuf, UploadError> {
        let path = self.dir.join(pdf_file_name(name)?);
        if tokio::fs::try_exists(&path).await? {
            Ok(path)
        } else {
            Err(UploadError::NotFound(name.trim().to_string()))
        }
    }

    /// Writes `bytes` under `name`, replacing an earlier upload of the same
    /// name.
    pub async fn store(&self, name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let name = pdf_file_name(name)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(name), bytes).await?;
        Ok(name.to_string())
    }

    /// PDF uploads, most recently modified first. A missing directory lists
    /// as empty.
    pub async fn list(&self) -> Result<Vec<UploadedCatalog>, UploadError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };

        let mut uploads = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if pdf_file_name(&name).is_err() {
                continue;
            }
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let date = metadata
                .modified()
                .map(|modified| DateTime::<Utc>::from(modified).timestamp())
                .unwrap_or_default();
            uploads.push(UploadedCatalog { name, size: size_in_mb(metadata.len()), date });
        }

        uploads.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.name.cmp(&b.name)));
        Ok(uploads)
    }

    pub async fn delete(&self, name: &str) -> Result<(), UploadError> {
        let path = self.existing(name).await?;
        tokio::fs::remove_file(path).await?;
        Ok(())
    }

    /// Renames an upload without ever overwriting another one.
    pub async fn rename(&self, old_name: &str, new_name: &str) -> Result<String, UploadError> {
        let from = self.existing(old_name).await?;
        let new_name = pdf_file_name(new_name)?;
        let to = self.dir.join(new_name);
        if tokio::fs::try_exists(&to).await? {
            return Err(UploadError::AlreadyExists(new_name.to_string()));
        }
        tokio::fs::rename(from, to).await?;
        Ok(new_name.to_string())
    }
}
