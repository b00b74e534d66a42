//! File-backed catalog
//!
//! Keeps the directory and the book records in one JSON document and the
//! audit log as JSON lines. Meant for a single desk running without the
//! central catalog service, and for local testing.

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::Catalog;
use crate::{
    config::CatalogConfig,
    error::{AppError, AppResult, ResolveError},
    models::{
        Assignee, AuditEntry, BookRecord, EmployeeId, Isbn, LoanStatus, TransitionKind, UserCode,
    },
};

/// Directory entry for one employee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub code: String,
    #[serde(default)]
    pub name: String,
}

/// On-disk catalog document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    /// Employee id to directory entry
    #[serde(default)]
    pub directory: IndexMap<String, DirectoryEntry>,
    #[serde(default)]
    pub books: Vec<BookRecord>,
}

#[derive(Serialize)]
struct AuditLine<'a> {
    logged_at: String,
    system_id: &'a str,
    message: &'a AuditEntry,
}

pub struct JsonCatalog {
    path: PathBuf,
    audit_log_path: PathBuf,
    data: RwLock<CatalogData>,
}

impl JsonCatalog {
    /// Load the catalog document named in `config`
    pub async fn open(config: &CatalogConfig) -> AppResult<Self> {
        let raw = tokio::fs::read_to_string(&config.path).await?;
        let data: CatalogData = serde_json::from_str(&raw)?;
        tracing::info!(
            "Loaded catalog {} ({} employees, {} books)",
            config.path.display(),
            data.directory.len(),
            data.books.len()
        );
        Ok(Self::new(data, config))
    }

    pub fn new(data: CatalogData, config: &CatalogConfig) -> Self {
        Self {
            path: config.path.clone(),
            audit_log_path: config.audit_log_path.clone(),
            data: RwLock::new(data),
        }
    }

    async fn persist(&self, data: &CatalogData) -> AppResult<()> {
        let json = serde_json::to_string_pretty(data)?;
        let tmp = temporary_path(&self.path);
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[async_trait]
impl Catalog for JsonCatalog {
    async fn resolve_user(&self, employee_id: &EmployeeId) -> Result<UserCode, ResolveError> {
        let data = self.data.read().await;
        let entry = data
            .directory
            .get(employee_id.as_str())
            .ok_or_else(|| ResolveError::NotFound(employee_id.to_string()))?;
        UserCode::parse(&entry.code).ok_or_else(|| ResolveError::Blank(employee_id.to_string()))
    }

    async fn find_records(&self, isbn: &Isbn) -> AppResult<Vec<BookRecord>> {
        let data = self.data.read().await;
        Ok(data
            .books
            .iter()
            .filter(|record| record.matches_isbn(isbn))
            .cloned()
            .collect())
    }

    async fn request_transition(
        &self,
        record: &BookRecord,
        user: &UserCode,
        kind: TransitionKind,
    ) -> AppResult<()> {
        let mut data = self.data.write().await;
        let name = data
            .directory
            .values()
            .find(|entry| entry.code.trim() == user.as_str())
            .map(|entry| entry.name.clone())
            .unwrap_or_else(|| user.to_string());

        let stored = data
            .books
            .iter_mut()
            .find(|stored| stored.id == record.id)
            .ok_or_else(|| AppError::NotFound(format!("Book record {} not found", record.id)))?;

        if stored.revision != record.revision {
            return Err(AppError::Conflict(format!(
                "Book record {} changed (revision {} != {})",
                record.id, stored.revision, record.revision
            )));
        }

        match kind {
            TransitionKind::Borrow => {
                if !stored.is_available() {
                    return Err(AppError::BusinessRule(format!(
                        "Book record {} is not on the shelf",
                        record.id
                    )));
                }
                stored.set_loan(
                    LoanStatus::OnLoan,
                    vec![Assignee {
                        code: user.to_string(),
                        name,
                    }],
                );
            }
            TransitionKind::Return => {
                if !stored.is_borrowed_by(user) {
                    return Err(AppError::BusinessRule(format!(
                        "Book record {} is not borrowed by {}",
                        record.id, user
                    )));
                }
                stored.set_loan(LoanStatus::Available, Vec::new());
            }
        }

        tracing::info!("Book record {}: {} by {}", record.id, kind, user);
        self.persist(&data).await
    }

    async fn append_audit(&self, system_id: &str, entry: &AuditEntry) -> AppResult<()> {
        let line = AuditLine {
            logged_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            system_id,
            message: entry,
        };
        let mut json = serde_json::to_string(&line)?;
        json.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)
            .await?;
        file.write_all(json.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
