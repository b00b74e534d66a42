//! Catalog, directory and audit log access

pub mod json;

use async_trait::async_trait;

use crate::{
    error::{AppResult, ResolveError},
    models::{AuditEntry, BookRecord, EmployeeId, Isbn, TransitionKind, UserCode},
};

pub use json::JsonCatalog;

/// External service holding the staff directory, the book catalog and the
/// audit log
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Resolve a scanned employee id to a directory user code
    async fn resolve_user(&self, employee_id: &EmployeeId) -> Result<UserCode, ResolveError>;

    /// All copies registered under `isbn`
    async fn find_records(&self, isbn: &Isbn) -> AppResult<Vec<BookRecord>>;

    /// Borrow or return `record` on behalf of `user`
    async fn request_transition(
        &self,
        record: &BookRecord,
        user: &UserCode,
        kind: TransitionKind,
    ) -> AppResult<()>;

    /// Append a structured entry to the audit log under `system_id`
    async fn append_audit(&self, system_id: &str, entry: &AuditEntry) -> AppResult<()>;
}
