//! Data models for the lending kiosk

pub mod book;
pub mod loan;
pub mod user;

// Re-export commonly used types
pub use book::{Assignee, BookRecord, FieldValue, Isbn, LoanStatus};
pub use loan::{AuditEntry, TransactionOutcome, TransitionKind};
pub use user::{EmployeeId, UserCode};
