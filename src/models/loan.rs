//! Loan transitions, transaction outcomes and audit entries

use serde::{Deserialize, Serialize};
use std::fmt;

use super::user::{EmployeeId, UserCode};

/// Marker written in place of a user code when resolution failed
pub const UNRESOLVED_USER_MARKER: &str = "failed to fetch user code";
/// Message of the audit entry written after an ID card is scanned
pub const CARD_SCANNED_MESSAGE: &str = "id card scanned";

/// State transition requested from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Borrow,
    Return,
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionKind::Borrow => f.write_str("borrow"),
            TransitionKind::Return => f.write_str("return"),
        }
    }
}

/// Terminal classification of one lending transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    Borrowed,
    Returned,
    /// Display names of everyone currently holding a matching copy
    AlreadyBorrowedByOther(Vec<String>),
    NotRegistered,
    ExternalError,
    UserResolutionFailed,
    BarcodeTimedOut,
}

impl TransactionOutcome {
    /// Literal message persisted to the audit log
    pub fn audit_message(&self) -> &'static str {
        match self {
            TransactionOutcome::Borrowed => "successfully borrowed a book",
            TransactionOutcome::Returned => "successfully returned a book",
            TransactionOutcome::AlreadyBorrowedByOther(_) => "book has already been borrowed",
            TransactionOutcome::NotRegistered => "book is not registered",
            TransactionOutcome::ExternalError => "catalog returned an error",
            TransactionOutcome::UserResolutionFailed => UNRESOLVED_USER_MARKER,
            TransactionOutcome::BarcodeTimedOut => "timed out",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TransactionOutcome::Borrowed | TransactionOutcome::Returned)
    }
}

impl fmt::Display for TransactionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.audit_message())
    }
}

/// Structured message appended to the audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuditEntry {
    /// An ID card was scanned and (maybe) resolved
    CardScanned {
        employee_id: String,
        user_code: String,
        message: String,
    },
    /// A transaction reached its outcome
    Completed {
        user_code: String,
        book_isbn: Option<String>,
        message: String,
    },
}

impl AuditEntry {
    pub fn card_scanned(employee_id: &EmployeeId, user_code: Option<&UserCode>) -> Self {
        AuditEntry::CardScanned {
            employee_id: employee_id.to_string(),
            user_code: user_code
                .map(|code| code.to_string())
                .unwrap_or_else(|| UNRESOLVED_USER_MARKER.to_string()),
            message: CARD_SCANNED_MESSAGE.to_string(),
        }
    }

    pub fn completed(
        user_code: &UserCode,
        barcode: Option<&str>,
        outcome: &TransactionOutcome,
    ) -> Self {
        AuditEntry::Completed {
            user_code: user_code.to_string(),
            book_isbn: barcode.map(str::to_string),
            message: outcome.audit_message().to_string(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AuditEntry::CardScanned { message, .. } | AuditEntry::Completed { message, .. } => {
                message
            }
        }
    }
}
