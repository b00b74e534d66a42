//! Messages shown and spoken at the desk

use crate::{
    devices::Feedback,
    models::{EmployeeId, TransactionOutcome},
};

/// Every notable event the desk reports to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    EmployeeIdScanned(EmployeeId),
    ScanFailed,
    UserResolutionFailed,
    ScanBarcode,
    TimedOut,
    NotAnIsbn,
    AlreadyBorrowed(Vec<String>),
    NotRegistered,
    Borrowed,
    Returned,
    CatalogError,
}

impl Notice {
    pub fn log_text(&self) -> String {
        match self {
            Notice::EmployeeIdScanned(id) => format!("scanned employee id: {}", id),
            Notice::ScanFailed => "failed to scan employee id".to_string(),
            Notice::UserResolutionFailed => "failed to fetch user code".to_string(),
            Notice::ScanBarcode => "please scan the barcode of your book".to_string(),
            Notice::TimedOut => "timed out".to_string(),
            Notice::NotAnIsbn => "barcode is not an ISBN".to_string(),
            Notice::AlreadyBorrowed(names) => format!(
                "this book has already been borrowed by {}",
                honorific_names(names)
            ),
            Notice::NotRegistered => {
                "this book is not registered (please contact the librarians)".to_string()
            }
            Notice::Borrowed => "successfully borrowed a book".to_string(),
            Notice::Returned => "successfully returned a book".to_string(),
            Notice::CatalogError => "catalog returned an error".to_string(),
        }
    }

    pub fn speech(&self) -> Option<String> {
        let phrase = match self {
            Notice::EmployeeIdScanned(_) => return None,
            Notice::ScanFailed => "社員番号の読み取りに失敗しました。もう一度タッチしてください。",
            Notice::UserResolutionFailed => {
                "社員番号を確認できませんでした。図書委員まで連絡してください。"
            }
            Notice::ScanBarcode => "きゅうななで始まるバーコードをスキャンしてください",
            Notice::TimedOut => "timeout",
            Notice::NotAnIsbn => "違うほうのバーコードをスキャンしてください",
            Notice::AlreadyBorrowed(names) => {
                return Some(format!("{}がすでに借りています", honorific_names(names)))
            }
            Notice::NotRegistered => "この本は未登録のようです。図書委員まで連絡してください。",
            Notice::Borrowed => "かしだし手続きが完了しました",
            Notice::Returned => "返却手続きが完了しました",
            Notice::CatalogError => "カタログがエラーを返しました",
        };
        Some(phrase.to_string())
    }

    pub fn feedback(&self) -> Feedback {
        Feedback {
            text: self.log_text(),
            speech: self.speech(),
        }
    }
}

impl From<&TransactionOutcome> for Notice {
    fn from(outcome: &TransactionOutcome) -> Self {
        match outcome {
            TransactionOutcome::Borrowed => Notice::Borrowed,
            TransactionOutcome::Returned => Notice::Returned,
            TransactionOutcome::AlreadyBorrowedByOther(names) => {
                Notice::AlreadyBorrowed(names.clone())
            }
            TransactionOutcome::NotRegistered => Notice::NotRegistered,
            TransactionOutcome::ExternalError => Notice::CatalogError,
            TransactionOutcome::UserResolutionFailed => Notice::UserResolutionFailed,
            TransactionOutcome::BarcodeTimedOut => Notice::TimedOut,
        }
    }
}

fn honorific_names(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("{}さん", name))
        .collect::<Vec<_>>()
        .join(" ")
}
