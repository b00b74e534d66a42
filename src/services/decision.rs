//! Borrow or return decision for a scanned book

use crate::models::{BookRecord, TransitionKind, UserCode};

/// What to do with the copies matching a barcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<'a> {
    Transition {
        kind: TransitionKind,
        record: &'a BookRecord,
    },
    /// No copy is free; holds the display names of every current borrower
    AlreadyBorrowed(Vec<String>),
    NotRegistered,
}

/// Decide the action for `user` against every copy matching one barcode.
///
/// A copy held by `user` is returned. Otherwise the first copy on the shelf
/// is borrowed. Otherwise the borrowers of all copies are reported, and a
/// barcode with no borrowers at all is treated as unregistered.
pub fn decide<'a>(records: &'a [BookRecord], user: &UserCode) -> Decision<'a> {
    if let Some(record) = records.iter().find(|r| r.is_borrowed_by(user)) {
        return Decision::Transition {
            kind: TransitionKind::Return,
            record,
        };
    }

    if let Some(record) = records.iter().find(|r| r.is_available()) {
        return Decision::Transition {
            kind: TransitionKind::Borrow,
            record,
        };
    }

    let names: Vec<String> = records
        .iter()
        .flat_map(|r| r.borrowers())
        .map(|a| a.display_name())
        .collect();
    if names.is_empty() {
        Decision::NotRegistered
    } else {
        Decision::AlreadyBorrowed(names)
    }
}
