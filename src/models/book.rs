//! Catalog book records
//!
//! Records are owned by the external catalog. Each field carries its kind
//! (`SINGLE_LINE_TEXT`, `DROP_DOWN`, `STATUS`, `STATUS_ASSIGNEE`) so the
//! lending logic only ever reads them through the typed accessors below.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::user::UserCode;
use crate::error::{AppError, AppResult};

/// Field holding the 10 digit ISBN
pub const ISBN10_FIELD: &str = "isbn";
/// Field holding the 13 digit ISBN
pub const ISBN13_FIELD: &str = "isbn13";
/// Drop-down field holding the genre label
pub const GENRE_FIELD: &str = "type";

/// Status label of a copy standing on the shelf
pub const AVAILABLE_LABEL: &str = "本棚にあります";
/// Status label of a copy out on loan
pub const ON_LOAN_LABEL: &str = "レンタル中";

/// Person a record is currently assigned to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub code: String,
    pub name: String,
}

impl Assignee {
    /// Name with ASCII and ideographic spaces removed, as read out loud
    pub fn display_name(&self) -> String {
        self.name
            .chars()
            .filter(|c| *c != ' ' && *c != '\u{3000}')
            .collect()
    }
}

/// Typed record field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum FieldValue {
    #[serde(rename = "SINGLE_LINE_TEXT")]
    Text(String),
    #[serde(rename = "DROP_DOWN")]
    SingleSelect(String),
    #[serde(rename = "STATUS")]
    Status(String),
    #[serde(rename = "STATUS_ASSIGNEE")]
    Assignees(Vec<Assignee>),
}

/// Loan status of a copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanStatus {
    Available,
    OnLoan,
    Other(String),
}

impl LoanStatus {
    pub fn from_label(label: &str) -> Self {
        match label {
            AVAILABLE_LABEL => LoanStatus::Available,
            ON_LOAN_LABEL => LoanStatus::OnLoan,
            other => LoanStatus::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            LoanStatus::Available => AVAILABLE_LABEL,
            LoanStatus::OnLoan => ON_LOAN_LABEL,
            LoanStatus::Other(label) => label,
        }
    }
}

/// ISBN read from a barcode; the literal length selects the catalog field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Isbn {
    Isbn10(String),
    Isbn13(String),
}

impl Isbn {
    pub fn parse(barcode: &str) -> AppResult<Self> {
        match barcode.len() {
            10 => Ok(Isbn::Isbn10(barcode.to_string())),
            13 => Ok(Isbn::Isbn13(barcode.to_string())),
            _ => Err(AppError::Validation(format!(
                "invalid ISBN length: {}",
                barcode
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Isbn::Isbn10(isbn) | Isbn::Isbn13(isbn) => isbn,
        }
    }

    /// Record field this ISBN is matched against
    pub fn field_name(&self) -> &'static str {
        match self {
            Isbn::Isbn10(_) => ISBN10_FIELD,
            Isbn::Isbn13(_) => ISBN13_FIELD,
        }
    }
}

/// One physical copy as stored in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: String,
    #[serde(default)]
    pub revision: u64,
    pub fields: IndexMap<String, FieldValue>,
}

impl BookRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            revision: 1,
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Text of a single line or drop-down field
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name)? {
            FieldValue::Text(value) | FieldValue::SingleSelect(value) => Some(value),
            _ => None,
        }
    }

    pub fn genre(&self) -> Option<&str> {
        self.text(GENRE_FIELD)
    }

    pub fn matches_isbn(&self, isbn: &Isbn) -> bool {
        self.text(isbn.field_name()) == Some(isbn.as_str())
    }

    /// Status of the first status field, if the record has one
    pub fn status(&self) -> Option<LoanStatus> {
        self.fields.values().find_map(|field| match field {
            FieldValue::Status(label) => Some(LoanStatus::from_label(label)),
            _ => None,
        })
    }

    /// Current assignees; empty when the record has no assignee field
    pub fn borrowers(&self) -> &[Assignee] {
        self.fields
            .values()
            .find_map(|field| match field {
                FieldValue::Assignees(assignees) => Some(assignees.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn is_available(&self) -> bool {
        self.status() == Some(LoanStatus::Available)
    }

    /// True when `user` holds this copy and it is marked as on loan
    pub fn is_borrowed_by(&self, user: &UserCode) -> bool {
        self.borrowers().iter().any(|a| a.code == user.as_str())
            && self.status() == Some(LoanStatus::OnLoan)
    }

    /// Overwrite status and assignees after a transition
    pub fn set_loan(&mut self, status: LoanStatus, borrowers: Vec<Assignee>) {
        for field in self.fields.values_mut() {
            match field {
                FieldValue::Status(label) => *label = status.label().to_string(),
                FieldValue::Assignees(assignees) => *assignees = borrowers.clone(),
                _ => {}
            }
        }
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: &str, borrowers: &[&str]) -> BookRecord {
        BookRecord::new("1")
            .with_field(ISBN13_FIELD, FieldValue::Text("9784789838078".into()))
            .with_field(GENRE_FIELD, FieldValue::SingleSelect("PGその他[棚6]".into()))
            .with_field("状態", FieldValue::Status(status.into()))
            .with_field(
                "作業者",
                FieldValue::Assignees(
                    borrowers
                        .iter()
                        .map(|code| Assignee {
                            code: code.to_string(),
                            name: "佐藤 太郎".into(),
                        })
                        .collect(),
                ),
            )
    }

    #[test]
    fn test_field_kinds_deserialize_from_tagged_json() {
        let json = r#"{
            "id": "42",
            "fields": {
                "isbn": {"type": "SINGLE_LINE_TEXT", "value": "4789838072"},
                "type": {"type": "DROP_DOWN", "value": "設計"},
                "status": {"type": "STATUS", "value": "レンタル中"},
                "assignee": {"type": "STATUS_ASSIGNEE", "value": [{"code": "u1", "name": "佐藤"}]}
            }
        }"#;
        let record: BookRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.revision, 0);
        assert_eq!(record.genre(), Some("設計"));
        assert_eq!(record.status(), Some(LoanStatus::OnLoan));
        assert_eq!(record.borrowers().len(), 1);
        assert!(record.matches_isbn(&Isbn::parse("4789838072").unwrap()));
    }

    #[test]
    fn test_borrowed_requires_on_loan_status() {
        let user = UserCode::parse("hoge-user").unwrap();
        assert!(record(ON_LOAN_LABEL, &["hoge-user"]).is_borrowed_by(&user));
        assert!(!record(AVAILABLE_LABEL, &["hoge-user"]).is_borrowed_by(&user));
        assert!(!record(ON_LOAN_LABEL, &["other"]).is_borrowed_by(&user));
    }

    #[test]
    fn test_missing_assignee_field_has_no_borrowers() {
        let record = BookRecord::new("1").with_field("status", FieldValue::Status(AVAILABLE_LABEL.into()));
        assert!(record.borrowers().is_empty());
        assert!(record.is_available());
    }

    #[test]
    fn test_display_name_strips_spaces() {
        let assignee = Assignee {
            code: "u".into(),
            name: "佐藤 　太郎".into(),
        };
        assert_eq!(assignee.display_name(), "佐藤太郎");
    }

    #[test]
    fn test_isbn_field_selected_by_length() {
        assert_eq!(Isbn::parse("4789838072").unwrap().field_name(), ISBN10_FIELD);
        assert_eq!(Isbn::parse("9784789838078").unwrap().field_name(), ISBN13_FIELD);
        assert!(Isbn::parse("97847898").is_err());
    }

    #[test]
    fn test_set_loan_updates_fields_and_revision() {
        let mut record = record(AVAILABLE_LABEL, &[]);
        record.set_loan(
            LoanStatus::OnLoan,
            vec![Assignee {
                code: "hoge-user".into(),
                name: "hoge".into(),
            }],
        );
        assert_eq!(record.revision, 2);
        assert!(record.is_borrowed_by(&UserCode::parse("hoge-user").unwrap()));
    }
}
