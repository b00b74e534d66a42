//! Fakes for the kiosk collaborators
//!
//! These record every call so tests can assert on what the lending
//! procedure asked for without real hardware or a catalog service.

#![allow(dead_code)]

use async_trait::async_trait;
use lending_kiosk::{
    devices::{DisplaySink, Feedback, FeedbackSink, IdScanner},
    error::{AppError, AppResult, ResolveError, ScanError},
    input::BarcodeSource,
    models::{
        book::{AVAILABLE_LABEL, GENRE_FIELD, ISBN13_FIELD, ISBN10_FIELD, ON_LOAN_LABEL},
        Assignee, AuditEntry, BookRecord, EmployeeId, FieldValue, Isbn, LoanStatus,
        TransitionKind, UserCode,
    },
    services::{KioskSession, LendingProcedure, LendingSettings},
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Build a record the way the catalog stores one copy
pub fn book_record(id: &str, isbn: &str, genre: &str, borrowed_by: Option<&str>) -> BookRecord {
    let (status, assignees) = match borrowed_by {
        None => (AVAILABLE_LABEL, vec![]),
        Some(code) => (
            ON_LOAN_LABEL,
            vec![Assignee {
                code: code.to_string(),
                name: "佐藤".to_string(),
            }],
        ),
    };
    let isbn_field = if isbn.len() == 10 { ISBN10_FIELD } else { ISBN13_FIELD };

    BookRecord::new(id)
        .with_field(isbn_field, FieldValue::Text(isbn.to_string()))
        .with_field(GENRE_FIELD, FieldValue::SingleSelect(genre.to_string()))
        .with_field("status", FieldValue::Status(status.to_string()))
        .with_field("assignee", FieldValue::Assignees(assignees))
}

pub struct FakeCatalog {
    users: HashMap<String, String>,
    records: Vec<BookRecord>,
    fail_transitions: bool,
    calls: Mutex<HashMap<&'static str, usize>>,
    audits: Mutex<Vec<(String, AuditEntry)>>,
}

impl FakeCatalog {
    pub fn new(users: &[(&str, &str)], records: Vec<BookRecord>) -> Self {
        Self {
            users: users
                .iter()
                .map(|(id, code)| (id.to_string(), code.to_string()))
                .collect(),
            records,
            fail_transitions: false,
            calls: Mutex::new(HashMap::new()),
            audits: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_transitions(mut self) -> Self {
        self.fail_transitions = true;
        self
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls.lock().unwrap().get(operation).copied().unwrap_or(0)
    }

    pub fn audits(&self) -> Vec<(String, AuditEntry)> {
        self.audits.lock().unwrap().clone()
    }

    pub fn completed_entries(&self) -> Vec<AuditEntry> {
        self.audits()
            .into_iter()
            .map(|(_, entry)| entry)
            .filter(|entry| matches!(entry, AuditEntry::Completed { .. }))
            .collect()
    }

    fn count(&self, operation: &'static str) {
        *self.calls.lock().unwrap().entry(operation).or_insert(0) += 1;
    }
}

#[async_trait]
impl lending_kiosk::repository::Catalog for FakeCatalog {
    async fn resolve_user(&self, employee_id: &EmployeeId) -> Result<UserCode, ResolveError> {
        self.count("resolve_user");
        let code = self
            .users
            .get(employee_id.as_str())
            .ok_or_else(|| ResolveError::NotFound(employee_id.to_string()))?;
        UserCode::parse(code).ok_or_else(|| ResolveError::Blank(employee_id.to_string()))
    }

    async fn find_records(&self, isbn: &Isbn) -> AppResult<Vec<BookRecord>> {
        self.count("find_records");
        Ok(self
            .records
            .iter()
            .filter(|record| record.matches_isbn(isbn))
            .cloned()
            .collect())
    }

    async fn request_transition(
        &self,
        record: &BookRecord,
        _user: &UserCode,
        kind: TransitionKind,
    ) -> AppResult<()> {
        let (operation, required) = match kind {
            TransitionKind::Borrow => ("borrow", LoanStatus::Available),
            TransitionKind::Return => ("return", LoanStatus::OnLoan),
        };
        self.count(operation);

        if self.fail_transitions {
            return Err(AppError::Catalog("GAIA_CO02: revision mismatch".into()));
        }
        if record.status() != Some(required) {
            return Err(AppError::BusinessRule(format!("cannot {} record {}", kind, record.id)));
        }
        Ok(())
    }

    async fn append_audit(&self, system_id: &str, entry: &AuditEntry) -> AppResult<()> {
        self.audits
            .lock()
            .unwrap()
            .push((system_id.to_string(), entry.clone()));
        Ok(())
    }
}

/// Scanner replaying scripted results, then blocking until cancelled
pub struct ScriptedScanner {
    script: Mutex<VecDeque<Result<Option<EmployeeId>, ScanError>>>,
    cancelled: watch::Sender<bool>,
}

impl ScriptedScanner {
    pub fn new(ids: &[&str]) -> Self {
        let script = ids
            .iter()
            .map(|id| Ok(Some(EmployeeId::new(*id))))
            .collect();
        Self::with_script(script)
    }

    pub fn with_script(script: VecDeque<Result<Option<EmployeeId>, ScanError>>) -> Self {
        let (cancelled, _) = watch::channel(false);
        Self {
            script: Mutex::new(script),
            cancelled,
        }
    }

    pub fn cancel_requested(&self) -> bool {
        *self.cancelled.borrow()
    }
}

#[async_trait]
impl IdScanner for ScriptedScanner {
    async fn scan(&self) -> Result<Option<EmployeeId>, ScanError> {
        let next = self.script.lock().unwrap().pop_front();
        if let Some(result) = next {
            return result;
        }

        let mut cancelled = self.cancelled.subscribe();
        let _ = cancelled.wait_for(|cancelled| *cancelled).await;
        Ok(None)
    }

    fn request_cancel(&self) {
        self.cancelled.send_replace(true);
    }
}

/// Barcode source replaying scripted lines; `None` entries are timeouts.
///
/// Once the script is exhausted `try_take` never returns.
pub struct ScriptedBarcodes {
    lines: VecDeque<Option<String>>,
    requests: Arc<AtomicUsize>,
    timeouts: Vec<Option<Duration>>,
}

impl ScriptedBarcodes {
    pub fn new(lines: &[Option<&str>]) -> Self {
        Self {
            lines: lines.iter().map(|line| line.map(str::to_string)).collect(),
            requests: Arc::new(AtomicUsize::new(0)),
            timeouts: Vec::new(),
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn timeouts(&self) -> &[Option<Duration>] {
        &self.timeouts
    }
}

#[async_trait]
impl BarcodeSource for ScriptedBarcodes {
    fn request_next(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    async fn try_take(&mut self, timeout: Option<Duration>) -> Option<String> {
        self.timeouts.push(timeout);
        match self.lines.pop_front() {
            Some(line) => line,
            None => std::future::pending().await,
        }
    }
}

#[derive(Default)]
pub struct RecordingFeedback {
    messages: Mutex<Vec<Feedback>>,
    chimes: AtomicUsize,
}

impl RecordingFeedback {
    pub fn texts(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|feedback| feedback.text.clone())
            .collect()
    }

    pub fn last(&self) -> Option<Feedback> {
        self.messages.lock().unwrap().last().cloned()
    }

    pub fn chimes(&self) -> usize {
        self.chimes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedbackSink for RecordingFeedback {
    async fn put(&self, feedback: Feedback) {
        self.messages.lock().unwrap().push(feedback);
    }

    async fn chime(&self) {
        self.chimes.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingDisplay {
    shown: Mutex<Vec<String>>,
    hides: AtomicUsize,
}

impl RecordingDisplay {
    pub fn shown(&self) -> Vec<String> {
        self.shown.lock().unwrap().clone()
    }

    pub fn hides(&self) -> usize {
        self.hides.load(Ordering::SeqCst)
    }
}

impl DisplaySink for RecordingDisplay {
    fn show(&self, genre: &str) -> AppResult<()> {
        self.shown.lock().unwrap().push(genre.to_string());
        Ok(())
    }

    fn hide(&self) {
        self.hides.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Desk {
    pub catalog: Arc<FakeCatalog>,
    pub scanner: Arc<ScriptedScanner>,
    pub feedback: Arc<RecordingFeedback>,
    pub display: Arc<RecordingDisplay>,
    pub session: KioskSession,
    pub procedure: LendingProcedure<ScriptedBarcodes>,
}

/// Wire a procedure to fakes
pub fn desk(catalog: FakeCatalog, scanner: ScriptedScanner, barcodes: ScriptedBarcodes) -> Desk {
    let catalog = Arc::new(catalog);
    let scanner = Arc::new(scanner);
    let feedback = Arc::new(RecordingFeedback::default());
    let display = Arc::new(RecordingDisplay::default());

    let settings = LendingSettings {
        system_id: "desk-test".to_string(),
        scan_retry_delay: Duration::ZERO,
        ..LendingSettings::default()
    };
    let procedure = LendingProcedure::new(
        scanner.clone(),
        catalog.clone(),
        feedback.clone(),
        barcodes,
        settings,
    );

    Desk {
        session: KioskSession::new(display.clone()),
        catalog,
        scanner,
        feedback,
        display,
        procedure,
    }
}
