//! Lending transaction state machine
//!
//! One transaction: wait for an ID card, resolve it against the directory,
//! wait for a book barcode, decide between borrowing and returning, ask the
//! catalog for the transition, then report and audit the outcome.

use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

use super::{
    decision::{decide, Decision},
    messages::Notice,
    session::KioskSession,
};
use crate::{
    config::KioskConfig,
    devices::{FeedbackSink, IdScanner},
    error::ScanError,
    input::BarcodeSource,
    models::{AuditEntry, EmployeeId, Isbn, TransactionOutcome, TransitionKind, UserCode},
    repository::Catalog,
};

/// Tunables of the lending procedure
#[derive(Debug, Clone)]
pub struct LendingSettings {
    /// Audit subject id of this desk
    pub system_id: String,
    pub barcode_timeout: Duration,
    /// Barcodes not starting with this prefix are rejected as non-ISBN
    pub isbn_prefix: String,
    pub scan_retry_delay: Duration,
}

impl Default for LendingSettings {
    fn default() -> Self {
        Self::from(&KioskConfig::default())
    }
}

impl From<&KioskConfig> for LendingSettings {
    fn from(config: &KioskConfig) -> Self {
        Self {
            system_id: config.system_id.clone(),
            barcode_timeout: Duration::from_secs(config.barcode_timeout_secs),
            isbn_prefix: config.isbn_prefix.clone(),
            scan_retry_delay: Duration::from_millis(config.scan_retry_delay_ms),
        }
    }
}

enum BarcodeScan {
    Accepted(String),
    TimedOut,
    Cancelled,
}

/// Runs lending transactions one at a time
pub struct LendingProcedure<B> {
    scanner: Arc<dyn IdScanner>,
    catalog: Arc<dyn Catalog>,
    feedback: Arc<dyn FeedbackSink>,
    barcodes: B,
    settings: LendingSettings,
}

impl<B: BarcodeSource> LendingProcedure<B> {
    pub fn new(
        scanner: Arc<dyn IdScanner>,
        catalog: Arc<dyn Catalog>,
        feedback: Arc<dyn FeedbackSink>,
        barcodes: B,
        settings: LendingSettings,
    ) -> Self {
        Self {
            scanner,
            catalog,
            feedback,
            barcodes,
            settings,
        }
    }

    pub fn barcodes(&self) -> &B {
        &self.barcodes
    }

    /// Run a single transaction.
    ///
    /// Returns `None` when the session was terminated before the transaction
    /// reached an outcome; nothing is audited for the unfinished part then.
    pub async fn process_once(&mut self, session: &KioskSession) -> Option<TransactionOutcome> {
        let employee_id = self.scan_employee_id(session).await?;

        let span = tracing::info_span!("transaction", id = %Uuid::new_v4());
        self.transact(session, employee_id).instrument(span).await
    }

    async fn transact(
        &mut self,
        session: &KioskSession,
        employee_id: EmployeeId,
    ) -> Option<TransactionOutcome> {
        self.notify(Notice::EmployeeIdScanned(employee_id.clone())).await;
        self.feedback.chime().await;
        session.display().hide();

        let user_code = match self.catalog.resolve_user(&employee_id).await {
            Ok(code) => {
                tracing::info!("Employee {} resolved to {}", employee_id, code);
                Some(code)
            }
            Err(e) => {
                tracing::warn!("Failed to resolve employee {}: {}", employee_id, e);
                None
            }
        };
        self.audit(AuditEntry::card_scanned(&employee_id, user_code.as_ref()))
            .await;

        let Some(user_code) = user_code else {
            let outcome = TransactionOutcome::UserResolutionFailed;
            self.notify(Notice::from(&outcome)).await;
            return Some(outcome);
        };

        let barcode = match self.scan_barcode(session).await {
            BarcodeScan::Accepted(barcode) => Some(barcode),
            BarcodeScan::TimedOut => None,
            BarcodeScan::Cancelled => {
                tracing::info!("Transaction cancelled while waiting for a barcode");
                return None;
            }
        };

        let (outcome, genre) = match &barcode {
            Some(barcode) => self.settle(&user_code, barcode).await,
            None => (TransactionOutcome::BarcodeTimedOut, None),
        };

        self.notify(Notice::from(&outcome)).await;
        if let Some(genre) = genre {
            if let Err(e) = session.display().show(&genre) {
                tracing::warn!("Failed to show shelf for {}: {}", genre, e);
            }
        }
        self.audit(AuditEntry::completed(&user_code, barcode.as_deref(), &outcome))
            .await;

        tracing::info!("Transaction finished: {}", outcome);
        Some(outcome)
    }

    async fn scan_employee_id(&self, session: &KioskSession) -> Option<EmployeeId> {
        loop {
            if session.is_terminated() {
                return None;
            }

            let scan = self.scanner.scan();
            tokio::pin!(scan);
            let result = tokio::select! {
                biased;

                result = &mut scan => result,
                _ = session.shutdown().wait() => {
                    self.scanner.request_cancel();
                    scan.await
                }
            };

            match result {
                Ok(Some(employee_id)) => return Some(employee_id),
                Ok(None) => return None,
                Err(ScanError::Closed) => {
                    tracing::error!("ID card reader stream closed, stopping the kiosk session");
                    session.terminate();
                    return None;
                }
                Err(e) => {
                    tracing::warn!("ID card scan failed: {}", e);
                    self.notify(Notice::ScanFailed).await;
                    tokio::time::sleep(self.settings.scan_retry_delay).await;
                }
            }
        }
    }

    async fn scan_barcode(&mut self, session: &KioskSession) -> BarcodeScan {
        self.barcodes.request_next();
        self.notify(Notice::ScanBarcode).await;

        loop {
            let line = tokio::select! {
                biased;

                _ = session.shutdown().wait() => return BarcodeScan::Cancelled,
                line = self.barcodes.try_take(Some(self.settings.barcode_timeout)) => line,
            };

            let Some(line) = line else {
                tracing::info!("No barcode within {:?}", self.settings.barcode_timeout);
                return BarcodeScan::TimedOut;
            };

            let barcode = line.trim();
            if barcode.starts_with(self.settings.isbn_prefix.as_str()) {
                return BarcodeScan::Accepted(barcode.to_string());
            }

            tracing::debug!("Rejected non-ISBN barcode {:?}", barcode);
            self.barcodes.request_next();
            self.notify(Notice::NotAnIsbn).await;
        }
    }

    /// Look the barcode up, decide and request the transition.
    ///
    /// The genre is only returned for a completed return.
    async fn settle(&self, user: &UserCode, barcode: &str) -> (TransactionOutcome, Option<String>) {
        let isbn = match Isbn::parse(barcode) {
            Ok(isbn) => isbn,
            Err(e) => {
                tracing::warn!("{}", e);
                return (TransactionOutcome::NotRegistered, None);
            }
        };

        let records = match self.catalog.find_records(&isbn).await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("Catalog lookup for {} failed: {}", barcode, e);
                return (TransactionOutcome::ExternalError, None);
            }
        };
        tracing::debug!("Found {} records for {}", records.len(), barcode);

        match decide(&records, user) {
            Decision::NotRegistered => (TransactionOutcome::NotRegistered, None),
            Decision::AlreadyBorrowed(names) => {
                (TransactionOutcome::AlreadyBorrowedByOther(names), None)
            }
            Decision::Transition { kind, record } => {
                match self.catalog.request_transition(record, user, kind).await {
                    Ok(()) => match kind {
                        TransitionKind::Borrow => (TransactionOutcome::Borrowed, None),
                        TransitionKind::Return => (
                            TransactionOutcome::Returned,
                            record.genre().map(str::to_string),
                        ),
                    },
                    Err(e) => {
                        tracing::error!("Catalog refused {} of record {}: {}", kind, record.id, e);
                        (TransactionOutcome::ExternalError, None)
                    }
                }
            }
        }
    }

    async fn notify(&self, notice: Notice) {
        self.feedback.put(notice.feedback()).await;
    }

    async fn audit(&self, entry: AuditEntry) {
        if let Err(e) = self
            .catalog
            .append_audit(&self.settings.system_id, &entry)
            .await
        {
            tracing::error!("Failed to append audit entry {:?}: {}", entry.message(), e);
        }
    }
}
