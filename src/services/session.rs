//! Kiosk session: termination signal, display scope and the driving loop

use std::sync::Arc;
use tokio::sync::watch;

use super::lending::LendingProcedure;
use crate::{devices::DisplaySink, input::BarcodeSource};

/// Cooperative termination flag that can also be awaited
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once [`Shutdown::trigger`] has been called
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|triggered| *triggered).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts of one [`KioskSession::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Transactions that reached an outcome
    pub completed: usize,
    /// Completed transactions that borrowed or returned a book
    pub succeeded: usize,
}

/// State shared by every transaction of a running desk.
///
/// Cloning gives another handle to the same session, e.g. for a signal
/// handler that calls [`KioskSession::terminate`].
#[derive(Clone)]
pub struct KioskSession {
    display: Arc<dyn DisplaySink>,
    shutdown: Shutdown,
}

impl KioskSession {
    pub fn new(display: Arc<dyn DisplaySink>) -> Self {
        Self {
            display,
            shutdown: Shutdown::new(),
        }
    }

    pub fn display(&self) -> &dyn DisplaySink {
        self.display.as_ref()
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Stop after the current blocking point; the open transaction is abandoned
    pub fn terminate(&self) {
        tracing::info!("Kiosk session termination requested");
        self.shutdown.trigger();
    }

    pub fn is_terminated(&self) -> bool {
        self.shutdown.is_triggered()
    }

    /// Run transactions until the session is terminated.
    ///
    /// The display is hidden when the loop exits, however it exits.
    pub async fn run<B: BarcodeSource>(&self, procedure: &mut LendingProcedure<B>) -> RunSummary {
        let _display = DisplayScope(self.display());
        let mut summary = RunSummary::default();

        tracing::info!("Kiosk session started");
        while !self.is_terminated() {
            match procedure.process_once(self).await {
                Some(outcome) => {
                    summary.completed += 1;
                    if outcome.is_success() {
                        summary.succeeded += 1;
                    }
                }
                None => tracing::debug!("Transaction abandoned"),
            }
        }

        tracing::info!(
            "Kiosk session stopped after {} transactions ({} successful)",
            summary.completed,
            summary.succeeded
        );
        summary
    }
}

struct DisplayScope<'a>(&'a dyn DisplaySink);

impl Drop for DisplayScope<'_> {
    fn drop(&mut self) {
        self.0.hide();
    }
}
