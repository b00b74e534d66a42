//! ID card reader that types the employee id followed by a newline

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};

use super::IdScanner;
use crate::{
    error::ScanError,
    input::{AsyncLineSource, BarcodeSource},
    models::EmployeeId,
};

/// [`IdScanner`] over a keyboard-emulating card reader.
///
/// Each tap produces one line on the reader's stream. Cancellation is
/// permanent: once requested, every scan returns `Ok(None)`.
#[derive(Debug)]
pub struct LineCardReader {
    source: Mutex<AsyncLineSource>,
    cancel_tx: watch::Sender<bool>,
}

impl LineCardReader {
    pub fn new(source: AsyncLineSource) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            source: Mutex::new(source),
            cancel_tx,
        }
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }
}

#[async_trait]
impl IdScanner for LineCardReader {
    async fn scan(&self) -> Result<Option<EmployeeId>, ScanError> {
        let mut cancelled = self.cancel_tx.subscribe();
        if self.is_cancelled() {
            return Ok(None);
        }

        let mut source = self.source.lock().await;
        source.request_next();

        let line = tokio::select! {
            biased;

            _ = cancelled.wait_for(|cancelled| *cancelled) => return Ok(None),
            line = source.try_take(None) => line,
        };

        match line {
            Some(line) => {
                let id = line.trim();
                if id.is_empty() {
                    Err(ScanError::NoEmployeeId(line))
                } else {
                    Ok(Some(EmployeeId::new(id)))
                }
            }
            None => Err(ScanError::Closed),
        }
    }

    fn request_cancel(&self) {
        self.cancel_tx.send_replace(true);
    }
}
