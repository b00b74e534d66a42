//! Request-gated line delivery from a continuously read byte stream
//!
//! A background task reads the stream for the whole process lifetime and
//! frames it into lines. A line is only handed to the consumer when the
//! consumer armed the source with [`BarcodeSource::request_next`] before the
//! line arrived; everything else is dropped so that a later request is never
//! satisfied by stale input.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::line_buffer::LineBuffer;
use super::BarcodeSource;

const READ_CHUNK_SIZE: usize = 1024;

/// Handle that stops the reading task of an [`AsyncLineSource`].
///
/// Terminating drops the close sender; the task observes the hang-up in the
/// same `select!` that waits for input, so it stops even while blocked on a
/// read.
#[derive(Debug, Clone)]
pub struct Terminator {
    close_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl Terminator {
    pub fn terminate(&self) {
        let mut close_tx = self.close_tx.lock().unwrap_or_else(PoisonError::into_inner);
        if close_tx.take().is_some() {
            tracing::debug!("Line source termination requested");
        }
    }
}

/// Consumer side of the line reader.
#[derive(Debug)]
pub struct AsyncLineSource {
    requested: Arc<AtomicBool>,
    handoff_rx: mpsc::Receiver<String>,
    observed_rx: watch::Receiver<u64>,
    terminator: Terminator,
}

impl AsyncLineSource {
    /// Start reading `input` on a background task.
    ///
    /// The returned handle completes once the stream ends or the source is
    /// terminated; callers wait on it themselves.
    pub fn spawn<R>(input: R) -> (Self, JoinHandle<()>)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (source, task) = Self::with_reader(input);
        (source, tokio::spawn(task.run()))
    }

    fn with_reader<R: AsyncRead + Unpin>(input: R) -> (Self, ReaderTask<R>) {
        let requested = Arc::new(AtomicBool::new(false));
        let (handoff_tx, handoff_rx) = mpsc::channel(1);
        let (close_tx, close_rx) = oneshot::channel();
        let (observed_tx, observed_rx) = watch::channel(0);

        let task = ReaderTask {
            input,
            buffer: LineBuffer::new(),
            requested: requested.clone(),
            handoff_tx,
            close_rx,
            observed_tx,
        };
        let source = Self {
            requested,
            handoff_rx,
            observed_rx,
            terminator: Terminator {
                close_tx: Arc::new(Mutex::new(Some(close_tx))),
            },
        };
        (source, task)
    }

    /// Stop the reading task. Does not wait for it to exit.
    pub fn terminate(&self) {
        self.terminator.terminate();
    }

    pub fn terminator(&self) -> Terminator {
        self.terminator.clone()
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Number of lines the reading task has framed so far, delivered or not
    pub fn observed(&self) -> u64 {
        *self.observed_rx.borrow()
    }

    /// Wait until at least `count` lines have been framed.
    ///
    /// Returns `false` if the reading task exited first.
    pub async fn wait_observed(&mut self, count: u64) -> bool {
        self.observed_rx.wait_for(|seen| *seen >= count).await.is_ok()
    }

    /// Withdraw a request whose timeout expired.
    ///
    /// If the reader already claimed the request, its line is in flight and
    /// belongs to this request rather than the next one.
    async fn expire_request(&mut self) -> Option<String> {
        if self.requested.swap(false, Ordering::AcqRel) {
            return None;
        }
        self.handoff_rx.recv().await
    }
}

#[async_trait]
impl BarcodeSource for AsyncLineSource {
    fn request_next(&self) {
        self.requested.store(true, Ordering::Release);
    }

    async fn try_take(&mut self, timeout: Option<Duration>) -> Option<String> {
        if !self.is_requested() {
            return self.handoff_rx.try_recv().ok();
        }

        let Some(limit) = timeout else {
            return self.handoff_rx.recv().await;
        };

        let deadline = Instant::now() + limit;
        match tokio::time::timeout_at(deadline, self.handoff_rx.recv()).await {
            Ok(Some(line)) => Some(line),
            Ok(None) => {
                // Reader has exited; the caller still waits out the full timeout.
                tokio::time::sleep_until(deadline).await;
                self.requested.store(false, Ordering::Release);
                None
            }
            Err(_) => self.expire_request().await,
        }
    }
}

struct ReaderTask<R> {
    input: R,
    buffer: LineBuffer,
    requested: Arc<AtomicBool>,
    handoff_tx: mpsc::Sender<String>,
    close_rx: oneshot::Receiver<()>,
    observed_tx: watch::Sender<u64>,
}

impl<R: AsyncRead + Unpin> ReaderTask<R> {
    async fn run(mut self) {
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            tokio::select! {
                biased;

                _ = &mut self.close_rx => {
                    tracing::debug!("Line source closed, stopping reader");
                    break;
                }
                read = self.input.read(&mut chunk) => match read {
                    Ok(0) => {
                        tracing::debug!("Line source reached end of stream");
                        break;
                    }
                    Ok(n) => self.process(&chunk[..n]),
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        tracing::warn!("Line source read failed: {}", e);
                        break;
                    }
                }
            }
        }
    }

    fn process(&mut self, bytes: &[u8]) {
        self.buffer.append(bytes);
        let Some(line) = self.buffer.extract_line() else {
            return;
        };

        if self.requested.swap(false, Ordering::AcqRel) {
            match self.handoff_tx.try_send(line) {
                Ok(()) => tracing::debug!("Delivered line to pending request"),
                Err(TrySendError::Full(line)) => {
                    tracing::warn!("Previous line not taken yet, dropping {:?}", line)
                }
                Err(TrySendError::Closed(_)) => {}
            }
        } else {
            tracing::debug!("Dropping line received with no pending request");
        }

        self.buffer.discard_buffered();
        self.observed_tx.send_modify(|seen| *seen += 1);
    }
}
