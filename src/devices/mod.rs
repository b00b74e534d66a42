//! Kiosk hardware: ID card reader, speaker/console feedback and the shelf display

pub mod card_reader;
pub mod console;
pub mod shelf;

use async_trait::async_trait;

use crate::{
    error::{AppResult, ScanError},
    models::EmployeeId,
};

pub use card_reader::LineCardReader;
pub use console::ConsoleFeedback;
pub use shelf::ShelfDisplay;

/// Reads employee ids from ID cards
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdScanner: Send + Sync {
    /// Wait for the next card.
    ///
    /// Returns `Ok(None)` once [`IdScanner::request_cancel`] has been called.
    async fn scan(&self) -> Result<Option<EmployeeId>, ScanError>;

    /// Make pending and future scans return `Ok(None)` promptly
    fn request_cancel(&self);
}

/// A user-facing message: text for the console/log and an optional phrase to speak
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub text: String,
    pub speech: Option<String>,
}

/// Audible and textual feedback to the person at the desk
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn put(&self, feedback: Feedback);

    /// Short acknowledgement sound after a card tap
    async fn chime(&self) {}
}

/// Screen pointing the user at the shelf a returned book belongs on
#[cfg_attr(test, mockall::automock)]
pub trait DisplaySink: Send + Sync {
    fn show(&self, genre: &str) -> AppResult<()>;

    fn hide(&self);
}
