//! Barcode scanner input

pub mod line_buffer;
pub mod line_source;

use async_trait::async_trait;
use std::time::Duration;

pub use line_buffer::LineBuffer;
pub use line_source::{AsyncLineSource, Terminator};

/// Source of scanned barcode lines that must be armed before each read
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BarcodeSource: Send {
    /// Arm the source for the next line. Repeated calls coalesce.
    fn request_next(&self);

    /// Take a delivered line.
    ///
    /// When the source is not armed this returns whatever was already
    /// delivered, without waiting. When armed it waits up to `timeout`
    /// (forever for `None`) and returns `None` on expiry.
    async fn try_take(&mut self, timeout: Option<Duration>) -> Option<String>;
}
