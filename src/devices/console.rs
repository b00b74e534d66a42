//! Console feedback sink

use async_trait::async_trait;
use std::io::Write;

use super::{Feedback, FeedbackSink};

/// Prints feedback text on stdout, one line per message.
///
/// Spoken phrases are recorded through tracing; playing them is left to
/// whatever consumes the log.
#[derive(Debug, Default)]
pub struct ConsoleFeedback;

impl ConsoleFeedback {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FeedbackSink for ConsoleFeedback {
    async fn put(&self, feedback: Feedback) {
        {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{}", feedback.text).and_then(|_| stdout.flush()) {
                tracing::warn!("Failed to write feedback to stdout: {}", e);
            }
        }

        if let Some(speech) = feedback.speech {
            tracing::info!(speech = %speech, "Speaking");
        }
    }

    async fn chime(&self) {
        tracing::debug!("Card acknowledged");
    }
}
