//! Newline framing over raw scanner bytes

/// Accumulates raw chunks and hands out complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Take the bytes before the first line feed, without the line feed.
    ///
    /// Returns `None` and leaves the buffer untouched if no full line is
    /// buffered yet.
    pub fn extract_line(&mut self) -> Option<String> {
        let lf = self.pending.iter().position(|b| *b == b'\n')?;
        let line: Vec<u8> = self.pending.drain(..=lf).take(lf).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Drop every complete line, keeping only the partial line after the
    /// last line feed.
    pub fn discard_buffered(&mut self) {
        if let Some(lf) = self.pending.iter().rposition(|b| *b == b'\n') {
            self.pending.drain(..=lf);
        }
    }

    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
