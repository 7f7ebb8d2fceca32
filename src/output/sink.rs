//! Report destinations
//!
//! An [`OutputSink`] serializes writes from the tracker so report blocks
//! never interleave.

use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::warn;

/// Shared, serialized report writer
#[derive(Clone)]
pub struct OutputSink {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl OutputSink {
    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    /// Discards everything
    pub fn null() -> Self {
        Self::from_writer(io::sink())
    }

    /// Write one block and flush it
    pub fn write_str(&self, text: &str) -> io::Result<()> {
        let mut writer = self.writer.lock();
        writer.write_all(text.as_bytes())?;
        writer.flush()
    }

    /// Like [`write_str`](Self::write_str), logging failures instead of
    /// returning them
    pub fn emit(&self, text: &str) {
        if let Err(e) = self.write_str(text) {
            warn!("Failed to write report output: {}", e);
        }
    }
}

impl Default for OutputSink {
    fn default() -> Self {
        Self::stdout()
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OutputSink")
    }
}

/// In-memory writer whose contents stay readable after being handed to a
/// sink
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink writing into this buffer
    pub fn sink(&self) -> OutputSink {
        OutputSink::from_writer(self.clone())
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.lock().is_empty()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
