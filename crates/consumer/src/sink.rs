//! Where rendered lines go.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::render::RenderedLine;

/// Destination for operator lines. One call per line.
pub trait LineSink: Send + Sync {
    /// Write one line.
    fn emit(&self, line: &RenderedLine) -> io::Result<()>;
}

/// Plain-text sink over any writer, without styling.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    /// Sink writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl WriterSink<io::Stdout> {
    /// Sink writing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> LineSink for WriterSink<W> {
    fn emit(&self, line: &RenderedLine) -> io::Result<()> {
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", line.text)?;
        writer.flush()
    }
}

/// Sink that keeps every line, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<RenderedLine>>>,
}

impl MemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line emitted so far.
    pub fn lines(&self) -> Vec<RenderedLine> {
        self.lines.lock().clone()
    }

    /// Remove and return every line emitted so far.
    pub fn take(&self) -> Vec<RenderedLine> {
        std::mem::take(&mut *self.lines.lock())
    }
}

impl LineSink for MemorySink {
    fn emit(&self, line: &RenderedLine) -> io::Result<()> {
        self.lines.lock().push(line.clone());
        Ok(())
    }
}
