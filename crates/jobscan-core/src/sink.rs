//! Append-only destinations for processed postings.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::models::result::ProcessedJobInfo;

/// Storage collaborator receiving one result per processed posting.
pub trait ResultSink {
    /// Append a result.
    fn store(&mut self, result: &ProcessedJobInfo) -> Result<()>;

    /// Push buffered results to the underlying storage.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes one JSON document per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of documents written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<BufWriter<File>> {
    /// Create or truncate a JSON Lines file.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        debug!("Writing results to {:?}", path);
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> ResultSink for JsonLinesSink<W> {
    fn store(&mut self, result: &ProcessedJobInfo) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &result.to_document()?)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps documents in memory.
#[derive(Debug, Default)]
pub struct VecSink {
    documents: Vec<serde_json::Value>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> &[serde_json::Value] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl ResultSink for VecSink {
    fn store(&mut self, result: &ProcessedJobInfo) -> Result<()> {
        self.documents.push(result.to_document()?);
        Ok(())
    }
}
