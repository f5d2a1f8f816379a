//! Record sinks.

use async_trait::async_trait;
use std::io::Write;
use tokio::sync::Mutex;

use crate::error::SinkResult;
use crate::render::flat_row;
use crate::traits::sink::RecordSink;
use crate::types::record::OutputRecord;

/// Layout of each emitted line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordLayout {
    /// The structured record as-is
    #[default]
    Structured,
    /// One flat object per record, see [`flat_row`]
    Flat,
}

/// Writes one JSON document per line to any writer (file, stdout).
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
    layout: RecordLayout,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            layout: RecordLayout::Structured,
        }
    }

    pub fn with_layout(mut self, layout: RecordLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    async fn emit(&self, record: &OutputRecord) -> SinkResult<()> {
        let line = match self.layout {
            RecordLayout::Structured => serde_json::to_string(record)?,
            RecordLayout::Flat => serde_json::to_string(&flat_row(record))?,
        };

        let mut writer = self.writer.lock().await;
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }
}
