//! Output sink for finished records.

use async_trait::async_trait;

use crate::error::SinkResult;
use crate::types::record::OutputRecord;

/// Receives each finished [`OutputRecord`]. Callers assume at-least-once delivery.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn emit(&self, record: &OutputRecord) -> SinkResult<()>;
}
