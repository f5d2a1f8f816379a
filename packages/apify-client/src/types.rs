use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A `{ "url": ... }` entry, the shape most Apify actors expect for `startUrls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartUrl {
    pub url: String,
}

impl StartUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Wrapper for Apify API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Lifecycle state of an actor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Ready,
    Running,
    Succeeded,
    Failed,
    Aborted,
    TimedOut,
    Other(String),
}

impl RunStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "READY" => Self::Ready,
            "RUNNING" | "TIMING-OUT" | "ABORTING" => Self::Running,
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "ABORTED" => Self::Aborted,
            "TIMED-OUT" => Self::TimedOut,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether the run can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::Aborted | Self::TimedOut
        )
    }
}

/// Apify actor run metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct RunData {
    pub id: String,
    pub status: String,
    #[serde(rename = "defaultDatasetId")]
    pub default_dataset_id: String,
    #[serde(rename = "startedAt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "finishedAt")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunData {
    pub fn run_status(&self) -> RunStatus {
        RunStatus::parse(&self.status)
    }
}
