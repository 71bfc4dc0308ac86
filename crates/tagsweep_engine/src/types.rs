use serde::{Deserialize, Serialize};
use tagsweep_core::{FailureSignal, Item, ItemId, Stats, TriggerSource};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum ClassifyError {
    #[error("request timed out")]
    Timeout,
    #[error("rate limited (http 429)")]
    RateLimited,
    #[error("http status {status}")]
    HttpError { status: u16 },
    #[error("failed to parse response: {0}")]
    ParseError(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ClassifyError {
    pub fn signal(&self) -> FailureSignal {
        match self {
            ClassifyError::RateLimited => FailureSignal::RateLimited,
            _ => FailureSignal::Other,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ClassifyError::RateLimited)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub url: String,
    pub matches: bool,
}

/// Result of a check including all retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// `false` when retries were exhausted.
    pub matches: bool,
    pub attempts: u32,
    /// Set only when every attempt failed.
    pub failure: Option<ClassifyError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Removed,
    Kept,
    /// Retries exhausted; the item stays visible.
    FailedOpen(ClassifyError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub item: Item,
    pub outcome: ItemOutcome,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PassReport {
    pub discovered: usize,
    pub dispatched: usize,
    pub removed: usize,
    pub failed: usize,
    /// Session totals after the pass.
    pub stats: Stats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepEvent {
    PassStarted {
        source: TriggerSource,
        items: usize,
    },
    BatchStarted {
        index: usize,
        total: usize,
        size: usize,
    },
    BatchSettled {
        index: usize,
        total: usize,
    },
    ItemHidden {
        id: ItemId,
        title: String,
        artist: String,
    },
    PassFinished {
        source: TriggerSource,
        report: PassReport,
    },
}
