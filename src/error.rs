use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::codec::time_key;
use crate::domain::HostSnapshot;

/// Failure reported by a key-value engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors returned by snapshot storage and rollup queries
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid range: start {start} is after end {end}")]
    Validation {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("failed to encode snapshot for {timestamp}: {source}")]
    Encoding {
        timestamp: DateTime<Utc>,
        #[source]
        source: serde_json::Error,
    },

    /// A stored value could not be decoded mid-scan. `partial` holds the
    /// records decoded before the failing key, in ascending order.
    #[error("failed to decode snapshot at {}: {source}", time_key::display(.key))]
    Decoding {
        key: Vec<u8>,
        #[source]
        source: serde_json::Error,
        partial: Vec<HostSnapshot>,
    },

    #[error("storage failure during {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: EngineError,
    },
}

impl StoreError {
    pub fn storage(operation: &'static str) -> impl FnOnce(EngineError) -> StoreError {
        move |source| StoreError::Storage { operation, source }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Records recovered before a decode failure, empty for other errors
    pub fn partial(&self) -> &[HostSnapshot] {
        match self {
            Self::Decoding { partial, .. } => partial,
            _ => &[],
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
