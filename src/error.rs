use crate::event::Timestamp;
use thiserror::Error;

/// Errors raised while admitting, releasing or completing events.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IngressError {
    #[error("event at {sync_time} is below the admissible floor {floor}")]
    LateEvent { sync_time: Timestamp, floor: Timestamp },
    #[error("event at {sync_time} precedes watermark {watermark} and no disorder policy is set")]
    OutOfOrder {
        sync_time: Timestamp,
        watermark: Timestamp,
    },
    #[error("malformed interval: {other_time} must be {expected} sync time {sync_time}")]
    MalformedInterval {
        sync_time: Timestamp,
        other_time: Timestamp,
        expected: &'static str,
    },
    #[error("partition is closed and accepts no further events")]
    PartitionClosed,
    #[error("partition halted after a fatal error")]
    PartitionFaulted,
    #[error("ingress worker is no longer running")]
    Disconnected,
    #[error("ingress worker {worker} panicked")]
    WorkerPanicked { worker: usize },
}

impl IngressError {
    /// Whether the error halts the partition it was raised on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            IngressError::LateEvent { .. } | IngressError::OutOfOrder { .. }
        )
    }
}

/// Errors raised while building an ingress configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("batch capacity must be positive")]
    ZeroBatchCapacity,
    #[error("reorder slack must be non-negative, got {0}")]
    NegativeSlack(i64),
    #[error("punctuation period must be positive, got {0}")]
    NonPositivePeriod(i64),
    #[error("threaded ingress needs at least one worker")]
    ZeroWorkers,
    #[error("invalid ingress descriptor: {0}")]
    InvalidDescriptor(String),
}
