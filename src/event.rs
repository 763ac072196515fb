use crate::error::IngressError;

/// Logical time. Totally ordered; `END_OF_TIME` stands for `+∞`.
pub type Timestamp = i64;

/// `+∞`: end time of an open interval and time of the end-of-stream punctuation.
pub const END_OF_TIME: Timestamp = i64::MAX;

/// `-∞`: floor of a partition that has not admitted anything yet.
pub const BEGINNING_OF_TIME: Timestamp = i64::MIN;

/// Shape of an event, without its times or payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    Interval,
    End,
    Punctuation,
}

/// A timestamped event as it enters and leaves the ingress core.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StreamEvent<P> {
    /// Open interval `[sync_time, +∞)`.
    Start { sync_time: Timestamp, payload: P },
    /// Interval `[sync_time, end_time)`; `end_time` may be `END_OF_TIME`.
    Interval {
        sync_time: Timestamp,
        end_time: Timestamp,
        payload: P,
    },
    /// End edge at `sync_time` of an event that started at `start_time`.
    End {
        sync_time: Timestamp,
        start_time: Timestamp,
        payload: P,
    },
    /// No data event below `sync_time` follows on this partition.
    Punctuation { sync_time: Timestamp },
}

impl<P> StreamEvent<P> {
    pub fn start(sync_time: Timestamp, payload: P) -> Self {
        StreamEvent::Start { sync_time, payload }
    }

    pub fn interval(sync_time: Timestamp, end_time: Timestamp, payload: P) -> Self {
        StreamEvent::Interval {
            sync_time,
            end_time,
            payload,
        }
    }

    pub fn end(sync_time: Timestamp, start_time: Timestamp, payload: P) -> Self {
        StreamEvent::End {
            sync_time,
            start_time,
            payload,
        }
    }

    pub fn punctuation(sync_time: Timestamp) -> Self {
        StreamEvent::Punctuation { sync_time }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            StreamEvent::Start { .. } => EventKind::Start,
            StreamEvent::Interval { .. } => EventKind::Interval,
            StreamEvent::End { .. } => EventKind::End,
            StreamEvent::Punctuation { .. } => EventKind::Punctuation,
        }
    }

    /// The time the event is ordered by.
    pub fn sync_time(&self) -> Timestamp {
        match self {
            StreamEvent::Start { sync_time, .. }
            | StreamEvent::Interval { sync_time, .. }
            | StreamEvent::End { sync_time, .. }
            | StreamEvent::Punctuation { sync_time } => *sync_time,
        }
    }

    /// End time of an interval, start time of an end edge.
    pub fn other_time(&self) -> Option<Timestamp> {
        match self {
            StreamEvent::Interval { end_time, .. } => Some(*end_time),
            StreamEvent::End { start_time, .. } => Some(*start_time),
            StreamEvent::Start { .. } | StreamEvent::Punctuation { .. } => None,
        }
    }

    pub fn payload(&self) -> Option<&P> {
        match self {
            StreamEvent::Start { payload, .. }
            | StreamEvent::Interval { payload, .. }
            | StreamEvent::End { payload, .. } => Some(payload),
            StreamEvent::Punctuation { .. } => None,
        }
    }

    pub fn into_payload(self) -> Option<P> {
        match self {
            StreamEvent::Start { payload, .. }
            | StreamEvent::Interval { payload, .. }
            | StreamEvent::End { payload, .. } => Some(payload),
            StreamEvent::Punctuation { .. } => None,
        }
    }

    pub fn is_punctuation(&self) -> bool {
        matches!(self, StreamEvent::Punctuation { .. })
    }

    pub fn is_data(&self) -> bool {
        !self.is_punctuation()
    }

    /// Rejects intervals that end at or before they start and end edges that
    /// do not follow their start.
    pub fn validate(&self) -> Result<(), IngressError> {
        match self {
            StreamEvent::Interval {
                sync_time,
                end_time,
                ..
            } if end_time <= sync_time => Err(IngressError::MalformedInterval {
                sync_time: *sync_time,
                other_time: *end_time,
                expected: "after",
            }),
            StreamEvent::End {
                sync_time,
                start_time,
                ..
            } if start_time >= sync_time => Err(IngressError::MalformedInterval {
                sync_time: *sync_time,
                other_time: *start_time,
                expected: "before",
            }),
            _ => Ok(()),
        }
    }

    /// Moves the event forward to `sync_time`.
    ///
    /// Returns `None` when an interval would become empty.
    pub(crate) fn shifted_to(self, sync_time: Timestamp) -> Option<Self> {
        match self {
            StreamEvent::Start { payload, .. } => Some(StreamEvent::Start { sync_time, payload }),
            StreamEvent::Interval {
                end_time, payload, ..
            } => (end_time > sync_time).then_some(StreamEvent::Interval {
                sync_time,
                end_time,
                payload,
            }),
            StreamEvent::End {
                start_time,
                payload,
                ..
            } => Some(StreamEvent::End {
                sync_time,
                start_time,
                payload,
            }),
            StreamEvent::Punctuation { .. } => Some(StreamEvent::Punctuation { sync_time }),
        }
    }
}
