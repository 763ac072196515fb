use crate::event::{StreamEvent, Timestamp};

/// Why a batch was handed to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlushReason {
    /// The batch reached its capacity.
    Capacity,
    /// `batch_capacity` events were admitted since the previous boundary.
    BatchBoundary,
    /// A punctuation was released under `FlushOnPunctuation`.
    Punctuation,
    /// The partition completed.
    Completion,
    /// The partition halted on a fatal error.
    Fault,
}

/// Ordered events from one partition, handed downstream in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<K, P> {
    partition: K,
    sequence: u64,
    reason: FlushReason,
    events: Vec<StreamEvent<P>>,
}

impl<K, P> Batch<K, P> {
    pub fn new(
        partition: K,
        sequence: u64,
        reason: FlushReason,
        events: Vec<StreamEvent<P>>,
    ) -> Self {
        Self {
            partition,
            sequence,
            reason,
            events,
        }
    }

    pub fn partition(&self) -> &K {
        &self.partition
    }

    /// Position of the batch within its partition, starting at 0.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn reason(&self) -> FlushReason {
        self.reason
    }

    pub fn events(&self) -> &[StreamEvent<P>] {
        &self.events
    }

    pub fn into_events(self) -> Vec<StreamEvent<P>> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn data_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_data()).count()
    }

    pub fn punctuation_count(&self) -> usize {
        self.events.len() - self.data_count()
    }

    pub fn first_sync_time(&self) -> Option<Timestamp> {
        self.events.first().map(StreamEvent::sync_time)
    }

    pub fn last_sync_time(&self) -> Option<Timestamp> {
        self.events.last().map(StreamEvent::sync_time)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StreamEvent<P>> {
        self.events.iter()
    }
}

impl<'a, K, P> IntoIterator for &'a Batch<K, P> {
    type Item = &'a StreamEvent<P>;
    type IntoIter = std::slice::Iter<'a, StreamEvent<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
