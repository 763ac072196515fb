//! Reorder buffers holding admitted events until they are safe to release.

mod impatience;
mod priority_queue;

pub use impatience::ImpatienceBuffer;
pub use priority_queue::PriorityQueueBuffer;

use crate::event::{StreamEvent, Timestamp};
use crate::policy::ReorderStrategy;

/// An admitted event tagged with its arrival sequence within the partition.
///
/// Buffers order by `(sync_time, seq)`, so events with equal sync times leave
/// in arrival order whatever the strategy.
#[derive(Debug, Clone)]
pub struct Buffered<P> {
    pub seq: u64,
    pub event: StreamEvent<P>,
}

impl<P> Buffered<P> {
    pub fn new(seq: u64, event: StreamEvent<P>) -> Self {
        Self { seq, event }
    }

    pub fn key(&self) -> (Timestamp, u64) {
        (self.event.sync_time(), self.seq)
    }
}

/// Storage strategy behind the temporal sequencer.
pub trait ReorderBuffer<P> {
    /// Buffers an admitted event. `seq` increases with every call.
    fn insert(&mut self, seq: u64, event: StreamEvent<P>);

    /// Moves every event with `sync_time < time` to `out`, in order.
    fn release_before(&mut self, time: Timestamp, out: &mut Vec<StreamEvent<P>>);

    /// Moves every buffered event to `out`, in order.
    fn drain(&mut self, out: &mut Vec<StreamEvent<P>>);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest buffered sync time.
    fn min_sync_time(&self) -> Option<Timestamp>;
}

/// Buffer chosen at runtime from `ReorderStrategy`.
#[derive(Debug)]
pub enum StrategyBuffer<P> {
    Impatience(ImpatienceBuffer<P>),
    PriorityQueue(PriorityQueueBuffer<P>),
}

impl<P> StrategyBuffer<P> {
    pub fn new(strategy: ReorderStrategy) -> Self {
        match strategy {
            ReorderStrategy::ImpatienceWindow => StrategyBuffer::Impatience(ImpatienceBuffer::new()),
            ReorderStrategy::PriorityQueue => {
                StrategyBuffer::PriorityQueue(PriorityQueueBuffer::new())
            }
        }
    }

    pub fn strategy(&self) -> ReorderStrategy {
        match self {
            StrategyBuffer::Impatience(_) => ReorderStrategy::ImpatienceWindow,
            StrategyBuffer::PriorityQueue(_) => ReorderStrategy::PriorityQueue,
        }
    }
}

impl<P> ReorderBuffer<P> for StrategyBuffer<P> {
    fn insert(&mut self, seq: u64, event: StreamEvent<P>) {
        match self {
            StrategyBuffer::Impatience(buffer) => buffer.insert(seq, event),
            StrategyBuffer::PriorityQueue(buffer) => buffer.insert(seq, event),
        }
    }

    fn release_before(&mut self, time: Timestamp, out: &mut Vec<StreamEvent<P>>) {
        match self {
            StrategyBuffer::Impatience(buffer) => buffer.release_before(time, out),
            StrategyBuffer::PriorityQueue(buffer) => buffer.release_before(time, out),
        }
    }

    fn drain(&mut self, out: &mut Vec<StreamEvent<P>>) {
        match self {
            StrategyBuffer::Impatience(buffer) => buffer.drain(out),
            StrategyBuffer::PriorityQueue(buffer) => buffer.drain(out),
        }
    }

    fn len(&self) -> usize {
        match self {
            StrategyBuffer::Impatience(buffer) => buffer.len(),
            StrategyBuffer::PriorityQueue(buffer) => buffer.len(),
        }
    }

    fn min_sync_time(&self) -> Option<Timestamp> {
        match self {
            StrategyBuffer::Impatience(buffer) => buffer.min_sync_time(),
            StrategyBuffer::PriorityQueue(buffer) => buffer.min_sync_time(),
        }
    }
}
