use super::{Buffered, ReorderBuffer};
use crate::event::{StreamEvent, Timestamp};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap entry ordered by `(sync_time, seq)` only.
#[derive(Debug)]
struct HeapEntry<P>(Buffered<P>);

impl<P> PartialEq for HeapEntry<P> {
    fn eq(&self, other: &Self) -> bool {
        self.0.key() == other.0.key()
    }
}

impl<P> Eq for HeapEntry<P> {}

impl<P> PartialOrd for HeapEntry<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P> Ord for HeapEntry<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other.0.key().cmp(&self.0.key())
    }
}

/// Min-heap reorder buffer. O(log n) per event, any amount of disorder.
#[derive(Debug)]
pub struct PriorityQueueBuffer<P> {
    heap: BinaryHeap<HeapEntry<P>>,
}

impl<P> PriorityQueueBuffer<P> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }
}

impl<P> Default for PriorityQueueBuffer<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> ReorderBuffer<P> for PriorityQueueBuffer<P> {
    fn insert(&mut self, seq: u64, event: StreamEvent<P>) {
        self.heap.push(HeapEntry(Buffered::new(seq, event)));
    }

    fn release_before(&mut self, time: Timestamp, out: &mut Vec<StreamEvent<P>>) {
        while self
            .heap
            .peek()
            .is_some_and(|entry| entry.0.event.sync_time() < time)
        {
            if let Some(HeapEntry(entry)) = self.heap.pop() {
                out.push(entry.event);
            }
        }
    }

    fn drain(&mut self, out: &mut Vec<StreamEvent<P>>) {
        out.reserve(self.heap.len());
        while let Some(HeapEntry(entry)) = self.heap.pop() {
            out.push(entry.event);
        }
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn min_sync_time(&self) -> Option<Timestamp> {
        self.heap.peek().map(|entry| entry.0.event.sync_time())
    }
}
