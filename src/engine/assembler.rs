use crate::batch::{Batch, FlushReason};
use crate::event::StreamEvent;
use crate::policy::{FlushPolicy, IngressConfig};
use std::mem;

/// Groups one partition's released events into bounded batches and decides
/// when a partial batch leaves early.
#[derive(Debug)]
pub struct BatchAssembler<K, P> {
    partition: K,
    capacity: usize,
    policy: FlushPolicy,
    pending: Vec<StreamEvent<P>>,
    admitted_since_flush: usize,
    next_sequence: u64,
}

impl<K: Clone, P> BatchAssembler<K, P> {
    pub fn new(partition: K, config: &IngressConfig) -> Self {
        Self {
            partition,
            capacity: config.batch_capacity,
            policy: config.flush,
            pending: Vec::with_capacity(config.batch_capacity.min(4096)),
            admitted_since_flush: 0,
            next_sequence: 0,
        }
    }

    /// Appends released events and returns every batch that became due.
    ///
    /// `admitted` tells whether the input event behind this release entered
    /// the reorder buffer; only admitted events count towards a batch
    /// boundary. The count restarts whenever a batch is released, so a
    /// capacity or punctuation flush caused by this admission absorbs it.
    pub fn offer(&mut self, released: Vec<StreamEvent<P>>, admitted: bool) -> Vec<Batch<K, P>> {
        let counts_boundary = self.policy == FlushPolicy::FlushOnBatchBoundary;
        if admitted && counts_boundary {
            self.admitted_since_flush += 1;
        }

        let mut batches = Vec::new();
        for event in released {
            let is_punctuation = event.is_punctuation();
            self.pending.push(event);
            if self.pending.len() >= self.capacity {
                batches.extend(self.flush(FlushReason::Capacity));
            } else if is_punctuation && self.policy == FlushPolicy::FlushOnPunctuation {
                batches.extend(self.flush(FlushReason::Punctuation));
            }
        }

        if counts_boundary && self.admitted_since_flush >= self.capacity {
            self.admitted_since_flush = 0;
            batches.extend(self.flush(FlushReason::BatchBoundary));
        }
        batches
    }

    /// Releases the pending batch, if it holds anything.
    pub fn flush(&mut self, reason: FlushReason) -> Option<Batch<K, P>> {
        if self.pending.is_empty() {
            return None;
        }
        let events = mem::replace(
            &mut self.pending,
            Vec::with_capacity(self.capacity.min(4096)),
        );
        let batch = Batch::new(self.partition.clone(), self.next_sequence, reason, events);
        self.next_sequence += 1;
        self.admitted_since_flush = 0;
        log::trace!(
            "flushing batch #{} of {} events ({:?})",
            batch.sequence(),
            batch.len(),
            reason
        );
        Some(batch)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn batches_flushed(&self) -> u64 {
        self.next_sequence
    }
}
