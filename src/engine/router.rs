use crate::batch::FlushReason;
use crate::engine::assembler::BatchAssembler;
use crate::engine::sequencer::{PartitionState, SequencerStats, TemporalSequencer};
use crate::engine::sink::BatchSink;
use crate::error::{ConfigError, IngressError};
use crate::event::{StreamEvent, Timestamp};
use crate::policy::IngressConfig;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Identifies an independent ordering domain. `()` is the single implicit
/// partition of an unpartitioned stream.
pub trait PartitionKey: Hash + Eq + Clone + Debug {}

impl<T: Hash + Eq + Clone + Debug> PartitionKey for T {}

/// Counters for one partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionStats {
    pub sequencer: SequencerStats,
    pub batches: u64,
    pub pending: usize,
}

/// Sequencer and assembler of one partition.
#[derive(Debug)]
struct PartitionPipeline<K, P> {
    sequencer: TemporalSequencer<P>,
    assembler: BatchAssembler<K, P>,
}

impl<K: PartitionKey, P> PartitionPipeline<K, P> {
    fn new(key: K, config: &IngressConfig) -> Self {
        Self {
            sequencer: TemporalSequencer::new(config),
            assembler: BatchAssembler::new(key, config),
        }
    }

    fn stats(&self) -> PartitionStats {
        PartitionStats {
            sequencer: self.sequencer.stats(),
            batches: self.assembler.batches_flushed(),
            pending: self.assembler.pending_len(),
        }
    }
}

/// Demultiplexes events into per-partition pipelines.
///
/// Pipelines are created on the first event for a key and dropped on
/// completion or fault, statistics included. Only the terminal state of a
/// retired key is remembered, so late traffic for it is rejected instead of
/// silently opening a fresh partition; that map grows by one small entry
/// per distinct retired key.
#[derive(Debug)]
pub struct PartitionRouter<K, P> {
    config: IngressConfig,
    partitions: HashMap<K, PartitionPipeline<K, P>>,
    retired: HashMap<K, PartitionState>,
}

impl<K: PartitionKey, P> PartitionRouter<K, P> {
    pub fn new(config: IngressConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            partitions: HashMap::new(),
            retired: HashMap::new(),
        })
    }

    pub fn config(&self) -> &IngressConfig {
        &self.config
    }

    /// Routes one event to its partition and hands every batch that became
    /// due to `sink`.
    pub fn ingest<S: BatchSink<K, P>>(
        &mut self,
        key: K,
        event: StreamEvent<P>,
        sink: &mut S,
    ) -> Result<(), IngressError> {
        if let Some(state) = self.retired.get(&key) {
            return Err(match state {
                PartitionState::Faulted => IngressError::PartitionFaulted,
                _ => IngressError::PartitionClosed,
            });
        }

        let config = &self.config;
        let pipeline = self.partitions.entry(key.clone()).or_insert_with(|| {
            log::debug!("opening partition {:?}", key);
            PartitionPipeline::new(key.clone(), config)
        });

        match pipeline.sequencer.admit(event) {
            Ok(admission) => {
                for batch in pipeline
                    .assembler
                    .offer(admission.released, admission.admitted)
                {
                    sink.on_batch(batch);
                }
                Ok(())
            }
            Err(error) if error.is_fatal() => {
                self.fault(key, &error, sink);
                Err(error)
            }
            Err(error) => Err(error),
        }
    }

    /// Source punctuation for one partition.
    pub fn punctuate<S: BatchSink<K, P>>(
        &mut self,
        key: K,
        time: Timestamp,
        sink: &mut S,
    ) -> Result<(), IngressError> {
        self.ingest(key, StreamEvent::punctuation(time), sink)
    }

    /// Drains and closes one partition. Completing a closed or faulted
    /// partition is a no-op; completing an unseen key closes it empty.
    pub fn complete<S: BatchSink<K, P>>(&mut self, key: &K, sink: &mut S) {
        if self.retired.contains_key(key) {
            return;
        }
        match self.partitions.remove(key) {
            Some(pipeline) => self.close(key.clone(), pipeline, sink),
            None => {
                self.retired.insert(key.clone(), PartitionState::Closed);
            }
        }
    }

    /// Drains and closes every open partition.
    pub fn complete_all<S: BatchSink<K, P>>(&mut self, sink: &mut S) {
        let keys: Vec<K> = self.partitions.keys().cloned().collect();
        for key in keys {
            if let Some(pipeline) = self.partitions.remove(&key) {
                self.close(key, pipeline, sink);
            }
        }
    }

    pub fn partition_state(&self, key: &K) -> PartitionState {
        if let Some(pipeline) = self.partitions.get(key) {
            return pipeline.sequencer.state();
        }
        self.retired
            .get(key)
            .copied()
            .unwrap_or(PartitionState::Empty)
    }

    /// Statistics of an open partition.
    pub fn stats(&self, key: &K) -> Option<PartitionStats> {
        self.partitions.get(key).map(PartitionPipeline::stats)
    }

    /// Watermark of an open partition.
    pub fn watermark(&self, key: &K) -> Option<Timestamp> {
        self.partitions
            .get(key)
            .and_then(|pipeline| pipeline.sequencer.watermark())
    }

    pub fn active_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_drained(&self) -> bool {
        self.partitions.is_empty()
    }

    fn close<S: BatchSink<K, P>>(
        &mut self,
        key: K,
        mut pipeline: PartitionPipeline<K, P>,
        sink: &mut S,
    ) {
        let released = pipeline.sequencer.complete();
        for batch in pipeline.assembler.offer(released, false) {
            sink.on_batch(batch);
        }
        if let Some(batch) = pipeline.assembler.flush(FlushReason::Completion) {
            sink.on_batch(batch);
        }
        let stats = pipeline.stats();
        log::info!(
            "partition {:?} closed: {} admitted, {} dropped, {} batches",
            key,
            stats.sequencer.admitted,
            stats.sequencer.dropped,
            stats.batches
        );
        self.retired.insert(key, PartitionState::Closed);
    }

    /// Flushes what was already released, reports the error and retires the
    /// partition. Buffered events were discarded by the sequencer.
    fn fault<S: BatchSink<K, P>>(&mut self, key: K, error: &IngressError, sink: &mut S) {
        let Some(mut pipeline) = self.partitions.remove(&key) else {
            return;
        };
        if let Some(batch) = pipeline.assembler.flush(FlushReason::Fault) {
            sink.on_batch(batch);
        }
        sink.on_error(&key, error);
        log::warn!(
            "partition {:?} faulted after {} admitted events: {}",
            key,
            pipeline.sequencer.stats().admitted,
            error
        );
        self.retired.insert(key, PartitionState::Faulted);
    }
}
