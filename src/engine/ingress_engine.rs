use crate::descriptor::IngressDescriptorParser;
use crate::engine::router::{PartitionKey, PartitionRouter, PartitionStats};
use crate::engine::sequencer::PartitionState;
use crate::engine::sink::BatchSink;
use crate::error::{ConfigError, IngressError};
use crate::event::{StreamEvent, Timestamp};
use crate::policy::IngressConfig;

/// Single-threaded ingress: routes, sequences and batches events and hands
/// batches to a sink on the caller's thread.
pub struct IngressEngine<K, P, S> {
    router: PartitionRouter<K, P>,
    sink: S,
    completed: bool,
}

impl<K: PartitionKey, P, S: BatchSink<K, P>> IngressEngine<K, P, S> {
    /// Create an engine after validating `config`
    pub fn new(config: IngressConfig, sink: S) -> Result<Self, ConfigError> {
        Ok(Self {
            router: PartitionRouter::new(config)?,
            sink,
            completed: false,
        })
    }

    /// Create an engine from a textual descriptor such as
    /// `DISORDER DROP 10 PUNCTUATE EVERY 100`
    pub fn from_descriptor(descriptor: &str, sink: S) -> Result<Self, ConfigError> {
        let config = IngressDescriptorParser::new(descriptor).parse()?;
        Self::new(config, sink)
    }

    pub fn config(&self) -> &IngressConfig {
        self.router.config()
    }

    /// Ingest one event for `partition`.
    ///
    /// Fatal errors halt only that partition; the error is returned here and
    /// reported to the sink.
    pub fn ingest(&mut self, partition: K, event: StreamEvent<P>) -> Result<(), IngressError> {
        if self.completed {
            return Err(IngressError::PartitionClosed);
        }
        self.router.ingest(partition, event, &mut self.sink)
    }

    /// Source punctuation: no event of `partition` below `time` will follow.
    pub fn punctuate(&mut self, partition: K, time: Timestamp) -> Result<(), IngressError> {
        self.ingest(partition, StreamEvent::punctuation(time))
    }

    /// Drain and close one partition
    pub fn complete(&mut self, partition: &K) {
        self.router.complete(partition, &mut self.sink);
    }

    /// Drain every partition and signal completion to the sink once.
    pub fn complete_all(&mut self) {
        if self.completed {
            return;
        }
        self.router.complete_all(&mut self.sink);
        self.completed = true;
        self.sink.on_completed();
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn partition_state(&self, partition: &K) -> PartitionState {
        self.router.partition_state(partition)
    }

    pub fn stats(&self, partition: &K) -> Option<PartitionStats> {
        self.router.stats(partition)
    }

    pub fn active_partitions(&self) -> usize {
        self.router.active_partitions()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<P, S: BatchSink<(), P>> IngressEngine<(), P, S> {
    /// Ingest into the single partition of an unpartitioned stream
    pub fn push(&mut self, event: StreamEvent<P>) -> Result<(), IngressError> {
        self.ingest((), event)
    }
}
