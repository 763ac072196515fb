//! Temporal ingress: admits timestamped events per partition, repairs
//! bounded disorder, injects punctuations and hands ordered batches
//! downstream.

mod batch;
mod descriptor;
mod engine;
mod error;
mod event;
mod policy;
pub mod reorder;

pub use batch::{Batch, FlushReason};
pub use descriptor::IngressDescriptorParser;
pub use engine::{
    Admission, BatchAssembler, BatchCallback, BatchSink, CallbackSink, CollectingSink,
    CompletionCallback, Egress, IngressEngine, IngressHandle, PartitionKey, PartitionRouter,
    PartitionState, PartitionStats, PunctuationGenerator, SequencerStats, TemporalSequencer,
    ThreadedIngress,
};
pub use error::{ConfigError, IngressError};
pub use event::{BEGINNING_OF_TIME, END_OF_TIME, EventKind, StreamEvent, Timestamp};
pub use policy::{
    CompletionPolicy, DEFAULT_BATCH_CAPACITY, DisorderPolicy, FlushPolicy, IngressConfig,
    PunctuationPolicy, ReorderStrategy,
};
