mod assembler;
mod ingress_engine;
mod punctuation;
mod router;
mod sequencer;
mod sink;
mod threaded;

pub use assembler::BatchAssembler;
pub use ingress_engine::IngressEngine;
pub use punctuation::PunctuationGenerator;
pub use router::{PartitionKey, PartitionRouter, PartitionStats};
pub use sequencer::{Admission, PartitionState, SequencerStats, TemporalSequencer};
pub use sink::{BatchCallback, BatchSink, CallbackSink, CollectingSink, CompletionCallback, Egress};
pub use threaded::{IngressHandle, ThreadedIngress};
