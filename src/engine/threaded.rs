use crate::engine::router::{PartitionKey, PartitionRouter};
use crate::engine::sink::{BatchSink, Egress};
use crate::error::{ConfigError, IngressError};
use crate::event::{StreamEvent, Timestamp};
use crate::policy::IngressConfig;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

enum Command<K, P> {
    Event(K, StreamEvent<P>),
    Complete(K),
    Shutdown,
}

/// Producer side of a [`ThreadedIngress`]. Cheap to clone; every clone
/// routes a partition to the same worker, so per-partition order is the
/// order of `send` calls.
pub struct IngressHandle<K, P> {
    senders: Vec<mpsc::Sender<Command<K, P>>>,
}

impl<K, P> Clone for IngressHandle<K, P> {
    fn clone(&self) -> Self {
        Self {
            senders: self.senders.clone(),
        }
    }
}

impl<K: PartitionKey, P> IngressHandle<K, P> {
    /// Send an event to the worker owning `partition`.
    ///
    /// Malformed intervals are rejected here; admission errors surface on
    /// the egress channel.
    pub fn send(&self, partition: K, event: StreamEvent<P>) -> Result<(), IngressError> {
        event.validate()?;
        self.route(&partition)
            .send(Command::Event(partition, event))
            .map_err(|_| IngressError::Disconnected)
    }

    pub fn punctuate(&self, partition: K, time: Timestamp) -> Result<(), IngressError> {
        self.send(partition, StreamEvent::punctuation(time))
    }

    /// Ask the owning worker to drain and close `partition`.
    pub fn complete(&self, partition: K) -> Result<(), IngressError> {
        self.route(&partition)
            .send(Command::Complete(partition))
            .map_err(|_| IngressError::Disconnected)
    }

    pub fn workers(&self) -> usize {
        self.senders.len()
    }

    fn route(&self, partition: &K) -> &mpsc::Sender<Command<K, P>> {
        let mut hasher = DefaultHasher::new();
        partition.hash(&mut hasher);
        let index = (hasher.finish() % self.senders.len() as u64) as usize;
        &self.senders[index]
    }
}

/// Runs partition routers on worker threads.
///
/// Partitions are spread over the workers by key hash. Each worker owns its
/// partitions outright, so no state is shared between threads; batches and
/// errors from every worker arrive on one egress channel.
pub struct ThreadedIngress<K, P> {
    handle: IngressHandle<K, P>,
    workers: Vec<JoinHandle<()>>,
    egress: mpsc::Sender<Egress<K, P>>,
}

impl<K, P> ThreadedIngress<K, P>
where
    K: PartitionKey + Send + 'static,
    P: Send + 'static,
{
    /// Start `workers` threads and return the ingress with its egress channel
    pub fn start(
        config: IngressConfig,
        workers: usize,
    ) -> Result<(Self, mpsc::Receiver<Egress<K, P>>), ConfigError> {
        config.validate()?;
        if workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }

        let (egress, egress_rx) = mpsc::channel();
        let mut senders = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let (tx, rx) = mpsc::channel::<Command<K, P>>();
            let router = PartitionRouter::new(config.clone())?;
            let sink = egress.clone();
            handles.push(thread::spawn(move || run_worker(index, rx, router, sink)));
            senders.push(tx);
        }
        log::debug!("threaded ingress started with {} workers", workers);

        Ok((
            Self {
                handle: IngressHandle { senders },
                workers: handles,
                egress,
            },
            egress_rx,
        ))
    }

    pub fn handle(&self) -> IngressHandle<K, P> {
        self.handle.clone()
    }

    /// Drain every partition, stop the workers and send `Egress::Completed`.
    ///
    /// The egress channel closes once this returns and every handle clone
    /// has been dropped.
    pub fn finish(self) -> Result<(), IngressError> {
        for sender in &self.handle.senders {
            let _ = sender.send(Command::Shutdown);
        }

        let mut result = Ok(());
        for (worker, handle) in self.workers.into_iter().enumerate() {
            if handle.join().is_err() {
                log::warn!("ingress worker {} panicked", worker);
                if result.is_ok() {
                    result = Err(IngressError::WorkerPanicked { worker });
                }
            }
        }

        let mut egress = self.egress;
        egress.on_completed();
        result
    }
}

fn run_worker<K: PartitionKey, P>(
    index: usize,
    commands: mpsc::Receiver<Command<K, P>>,
    mut router: PartitionRouter<K, P>,
    mut sink: mpsc::Sender<Egress<K, P>>,
) {
    log::trace!("ingress worker {} running", index);
    while let Ok(command) = commands.recv() {
        match command {
            Command::Event(partition, event) => {
                if let Err(error) = router.ingest(partition.clone(), event, &mut sink) {
                    // Fatal errors were already reported by the router.
                    if !error.is_fatal() {
                        sink.on_error(&partition, &error);
                    }
                }
            }
            Command::Complete(partition) => router.complete(&partition, &mut sink),
            Command::Shutdown => break,
        }
    }
    router.complete_all(&mut sink);
    log::trace!("ingress worker {} stopped", index);
}
