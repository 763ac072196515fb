use crate::batch::Batch;
use crate::error::IngressError;
use crate::event::StreamEvent;
use std::sync::Arc;
use std::sync::mpsc;

/// Downstream consumer of released batches.
///
/// Calls are synchronous and ordered per partition.
pub trait BatchSink<K, P> {
    fn on_batch(&mut self, batch: Batch<K, P>);

    /// A partition halted on a fatal error.
    fn on_error(&mut self, _partition: &K, _error: &IngressError) {}

    /// Every partition is closed; nothing else will be delivered.
    fn on_completed(&mut self) {}
}

/// Everything an ingress delivers downstream, as a single message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Egress<K, P> {
    Batch(Batch<K, P>),
    Error { partition: K, error: IngressError },
    Completed,
}

impl<K: Clone, P> BatchSink<K, P> for mpsc::Sender<Egress<K, P>> {
    fn on_batch(&mut self, batch: Batch<K, P>) {
        if self.send(Egress::Batch(batch)).is_err() {
            log::trace!("egress receiver dropped, discarding batch");
        }
    }

    fn on_error(&mut self, partition: &K, error: &IngressError) {
        let _ = self.send(Egress::Error {
            partition: partition.clone(),
            error: error.clone(),
        });
    }

    fn on_completed(&mut self) {
        let _ = self.send(Egress::Completed);
    }
}

/// Keeps every delivery in memory.
#[derive(Debug)]
pub struct CollectingSink<K, P> {
    pub batches: Vec<Batch<K, P>>,
    pub errors: Vec<(K, IngressError)>,
    pub completed: bool,
}

impl<K, P> CollectingSink<K, P> {
    pub fn new() -> Self {
        Self {
            batches: Vec::new(),
            errors: Vec::new(),
            completed: false,
        }
    }

    /// Released events of one partition, batch boundaries removed.
    pub fn events_for(&self, partition: &K) -> Vec<&StreamEvent<P>>
    where
        K: PartialEq,
    {
        self.batches
            .iter()
            .filter(|batch| batch.partition() == partition)
            .flat_map(|batch| batch.events())
            .collect()
    }
}

impl<K, P> Default for CollectingSink<K, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, P> BatchSink<K, P> for CollectingSink<K, P> {
    fn on_batch(&mut self, batch: Batch<K, P>) {
        self.batches.push(batch);
    }

    fn on_error(&mut self, partition: &K, error: &IngressError) {
        self.errors.push((partition.clone(), error.clone()));
    }

    fn on_completed(&mut self) {
        self.completed = true;
    }
}

/// Callback invoked for every released batch.
pub type BatchCallback<K, P> = Arc<dyn Fn(&Batch<K, P>) + Send + Sync>;

/// Callback invoked once every partition has completed.
pub type CompletionCallback = Arc<dyn Fn() + Send + Sync>;

/// Fans batches out to subscribed callbacks.
pub struct CallbackSink<K, P> {
    batch_callbacks: Vec<BatchCallback<K, P>>,
    completion_callbacks: Vec<CompletionCallback>,
}

impl<K, P> CallbackSink<K, P> {
    pub fn new() -> Self {
        Self {
            batch_callbacks: Vec::new(),
            completion_callbacks: Vec::new(),
        }
    }

    /// Subscribe a callback to batch deliveries
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: Fn(&Batch<K, P>) + Send + Sync + 'static,
    {
        self.batch_callbacks.push(Arc::new(callback));
    }

    /// Subscribe a callback to the terminal signal
    pub fn on_complete<F>(&mut self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.completion_callbacks.push(Arc::new(callback));
    }

    pub fn subscriber_count(&self) -> usize {
        self.batch_callbacks.len()
    }
}

impl<K, P> Default for CallbackSink<K, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, P> BatchSink<K, P> for CallbackSink<K, P> {
    fn on_batch(&mut self, batch: Batch<K, P>) {
        for callback in &self.batch_callbacks {
            callback(&batch);
        }
    }

    fn on_completed(&mut self) {
        for callback in &self.completion_callbacks {
            callback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::FlushReason;
    use std::sync::Mutex;

    fn batch(partition: u8) -> Batch<u8, i64> {
        Batch::new(
            partition,
            0,
            FlushReason::Capacity,
            vec![StreamEvent::start(1, 1)],
        )
    }

    #[test]
    fn test_callback_sink_fans_out() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let completed = Arc::new(Mutex::new(false));
        let mut sink = CallbackSink::new();

        let seen_a = seen.clone();
        sink.subscribe(move |b: &Batch<u8, i64>| {
            seen_a.lock().unwrap().push(("a", *b.partition()))
        });
        let seen_b = seen.clone();
        sink.subscribe(move |b: &Batch<u8, i64>| {
            seen_b.lock().unwrap().push(("b", *b.partition()))
        });
        let completed_clone = completed.clone();
        sink.on_complete(move || *completed_clone.lock().unwrap() = true);

        sink.on_batch(batch(7));
        sink.on_completed();

        assert_eq!(sink.subscriber_count(), 2);
        assert_eq!(*seen.lock().unwrap(), vec![("a", 7), ("b", 7)]);
        assert!(*completed.lock().unwrap());
    }

    #[test]
    fn test_channel_sink_forwards_everything() {
        let (mut tx, rx) = mpsc::channel::<Egress<u8, i64>>();
        tx.on_batch(batch(1));
        tx.on_error(&1, &IngressError::PartitionFaulted);
        tx.on_completed();

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                Egress::Batch(batch(1)),
                Egress::Error {
                    partition: 1,
                    error: IngressError::PartitionFaulted
                },
                Egress::Completed,
            ]
        );
    }

    #[test]
    fn test_collecting_sink_groups_by_partition() {
        let mut sink = CollectingSink::new();
        sink.on_batch(batch(1));
        sink.on_batch(batch(2));
        sink.on_batch(batch(1));
        assert_eq!(sink.events_for(&1).len(), 2);
        assert_eq!(sink.events_for(&3).len(), 0);
    }
}
