#![allow(dead_code)]

use temporal_ingress::{
    CollectingSink, IngressConfig, IngressEngine, PartitionKey, StreamEvent, Timestamp,
};

pub type Collected<K> = IngressEngine<K, i64, CollectingSink<K, i64>>;

pub fn engine<K: PartitionKey>(config: IngressConfig) -> Collected<K> {
    IngressEngine::new(config, CollectingSink::new()).unwrap()
}

/// Feeds `(partition, sync_time)` pairs as start edges, using the arrival
/// index as payload, then completes every partition.
pub fn run<K: PartitionKey>(
    config: IngressConfig,
    input: &[(K, Timestamp)],
) -> CollectingSink<K, i64> {
    let mut engine = engine(config);
    for (index, (partition, time)) in input.iter().enumerate() {
        engine
            .ingest(partition.clone(), StreamEvent::start(*time, index as i64))
            .unwrap();
    }
    engine.complete_all();
    engine.into_sink()
}

pub fn unpartitioned(times: &[Timestamp]) -> Vec<((), Timestamp)> {
    times.iter().map(|&t| ((), t)).collect()
}

pub fn data_times(events: &[&StreamEvent<i64>]) -> Vec<Timestamp> {
    events
        .iter()
        .filter(|e| e.is_data())
        .map(|e| e.sync_time())
        .collect()
}

pub fn punctuation_times(events: &[&StreamEvent<i64>]) -> Vec<Timestamp> {
    events
        .iter()
        .filter(|e| e.is_punctuation())
        .map(|e| e.sync_time())
        .collect()
}
