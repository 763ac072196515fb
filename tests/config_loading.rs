use temporal_ingress::{
    CompletionPolicy, ConfigError, DisorderPolicy, FlushPolicy, IngressConfig,
    IngressDescriptorParser, PunctuationPolicy, ReorderStrategy, DEFAULT_BATCH_CAPACITY,
};

#[test]
fn test_load_config_from_json() {
    let json = r#"{
        "disorder": { "drop": 10 },
        "punctuation": { "periodic_time": 100 },
        "flush": "flush_on_batch_boundary",
        "completion": "last_event_time",
        "batch_capacity": 256,
        "strategy": "priority_queue"
    }"#;
    let config: IngressConfig = serde_json::from_str(json).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.disorder, DisorderPolicy::Drop(10));
    assert_eq!(config.punctuation, PunctuationPolicy::PeriodicTime(100));
    assert_eq!(config.flush, FlushPolicy::FlushOnBatchBoundary);
    assert_eq!(config.completion, CompletionPolicy::LastEventTime);
    assert_eq!(config.batch_capacity, 256);
    assert_eq!(config.strategy, ReorderStrategy::PriorityQueue);
}

#[test]
fn test_missing_fields_take_defaults() {
    let config: IngressConfig = serde_json::from_str(r#"{ "disorder": { "adjust": 4 } }"#).unwrap();
    assert_eq!(config.disorder, DisorderPolicy::Adjust(4));
    assert_eq!(config.batch_capacity, DEFAULT_BATCH_CAPACITY);
    assert_eq!(config.flush, FlushPolicy::FlushOnPunctuation);
    assert_eq!(config.completion, CompletionPolicy::EndOfStream);
    assert_eq!(config.strategy, ReorderStrategy::ImpatienceWindow);
}

#[test]
fn test_config_survives_json_and_matches_descriptor() {
    let from_descriptor = IngressDescriptorParser::new(
        "DISORDER THROW 3 PUNCTUATE EVERY 20 FLUSH NONE COMPLETE NONE BATCH 32",
    )
    .parse()
    .unwrap();
    let json = serde_json::to_string(&from_descriptor).unwrap();
    let reloaded: IngressConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(reloaded, from_descriptor);
}

#[test]
fn test_loaded_config_is_validated_by_constructors() {
    let config: IngressConfig =
        serde_json::from_str(r#"{ "punctuation": { "periodic_time": -5 } }"#).unwrap();
    assert_eq!(config.validate(), Err(ConfigError::NonPositivePeriod(-5)));
    let engine = temporal_ingress::IngressEngine::<(), i64, _>::new(
        config,
        temporal_ingress::CollectingSink::<(), i64>::new(),
    );
    assert!(matches!(engine, Err(ConfigError::NonPositivePeriod(-5))));
}
