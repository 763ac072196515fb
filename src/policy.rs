use crate::error::ConfigError;
use crate::event::Timestamp;
use serde::{Deserialize, Serialize};

/// Default number of events per released batch.
pub const DEFAULT_BATCH_CAPACITY: usize = 1024;

/// Admission policy for events that arrive behind the watermark.
///
/// The parameter is the reorder slack `k`: an event is admissible while its
/// sync time is at least `watermark - k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisorderPolicy {
    /// Source order is trusted; nothing is buffered.
    #[default]
    None,
    Drop(i64),
    Throw(i64),
    Adjust(i64),
}

impl DisorderPolicy {
    pub fn slack(&self) -> Option<i64> {
        match self {
            DisorderPolicy::None => None,
            DisorderPolicy::Drop(k) | DisorderPolicy::Throw(k) | DisorderPolicy::Adjust(k) => {
                Some(*k)
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.slack() {
            Some(k) if k < 0 => Err(ConfigError::NegativeSlack(k)),
            _ => Ok(()),
        }
    }
}

/// Periodic watermark generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunctuationPolicy {
    #[default]
    None,
    /// Punctuate at every multiple of the period.
    PeriodicTime(Timestamp),
}

impl PunctuationPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            PunctuationPolicy::PeriodicTime(p) if *p <= 0 => {
                Err(ConfigError::NonPositivePeriod(*p))
            }
            _ => Ok(()),
        }
    }
}

/// When a partially filled batch is released early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicy {
    /// Release only full batches.
    None,
    /// Release the pending batch every `batch_capacity` admitted events.
    FlushOnBatchBoundary,
    /// Release the pending batch on every punctuation.
    #[default]
    FlushOnPunctuation,
}

/// Final marker emitted once a partition completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    None,
    /// Punctuation at `END_OF_TIME`.
    #[default]
    EndOfStream,
    /// Punctuation at the greatest admitted event time.
    LastEventTime,
}

/// Reorder buffer implementation. Both produce the same output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderStrategy {
    #[default]
    ImpatienceWindow,
    PriorityQueue,
}

/// Immutable configuration of one ingress instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngressConfig {
    pub disorder: DisorderPolicy,
    pub punctuation: PunctuationPolicy,
    pub flush: FlushPolicy,
    pub completion: CompletionPolicy,
    pub batch_capacity: usize,
    pub strategy: ReorderStrategy,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            disorder: DisorderPolicy::default(),
            punctuation: PunctuationPolicy::default(),
            flush: FlushPolicy::default(),
            completion: CompletionPolicy::default(),
            batch_capacity: DEFAULT_BATCH_CAPACITY,
            strategy: ReorderStrategy::default(),
        }
    }
}

impl IngressConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_disorder(mut self, disorder: DisorderPolicy) -> Self {
        self.disorder = disorder;
        self
    }

    pub fn with_punctuation(mut self, punctuation: PunctuationPolicy) -> Self {
        self.punctuation = punctuation;
        self
    }

    pub fn with_flush(mut self, flush: FlushPolicy) -> Self {
        self.flush = flush;
        self
    }

    pub fn with_completion(mut self, completion: CompletionPolicy) -> Self {
        self.completion = completion;
        self
    }

    pub fn with_batch_capacity(mut self, batch_capacity: usize) -> Self {
        self.batch_capacity = batch_capacity;
        self
    }

    pub fn with_strategy(mut self, strategy: ReorderStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Checks every parameter; called by every ingress constructor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_capacity == 0 {
            return Err(ConfigError::ZeroBatchCapacity);
        }
        self.disorder.validate()?;
        self.punctuation.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = IngressConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_capacity, DEFAULT_BATCH_CAPACITY);
        assert_eq!(config.flush, FlushPolicy::FlushOnPunctuation);
        assert_eq!(config.completion, CompletionPolicy::EndOfStream);
    }

    #[test]
    fn test_rejects_misconfiguration() {
        let zero = IngressConfig::new().with_batch_capacity(0);
        assert_eq!(zero.validate(), Err(ConfigError::ZeroBatchCapacity));

        let negative = IngressConfig::new().with_disorder(DisorderPolicy::Adjust(-1));
        assert_eq!(negative.validate(), Err(ConfigError::NegativeSlack(-1)));

        let period = IngressConfig::new().with_punctuation(PunctuationPolicy::PeriodicTime(0));
        assert_eq!(period.validate(), Err(ConfigError::NonPositivePeriod(0)));
    }

    #[test]
    fn test_slack() {
        assert_eq!(DisorderPolicy::None.slack(), None);
        assert_eq!(DisorderPolicy::Drop(3).slack(), Some(3));
        assert_eq!(DisorderPolicy::Throw(0).slack(), Some(0));
    }
}
