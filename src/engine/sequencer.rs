use crate::engine::punctuation::PunctuationGenerator;
use crate::error::IngressError;
use crate::event::{BEGINNING_OF_TIME, END_OF_TIME, StreamEvent, Timestamp};
use crate::policy::{CompletionPolicy, DisorderPolicy, IngressConfig};
use crate::reorder::{ReorderBuffer, StrategyBuffer};
use std::cmp;
use std::marker::PhantomData;

/// Lifecycle of one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionState {
    Empty,
    Active,
    Draining,
    Closed,
    /// Halted by a fatal admission error.
    Faulted,
}

impl PartitionState {
    pub fn accepts_events(&self) -> bool {
        matches!(self, PartitionState::Empty | PartitionState::Active)
    }
}

/// Counters for one partition's sequencer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequencerStats {
    pub admitted: u64,
    pub dropped: u64,
    pub adjusted: u64,
    pub released: u64,
    pub punctuations: u64,
    pub buffered: usize,
}

/// Result of offering one event to the sequencer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission<P> {
    /// Whether the event entered the buffer (possibly adjusted).
    pub admitted: bool,
    /// Events now safe to release, in order.
    pub released: Vec<StreamEvent<P>>,
}

impl<P> Admission<P> {
    fn rejected() -> Self {
        Self {
            admitted: false,
            released: Vec::new(),
        }
    }
}

/// Per-partition admission and reordering engine.
///
/// Admits events under the configured `DisorderPolicy`, holds them in a
/// reorder buffer and releases them once the release floor
/// (`watermark - slack`, raised by ingress punctuations) has passed them.
/// Released output is non-decreasing in sync time, punctuations included.
#[derive(Debug)]
pub struct TemporalSequencer<P, B = StrategyBuffer<P>> {
    disorder: DisorderPolicy,
    completion: CompletionPolicy,
    buffer: B,
    punctuations: PunctuationGenerator,
    state: PartitionState,
    watermark: Option<Timestamp>,
    ingress_floor: Timestamp,
    next_seq: u64,
    stats: SequencerStats,
    _payload: PhantomData<P>,
}

impl<P> TemporalSequencer<P> {
    /// Creates a sequencer using the buffer named by `config.strategy`.
    pub fn new(config: &IngressConfig) -> Self {
        Self::with_buffer(config, StrategyBuffer::new(config.strategy))
    }
}

impl<P, B: ReorderBuffer<P>> TemporalSequencer<P, B> {
    pub fn with_buffer(config: &IngressConfig, buffer: B) -> Self {
        Self {
            disorder: config.disorder,
            completion: config.completion,
            buffer,
            punctuations: PunctuationGenerator::new(config.punctuation),
            state: PartitionState::Empty,
            watermark: None,
            ingress_floor: BEGINNING_OF_TIME,
            next_seq: 0,
            stats: SequencerStats::default(),
            _payload: PhantomData,
        }
    }

    pub fn state(&self) -> PartitionState {
        self.state
    }

    /// Greatest admitted sync time.
    pub fn watermark(&self) -> Option<Timestamp> {
        self.watermark
    }

    /// Smallest sync time still admissible without applying the late-event
    /// policy. Buffered events below it have been released.
    pub fn floor(&self) -> Timestamp {
        let slack = self.disorder.slack().unwrap_or(0);
        let from_watermark = self
            .watermark
            .map_or(BEGINNING_OF_TIME, |wm| wm.saturating_sub(slack));
        cmp::max(from_watermark, self.ingress_floor)
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> SequencerStats {
        SequencerStats {
            buffered: self.buffer.len(),
            ..self.stats
        }
    }

    /// Offers one event. Punctuations are routed to [`Self::punctuate`].
    pub fn admit(&mut self, event: StreamEvent<P>) -> Result<Admission<P>, IngressError> {
        self.ensure_accepting()?;
        if let StreamEvent::Punctuation { sync_time } = event {
            let released = self.punctuate(sync_time)?;
            return Ok(Admission {
                admitted: false,
                released,
            });
        }
        event.validate()?;

        match self.disorder {
            DisorderPolicy::None => self.admit_in_order(event),
            DisorderPolicy::Drop(_) | DisorderPolicy::Throw(_) | DisorderPolicy::Adjust(_) => {
                self.admit_reordered(event)
            }
        }
    }

    fn admit_in_order(&mut self, event: StreamEvent<P>) -> Result<Admission<P>, IngressError> {
        let sync_time = event.sync_time();
        let floor = self.floor();
        if sync_time < floor {
            return Err(self.fault(IngressError::OutOfOrder {
                sync_time,
                watermark: floor,
            }));
        }
        self.observe_admitted(sync_time);

        let mut released = Vec::with_capacity(2);
        if let Some(boundary) = self.punctuations.advance(sync_time) {
            released.push(StreamEvent::punctuation(boundary));
            self.stats.punctuations += 1;
        }
        released.push(event);
        self.stats.released += 1;
        Ok(Admission {
            admitted: true,
            released,
        })
    }

    fn admit_reordered(&mut self, event: StreamEvent<P>) -> Result<Admission<P>, IngressError> {
        let sync_time = event.sync_time();
        let floor = self.floor();
        let event = if sync_time < floor {
            match self.disorder {
                DisorderPolicy::Throw(_) => {
                    return Err(self.fault(IngressError::LateEvent { sync_time, floor }));
                }
                DisorderPolicy::Adjust(_) => match event.shifted_to(floor) {
                    Some(adjusted) => {
                        log::debug!("adjusted late event from {} to {}", sync_time, floor);
                        self.stats.adjusted += 1;
                        adjusted
                    }
                    None => {
                        log::debug!(
                            "dropped late interval at {} ending at or before floor {}",
                            sync_time,
                            floor
                        );
                        self.stats.dropped += 1;
                        return Ok(Admission::rejected());
                    }
                },
                DisorderPolicy::Drop(_) | DisorderPolicy::None => {
                    log::debug!("dropped late event at {} below floor {}", sync_time, floor);
                    self.stats.dropped += 1;
                    return Ok(Admission::rejected());
                }
            }
        } else {
            event
        };

        self.observe_admitted(event.sync_time());
        self.buffer.insert(self.next_seq, event);
        self.next_seq += 1;

        let released = self.release_to(self.floor());
        Ok(Admission {
            admitted: true,
            released,
        })
    }

    /// Applies a source punctuation: nothing below `time` will arrive.
    ///
    /// Raises the floor (never lowers it), releases everything below it and
    /// emits a punctuation at `time`.
    pub fn punctuate(&mut self, time: Timestamp) -> Result<Vec<StreamEvent<P>>, IngressError> {
        self.ensure_accepting()?;
        if time <= self.floor() {
            return Ok(Vec::new());
        }
        self.ingress_floor = time;
        if self.state == PartitionState::Empty {
            self.state = PartitionState::Active;
        }

        let mut released = self.release_to(time);
        if self.punctuations.observe(time) {
            released.push(StreamEvent::punctuation(time));
            self.stats.punctuations += 1;
        }
        Ok(released)
    }

    /// Drains the buffer in order and appends the completion marker.
    ///
    /// Idempotent: a closed or faulted partition yields nothing.
    pub fn complete(&mut self) -> Vec<StreamEvent<P>> {
        if matches!(self.state, PartitionState::Closed | PartitionState::Faulted) {
            return Vec::new();
        }
        self.state = PartitionState::Draining;

        let mut released = Vec::with_capacity(self.buffer.len() + 1);
        self.buffer.drain(&mut released);
        self.stats.released += released.len() as u64;

        let marker = match self.completion {
            CompletionPolicy::None => None,
            CompletionPolicy::EndOfStream => Some(END_OF_TIME),
            CompletionPolicy::LastEventTime => self.watermark,
        };
        if let Some(time) = marker.filter(|time| self.punctuations.observe(*time)) {
            released.push(StreamEvent::punctuation(time));
            self.stats.punctuations += 1;
        }

        self.state = PartitionState::Closed;
        released
    }

    fn ensure_accepting(&self) -> Result<(), IngressError> {
        if self.state.accepts_events() {
            return Ok(());
        }
        match self.state {
            PartitionState::Faulted => Err(IngressError::PartitionFaulted),
            _ => Err(IngressError::PartitionClosed),
        }
    }

    fn observe_admitted(&mut self, sync_time: Timestamp) {
        if self.state == PartitionState::Empty {
            self.state = PartitionState::Active;
        }
        self.punctuations.anchor(sync_time);
        self.watermark = Some(self.watermark.map_or(sync_time, |wm| cmp::max(wm, sync_time)));
        self.stats.admitted += 1;
    }

    /// Releases buffered events below `floor`, placing a due periodic
    /// punctuation after the data below it.
    fn release_to(&mut self, floor: Timestamp) -> Vec<StreamEvent<P>> {
        let mut released = Vec::new();
        if let Some(boundary) = self.punctuations.advance(floor) {
            self.buffer.release_before(boundary, &mut released);
            released.push(StreamEvent::punctuation(boundary));
            self.stats.punctuations += 1;
        }
        self.buffer.release_before(floor, &mut released);
        self.stats.released += released.iter().filter(|e| e.is_data()).count() as u64;
        released
    }

    fn fault(&mut self, error: IngressError) -> IngressError {
        let mut discarded = Vec::new();
        self.buffer.drain(&mut discarded);
        log::warn!(
            "partition halted: {} ({} buffered events discarded)",
            error,
            discarded.len()
        );
        self.state = PartitionState::Faulted;
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{PunctuationPolicy, ReorderStrategy};

    fn sequencer(disorder: DisorderPolicy) -> TemporalSequencer<i64> {
        TemporalSequencer::new(&IngressConfig::new().with_disorder(disorder))
    }

    fn feed(seq: &mut TemporalSequencer<i64>, times: &[i64]) -> Vec<StreamEvent<i64>> {
        let mut out = Vec::new();
        for &t in times {
            out.extend(seq.admit(StreamEvent::start(t, t)).unwrap().released);
        }
        out
    }

    fn times(events: &[StreamEvent<i64>]) -> Vec<i64> {
        events.iter().map(StreamEvent::sync_time).collect()
    }

    #[test]
    fn test_drop_releases_once_floor_passes() {
        let mut seq = sequencer(DisorderPolicy::Drop(2));
        let out = feed(&mut seq, &[5, 3, 6, 4]);
        // floor after 6 is 4: only 3 is releasable
        assert_eq!(times(&out), vec![3]);
        assert_eq!(seq.floor(), 4);
        assert_eq!(seq.buffered(), 3);

        let out = feed(&mut seq, &[9]);
        assert_eq!(times(&out), vec![4, 5, 6]);
    }

    #[test]
    fn test_drop_discards_late_event_without_moving_watermark() {
        let mut seq = sequencer(DisorderPolicy::Drop(2));
        feed(&mut seq, &[10]);
        let admission = seq.admit(StreamEvent::start(7, 7)).unwrap();
        assert!(!admission.admitted);
        assert!(admission.released.is_empty());
        assert_eq!(seq.watermark(), Some(10));
        assert_eq!(seq.stats().dropped, 1);

        let admission = seq.admit(StreamEvent::start(8, 8)).unwrap();
        assert!(admission.admitted);
    }

    #[test]
    fn test_throw_faults_partition() {
        let mut seq = sequencer(DisorderPolicy::Throw(1));
        feed(&mut seq, &[10, 9]);
        let err = seq.admit(StreamEvent::start(5, 5)).unwrap_err();
        assert_eq!(err, IngressError::LateEvent { sync_time: 5, floor: 9 });
        assert_eq!(seq.state(), PartitionState::Faulted);
        assert_eq!(seq.buffered(), 0);
        assert_eq!(
            seq.admit(StreamEvent::start(20, 20)).unwrap_err(),
            IngressError::PartitionFaulted
        );
        assert!(seq.complete().is_empty());
    }

    #[test]
    fn test_adjust_moves_late_event_to_floor() {
        let mut seq = sequencer(DisorderPolicy::Adjust(3));
        feed(&mut seq, &[10]);
        let admission = seq.admit(StreamEvent::start(2, 2)).unwrap();
        assert!(admission.admitted);
        assert_eq!(seq.stats().adjusted, 1);

        let out = seq.complete();
        assert_eq!(
            out,
            vec![
                StreamEvent::start(7, 2),
                StreamEvent::start(10, 10),
                StreamEvent::punctuation(END_OF_TIME)
            ]
        );
    }

    #[test]
    fn test_adjust_drops_interval_that_would_become_empty() {
        let mut seq = sequencer(DisorderPolicy::Adjust(0));
        feed(&mut seq, &[10]);
        let admission = seq.admit(StreamEvent::interval(2, 8, 0)).unwrap();
        assert!(!admission.admitted);
        assert_eq!(seq.stats().dropped, 1);

        let admission = seq.admit(StreamEvent::interval(2, 12, 0)).unwrap();
        assert!(admission.admitted);
    }

    #[test]
    fn test_none_passes_through_and_faults_on_disorder() {
        let mut seq = sequencer(DisorderPolicy::None);
        let out = feed(&mut seq, &[1, 2, 2, 3]);
        assert_eq!(times(&out), vec![1, 2, 2, 3]);
        assert_eq!(seq.buffered(), 0);

        let err = seq.admit(StreamEvent::start(1, 1)).unwrap_err();
        assert_eq!(
            err,
            IngressError::OutOfOrder {
                sync_time: 1,
                watermark: 3
            }
        );
        assert_eq!(seq.state(), PartitionState::Faulted);
    }

    #[test]
    fn test_malformed_interval_is_rejected_without_state_change() {
        let mut seq = sequencer(DisorderPolicy::Drop(5));
        let err = seq.admit(StreamEvent::interval(4, 4, 0)).unwrap_err();
        assert!(matches!(err, IngressError::MalformedInterval { .. }));
        assert_eq!(seq.state(), PartitionState::Empty);
        assert_eq!(seq.stats().admitted, 0);
    }

    #[test]
    fn test_periodic_punctuation_precedes_data_at_boundary() {
        let config = IngressConfig::new()
            .with_disorder(DisorderPolicy::Drop(0))
            .with_punctuation(PunctuationPolicy::PeriodicTime(10));
        let mut seq: TemporalSequencer<i64> = TemporalSequencer::new(&config);
        let out = feed(&mut seq, &[8, 9, 10, 11]);
        assert_eq!(
            out,
            vec![
                StreamEvent::start(8, 8),
                StreamEvent::start(9, 9),
                StreamEvent::punctuation(10),
                StreamEvent::start(10, 10),
            ]
        );
    }

    #[test]
    fn test_ingress_punctuation_raises_floor() {
        let mut seq = sequencer(DisorderPolicy::Drop(100));
        feed(&mut seq, &[5, 3, 8]);
        let out = seq.punctuate(6).unwrap();
        assert_eq!(
            out,
            vec![
                StreamEvent::start(3, 3),
                StreamEvent::start(5, 5),
                StreamEvent::punctuation(6)
            ]
        );
        assert_eq!(seq.floor(), 6);
        // Lower punctuations carry no information.
        assert!(seq.punctuate(4).unwrap().is_empty());

        let admission = seq.admit(StreamEvent::start(4, 4)).unwrap();
        assert!(!admission.admitted);
    }

    #[test]
    fn test_completion_policies() {
        for (policy, marker) in [
            (CompletionPolicy::None, None),
            (CompletionPolicy::EndOfStream, Some(END_OF_TIME)),
            (CompletionPolicy::LastEventTime, Some(9)),
        ] {
            let config = IngressConfig::new()
                .with_disorder(DisorderPolicy::Drop(10))
                .with_completion(policy);
            let mut seq: TemporalSequencer<i64> = TemporalSequencer::new(&config);
            feed(&mut seq, &[9, 4, 7]);
            let out = seq.complete();
            assert_eq!(times(&out[..3]), vec![4, 7, 9]);
            assert_eq!(out.get(3).map(StreamEvent::sync_time), marker);
            assert_eq!(out.len(), 3 + marker.iter().count());
            assert_eq!(seq.state(), PartitionState::Closed);

            assert!(seq.complete().is_empty());
            assert_eq!(
                seq.admit(StreamEvent::start(20, 20)).unwrap_err(),
                IngressError::PartitionClosed
            );
        }
    }

    #[test]
    fn test_strategies_release_identically() {
        let input = [12, 3, 7, 7, 1, 15, 9, 2, 20, 18, 11, 30];
        let mut outputs = Vec::new();
        for strategy in [ReorderStrategy::ImpatienceWindow, ReorderStrategy::PriorityQueue] {
            let config = IngressConfig::new()
                .with_disorder(DisorderPolicy::Drop(6))
                .with_punctuation(PunctuationPolicy::PeriodicTime(5))
                .with_strategy(strategy);
            let mut seq: TemporalSequencer<i64> = TemporalSequencer::new(&config);
            let mut out = feed(&mut seq, &input);
            out.extend(seq.complete());
            outputs.push(out);
        }
        assert_eq!(outputs[0], outputs[1]);
    }

    #[test]
    fn test_only_open_states_accept_events() {
        assert!(PartitionState::Empty.accepts_events());
        assert!(PartitionState::Active.accepts_events());
        for state in [
            PartitionState::Draining,
            PartitionState::Closed,
            PartitionState::Faulted,
        ] {
            assert!(!state.accepts_events());
        }

        let mut seq = sequencer(DisorderPolicy::Drop(1));
        assert_eq!(seq.state(), PartitionState::Empty);
        feed(&mut seq, &[1]);
        assert_eq!(seq.state(), PartitionState::Active);
        seq.complete();
        assert_eq!(
            seq.punctuate(5).unwrap_err(),
            IngressError::PartitionClosed
        );
    }
}
