use crate::event::Timestamp;
use crate::policy::PunctuationPolicy;

/// Derives periodic punctuations from a partition's advancing release floor.
///
/// Also remembers the latest punctuation emitted by any other path (ingress
/// punctuations, completion markers) so no punctuation ever goes backwards.
#[derive(Debug, Clone)]
pub struct PunctuationGenerator {
    period: Option<Timestamp>,
    origin: Option<Timestamp>,
    last: Option<Timestamp>,
}

impl PunctuationGenerator {
    pub fn new(policy: PunctuationPolicy) -> Self {
        let period = match policy {
            PunctuationPolicy::None => None,
            PunctuationPolicy::PeriodicTime(p) => Some(p),
        };
        Self {
            period,
            origin: None,
            last: None,
        }
    }

    /// Pins the earliest boundary to the first admitted event time.
    pub fn anchor(&mut self, first_time: Timestamp) {
        self.origin.get_or_insert(first_time);
    }

    /// Returns the greatest period boundary at or below `floor`, if it has
    /// not been punctuated yet.
    pub fn advance(&mut self, floor: Timestamp) -> Option<Timestamp> {
        let period = self.period?;
        let origin = self.origin?;
        let boundary = floor.div_euclid(period).checked_mul(period)?;
        if boundary < origin || self.last.is_some_and(|last| boundary <= last) {
            return None;
        }
        self.last = Some(boundary);
        Some(boundary)
    }

    /// Records a punctuation emitted outside the periodic schedule.
    ///
    /// Returns `false` when `time` would not move punctuation forward.
    pub fn observe(&mut self, time: Timestamp) -> bool {
        if self.last.is_some_and(|last| time <= last) {
            return false;
        }
        self.last = Some(time);
        true
    }

    pub fn last_emitted(&self) -> Option<Timestamp> {
        self.last
    }
}
