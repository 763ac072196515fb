use super::{Buffered, ReorderBuffer};
use crate::event::{StreamEvent, Timestamp};
use std::collections::VecDeque;

/// Impatience-sort reorder buffer.
///
/// Events are appended to sorted runs, patience-sort style: an event joins the
/// first run whose tail does not exceed it, or opens a new run. Run tails are
/// strictly decreasing, so the lookup is a binary search, and an in-order
/// event always lands on the first run in O(1). Under bounded disorder only a
/// handful of runs stay alive, and they empty from the front as the release
/// floor advances.
#[derive(Debug)]
pub struct ImpatienceBuffer<P> {
    runs: Vec<VecDeque<Buffered<P>>>,
    len: usize,
}

impl<P> ImpatienceBuffer<P> {
    pub fn new() -> Self {
        Self {
            runs: Vec::new(),
            len: 0,
        }
    }

    /// Number of sorted runs currently alive.
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    fn take_prefixes(&mut self, time: Option<Timestamp>) -> Vec<Buffered<P>> {
        let mut released = Vec::new();
        let mut runs_hit = 0;
        for run in &mut self.runs {
            let before = released.len();
            while run
                .front()
                .is_some_and(|entry| time.is_none_or(|t| entry.event.sync_time() < t))
            {
                if let Some(entry) = run.pop_front() {
                    released.push(entry);
                }
            }
            if released.len() > before {
                runs_hit += 1;
            }
        }
        if released.is_empty() {
            return released;
        }
        self.runs.retain(|run| !run.is_empty());
        if runs_hit > 1 {
            // Keys are unique, so an unstable sort is deterministic.
            released.sort_unstable_by_key(Buffered::key);
        }
        self.len -= released.len();
        released
    }
}

impl<P> Default for ImpatienceBuffer<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> ReorderBuffer<P> for ImpatienceBuffer<P> {
    fn insert(&mut self, seq: u64, event: StreamEvent<P>) {
        let entry = Buffered::new(seq, event);
        let key = entry.key();
        let idx = self
            .runs
            .partition_point(|run| run.back().is_some_and(|tail| tail.key() > key));
        match self.runs.get_mut(idx) {
            Some(run) => run.push_back(entry),
            None => self.runs.push(VecDeque::from([entry])),
        }
        self.len += 1;
    }

    fn release_before(&mut self, time: Timestamp, out: &mut Vec<StreamEvent<P>>) {
        let released = self.take_prefixes(Some(time));
        out.extend(released.into_iter().map(|entry| entry.event));
    }

    fn drain(&mut self, out: &mut Vec<StreamEvent<P>>) {
        let released = self.take_prefixes(None);
        out.extend(released.into_iter().map(|entry| entry.event));
    }

    fn len(&self) -> usize {
        self.len
    }

    fn min_sync_time(&self) -> Option<Timestamp> {
        self.runs
            .iter()
            .filter_map(|run| run.front())
            .map(|entry| entry.event.sync_time())
            .min()
    }
}
