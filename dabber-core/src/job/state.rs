//! Per-run bookkeeping: stepping index and learned dispense timing

use alloc::vec::Vec;

use super::phase::{RunEvent, RunPhase};

/// Run state; reset between runs, never persisted
#[derive(Debug, Clone)]
pub struct JobRunState {
    current: Option<usize>,
    last_navigated: Option<usize>,
    timings: Vec<u64>,
    dispense_started_at: Option<u64>,
    learning: bool,
    phase: RunPhase,
}

impl Default for JobRunState {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRunState {
    pub fn new() -> Self {
        Self {
            current: None,
            last_navigated: None,
            timings: Vec::new(),
            dispense_started_at: None,
            learning: true,
            phase: RunPhase::NotStarted,
        }
    }

    /// Placement being dispensed; `None` before the first one
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Index the next step would dispense
    pub fn next_index(&self) -> usize {
        self.current.map_or(0, |i| i + 1)
    }

    /// Last placement the camera or tip was sent to
    pub fn last_navigated(&self) -> Option<usize> {
        self.last_navigated
    }

    /// Observed per-pad dispense durations, first pad excluded
    pub fn timings(&self) -> &[u64] {
        &self.timings
    }

    pub fn is_learning(&self) -> bool {
        self.learning
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Mean of the recorded timings in milliseconds
    pub fn auto_duration(&self) -> Option<u64> {
        if self.timings.is_empty() {
            return None;
        }
        let total: u64 = self.timings.iter().sum();
        Some(total / self.timings.len() as u64)
    }

    /// Forget everything, back to learning mode
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Restart stepping from the first placement, keeping learned timings
    pub fn rewind(&mut self) {
        self.current = None;
        self.dispense_started_at = None;
    }

    pub(crate) fn set_last_navigated(&mut self, index: usize) {
        self.last_navigated = Some(index);
    }

    pub(crate) fn set_current(&mut self, index: usize) {
        self.current = Some(index);
        self.last_navigated = Some(index);
    }

    pub(crate) fn set_learning(&mut self, learning: bool) {
        self.learning = learning;
    }

    pub(crate) fn dispense_started_at(&self) -> Option<u64> {
        self.dispense_started_at
    }

    pub(crate) fn start_dispense(&mut self, now_ms: u64) {
        self.dispense_started_at = Some(now_ms);
    }

    pub(crate) fn stop_dispense(&mut self) {
        self.dispense_started_at = None;
    }

    pub(crate) fn record_timing(&mut self, duration_ms: u64) {
        self.timings.push(duration_ms);
    }

    pub(crate) fn apply(&mut self, event: RunEvent) {
        self.phase = self.phase.transition(event);
    }
}
