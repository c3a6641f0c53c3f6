//! Fiducial selection state machine
//!
//! The operator clicks 3 of the candidate marks on the board preview. The
//! clicks are collected here in order; the third click finalizes the triple.

use alloc::vec::Vec;

use heapless::Vec as BoundedVec;

use super::points::{Fiducial, PotentialFiducial};
use crate::error::Precondition;

/// Selection states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SelectionState {
    /// No selection in progress
    #[default]
    Idle,
    /// Waiting for the operator to click candidates
    Selecting,
    /// 3 candidates chosen
    Finalized,
    /// Operator cancelled
    Cancelled,
}

/// Selection events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SelectionEvent {
    /// Selection opened with enough candidates
    Begin,
    /// Third distinct candidate picked
    Complete,
    /// Operator cancelled
    Cancel,
    /// Error while selecting
    Abort,
}

impl SelectionState {
    /// Process an event and return the next state
    pub fn transition(self, event: SelectionEvent) -> Self {
        use SelectionEvent::*;
        use SelectionState::*;

        match (self, event) {
            (Idle | Finalized | Cancelled, Begin) => Selecting,
            (Selecting, Complete) => Finalized,
            (Selecting, Cancel) => Cancelled,
            (Selecting, Abort) => Idle,
            (state, _) => state,
        }
    }
}

/// Result of a single pick
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PickResult {
    /// Pick recorded; this many more are needed
    Pending(usize),
    /// Pick ignored (duplicate, or not selecting)
    Ignored,
    /// Third pick; the triple in click order
    Finalized([Fiducial; 3]),
}

/// Selection workflow over a candidate list
#[derive(Debug, Clone, Default)]
pub struct FiducialSelection {
    state: SelectionState,
    candidates: Vec<PotentialFiducial>,
    picked: BoundedVec<usize, 3>,
}

impl FiducialSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn candidates(&self) -> &[PotentialFiducial] {
        &self.candidates
    }

    /// Candidate indices picked so far, in click order
    pub fn picked(&self) -> &[usize] {
        &self.picked
    }

    /// 1-based number of the pick being asked for
    pub fn prompt_number(&self) -> usize {
        self.picked.len() + 1
    }

    /// Open a selection over `candidates`
    ///
    /// Needs at least 3 candidates; otherwise the state is unchanged.
    pub fn begin(&mut self, candidates: Vec<PotentialFiducial>) -> Result<(), Precondition> {
        if candidates.len() < 3 {
            return Err(Precondition::NotEnoughCandidates);
        }
        self.candidates = candidates;
        self.picked.clear();
        self.state = self.state.transition(SelectionEvent::Begin);
        Ok(())
    }

    /// Record the operator's click on candidate `index`
    ///
    /// An out-of-range index aborts the selection back to `Idle`.
    pub fn pick(&mut self, index: usize) -> Result<PickResult, Precondition> {
        if self.state != SelectionState::Selecting {
            return Ok(PickResult::Ignored);
        }
        if index >= self.candidates.len() {
            self.abort();
            return Err(Precondition::CandidateOutOfRange);
        }
        if self.picked.contains(&index) {
            return Ok(PickResult::Ignored);
        }
        // Cannot overflow: the third pick leaves the Selecting state
        let _ = self.picked.push(index);

        match self.triple() {
            Some(triple) => {
                self.state = self.state.transition(SelectionEvent::Complete);
                Ok(PickResult::Finalized(triple))
            }
            None => Ok(PickResult::Pending(3 - self.picked.len())),
        }
    }

    /// Operator cancelled; partial picks are discarded
    pub fn cancel(&mut self) {
        self.picked.clear();
        self.state = self.state.transition(SelectionEvent::Cancel);
    }

    /// Error while selecting; partial picks are discarded
    pub fn abort(&mut self) {
        self.picked.clear();
        self.state = self.state.transition(SelectionEvent::Abort);
    }

    /// Finalized triple in click order
    pub fn triple(&self) -> Option<[Fiducial; 3]> {
        match self.picked.as_slice() {
            &[a, b, c] => Some([
                self.candidates[a].into(),
                self.candidates[b].into(),
                self.candidates[c].into(),
            ]),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point2;
    use alloc::vec;

    fn candidates(n: usize) -> Vec<PotentialFiducial> {
        (0..n).map(|i| Point2::new(i as f64 * 10.0, 5.0)).collect()
    }

    #[test]
    fn test_transitions() {
        use SelectionEvent::*;
        use SelectionState::*;
        assert_eq!(Idle.transition(Begin), Selecting);
        assert_eq!(Selecting.transition(Complete), Finalized);
        assert_eq!(Selecting.transition(Cancel), Cancelled);
        assert_eq!(Selecting.transition(Abort), Idle);
        assert_eq!(Finalized.transition(Begin), Selecting);
        assert_eq!(Idle.transition(Complete), Idle);
    }

    #[test]
    fn test_three_picks_in_click_order() {
        let mut sel = FiducialSelection::new();
        sel.begin(candidates(5)).unwrap();
        assert_eq!(sel.pick(4), Ok(PickResult::Pending(2)));
        assert_eq!(sel.pick(0), Ok(PickResult::Pending(1)));
        let Ok(PickResult::Finalized(triple)) = sel.pick(2) else {
            panic!("expected finalized");
        };
        assert_eq!(triple[0].x, 40.0);
        assert_eq!(triple[1].x, 0.0);
        assert_eq!(triple[2].x, 20.0);
        assert_eq!(sel.state(), SelectionState::Finalized);
    }

    #[test]
    fn test_fourth_pick_is_noop() {
        let mut sel = FiducialSelection::new();
        sel.begin(candidates(4)).unwrap();
        for i in 0..3 {
            sel.pick(i).unwrap();
        }
        assert_eq!(sel.pick(3), Ok(PickResult::Ignored));
        assert_eq!(sel.picked(), &[0, 1, 2]);
    }

    #[test]
    fn test_duplicate_pick_ignored() {
        let mut sel = FiducialSelection::new();
        sel.begin(candidates(3)).unwrap();
        sel.pick(1).unwrap();
        assert_eq!(sel.pick(1), Ok(PickResult::Ignored));
        assert_eq!(sel.prompt_number(), 2);
    }

    #[test]
    fn test_too_few_candidates() {
        let mut sel = FiducialSelection::new();
        assert_eq!(sel.begin(candidates(2)), Err(Precondition::NotEnoughCandidates));
        assert_eq!(sel.state(), SelectionState::Idle);
    }

    #[test]
    fn test_bad_index_aborts_to_idle() {
        let mut sel = FiducialSelection::new();
        sel.begin(vec![Point2::new(0.0, 0.0); 3]).unwrap();
        sel.pick(0).unwrap();
        assert_eq!(sel.pick(7), Err(Precondition::CandidateOutOfRange));
        assert_eq!(sel.state(), SelectionState::Idle);
        assert!(sel.picked().is_empty());
    }

    #[test]
    fn test_cancel_discards() {
        let mut sel = FiducialSelection::new();
        sel.begin(candidates(3)).unwrap();
        sel.pick(0).unwrap();
        sel.cancel();
        assert_eq!(sel.state(), SelectionState::Cancelled);
        assert!(sel.triple().is_none());
    }
}
