//! Interactive fiducial selection

use alloc::format;
use alloc::vec::Vec;

use crate::calibration::PickResult;
use crate::engine::{Engine, Outcome};
use crate::error::{EngineError, Precondition};
use crate::traits::{CandidatePicker, Clock, Prompt, Transport, Vision};

impl<T, V, P, C> Engine<T, V, P, C>
where
    T: Transport,
    V: Vision,
    P: Prompt,
    C: Clock,
{
    /// Let the operator pick 3 fiducials from the candidates
    ///
    /// Uses the design's candidates, or re-opens the finalized fiducials when
    /// fewer than 3 candidates are left. The picked triple replaces the
    /// fiducials only once all 3 are chosen.
    pub async fn select_fiducials<K: CandidatePicker>(
        &mut self,
        picker: &mut K,
    ) -> Result<Outcome, EngineError> {
        let candidates: Vec<_> = if self.model.candidates().len() >= 3 {
            self.model.candidates().to_vec()
        } else if self.model.fiducials().len() >= 3 {
            self.model.fiducials().iter().map(|f| f.xy()).collect()
        } else {
            return Err(Precondition::NotEnoughCandidates.into());
        };
        self.selection.begin(candidates)?;
        debug!("selecting from {} candidates", self.selection.candidates().len());

        loop {
            let message = format!("Select fiducial {} of 3", self.selection.prompt_number());
            let Some(index) = picker.pick(&message).await else {
                self.selection.cancel();
                info!("fiducial selection cancelled");
                return Ok(Outcome::Cancelled);
            };

            match self.selection.pick(index)? {
                PickResult::Finalized(triple) => {
                    self.model.set_fiducials(triple);
                    info!("fiducials selected");
                    return Ok(Outcome::Completed);
                }
                PickResult::Pending(_) | PickResult::Ignored => {}
            }
        }
    }
}
