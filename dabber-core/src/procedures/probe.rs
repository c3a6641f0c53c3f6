//! Per-placement height probing

use alloc::format;

use crate::engine::{Engine, Outcome};
use crate::error::{EngineError, Precondition};
use crate::traits::{Clock, Prompt, PromptResponse, Transport, Vision};

impl<T, V, P, C> Engine<T, V, P, C>
where
    T: Transport,
    V: Vision,
    P: Prompt,
    C: Clock,
{
    /// Record the current machine Z as the height of a placement
    ///
    /// The operator is expected to have lowered the tip onto the pad.
    /// Returns the recorded Z.
    pub async fn probe_placement(&mut self, index: usize) -> Result<f64, EngineError> {
        if index >= self.model.placements().len() {
            return Err(Precondition::PlacementOutOfRange.into());
        }
        let z = self.capture_position().await?.z;
        self.model.probe_placement(index, z)?;
        info!("placement {} probed at {}", index, z);
        Ok(z)
    }

    /// Guided probe: bring the tip over the pad, let the operator touch down
    pub async fn probe_with_prompt(&mut self, index: usize) -> Result<Outcome, EngineError> {
        self.move_tip_to_placement(index).await?;
        let message = format!(
            "Lower the tip onto placement {} and press continue",
            index + 1
        );
        if self.ask(&message).await == PromptResponse::Cancel {
            self.raise_to_safe().await?;
            return Ok(Outcome::Cancelled);
        }
        self.probe_placement(index).await?;
        self.raise_to_safe().await?;
        Ok(Outcome::Completed)
    }

    /// Forget a placement's probed height
    pub fn clear_probe(&mut self, index: usize) -> Result<(), EngineError> {
        self.model.clear_probe(index)?;
        Ok(())
    }
}
