//! Learning stepping, automated replay and unattended runs

use alloc::vec::Vec;

use dabber_protocol::gcode;

use super::dispense::pad_batch;
use super::phase::RunEvent;
use crate::cancel::CancelToken;
use crate::engine::{Engine, Outcome};
use crate::error::{EngineError, Precondition};
use crate::geometry::Point3;
use crate::procedures::navigate::{tip_batch, travel_batch};
use crate::traits::{Clock, Prompt, Transport, Vision};

/// Result of an unattended run that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RunReport {
    pub outcome: Outcome,
    /// Placements whose batch was acknowledged
    pub completed: usize,
}

impl<T, V, P, C> Engine<T, V, P, C>
where
    T: Transport,
    V: Vision,
    P: Prompt,
    C: Clock,
{
    /// Step to the next placement and start dispensing on it
    ///
    /// Stops and lifts off the current pad first. In learning mode the time
    /// spent on the pad being left is recorded, except for the first pad.
    /// Returns the new index, or `None` when there is no next placement.
    pub async fn advance_to_next(&mut self) -> Result<Option<usize>, EngineError> {
        self.check_run_preconditions()?;
        let next = self.run.next_index();
        if next >= self.model.placements().len() {
            debug!("advance: no placement after {:?}", self.run.current());
            return Ok(None);
        }
        let target = self.dispense_position(next)?;

        self.leave_current_pad().await?;
        self.start_pad(next, target).await?;
        Ok(Some(next))
    }

    /// Stop dispensing on the current pad and lift off it
    ///
    /// Ends a learning pass after the last placement. Does nothing if no pad
    /// is being dispensed.
    pub async fn finish_stepping(&mut self) -> Result<(), EngineError> {
        self.leave_current_pad().await
    }

    /// Replay the remaining placements with the learned dispense duration
    ///
    /// Needs at least 2 timing samples. Cancellation is checked around each
    /// stop step. The machine is parked at the end unless a command failed;
    /// learning mode is restored either way.
    pub async fn run_automated(&mut self, cancel: &CancelToken) -> Result<Outcome, EngineError> {
        self.check_run_preconditions()?;
        if self.run.timings().len() < 2 {
            return Err(Precondition::InsufficientTimingSamples.into());
        }
        let hold_ms = self
            .run
            .auto_duration()
            .ok_or(Precondition::InsufficientTimingSamples)?;
        info!("automated run from {}, hold {} ms", self.run.next_index(), hold_ms);

        self.run.set_learning(false);
        let result = match self.replay(cancel, hold_ms).await {
            Ok(outcome) => self.park().await.map(|_| outcome),
            Err(e) => Err(e),
        };
        self.run.set_learning(true);

        match &result {
            Ok(outcome) => info!("automated run ended: {:?}", outcome),
            Err(e) => error!("automated run failed: {:?}", e),
        }
        result
    }

    /// Dispense every placement in order, one batch per pad
    ///
    /// All batches are built before the first move, so a bad position fails
    /// the run without motion. Cancellation is checked before each pad.
    pub async fn run_job(&mut self, cancel: &CancelToken) -> Result<RunReport, EngineError> {
        self.check_run_preconditions()?;
        let total = self.model.placements().len();
        let mut batches = Vec::with_capacity(total);
        for (index, placement) in self.model.placements().iter().enumerate() {
            let position = self.dispense_position(index)?;
            batches.push(pad_batch(
                position,
                placement.area,
                &self.config.dispense,
                &self.config.motion,
            )?);
        }

        info!("job started: {} placements", total);
        self.run.rewind();
        self.run.apply(RunEvent::Begin);
        if let Err(e) = self.raise_to_safe().await {
            self.run.apply(RunEvent::Fault);
            return Err(e);
        }

        for (index, batch) in batches.iter().enumerate() {
            if cancel.is_cancelled() {
                self.run.apply(RunEvent::CancelObserved);
                info!("job cancelled after {} placements", index);
                return Ok(RunReport {
                    outcome: Outcome::Cancelled,
                    completed: index,
                });
            }
            if let Err(e) = self.send(batch).await {
                self.run.apply(RunEvent::Fault);
                error!("placement {} failed: {:?}", index, e);
                return Err(e);
            }
            self.run.set_current(index);
            self.run.apply(RunEvent::PlacementDone { total });
        }

        info!("job completed");
        Ok(RunReport {
            outcome: Outcome::Completed,
            completed: total,
        })
    }

    /// Forget the run index and learned timings
    pub fn reset_run(&mut self) {
        self.run.reset();
    }

    fn check_run_preconditions(&self) -> Result<(), Precondition> {
        if self.model.placements().is_empty() {
            return Err(Precondition::NoPlacements);
        }
        if !self.model.is_calibrated() {
            return Err(Precondition::NotCalibrated);
        }
        Ok(())
    }

    async fn replay(&mut self, cancel: &CancelToken, hold_ms: u64) -> Result<Outcome, EngineError> {
        let total = self.model.placements().len();
        loop {
            let next = self.run.next_index();
            if next >= total {
                return Ok(Outcome::Completed);
            }
            if cancel.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }
            let target = self.dispense_position(next)?;
            self.leave_current_pad().await?;
            if cancel.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }
            self.start_pad(next, target).await?;
            self.clock.delay_ms(hold_ms).await;
        }
    }

    /// Stop the extruder and lift off the current pad, if dispensing
    async fn leave_current_pad(&mut self) -> Result<(), EngineError> {
        let (Some(current), Some(started)) = (self.run.current(), self.run.dispense_started_at())
        else {
            return Ok(());
        };
        let elapsed = self.clock.now_ms().saturating_sub(started);

        let dispense = self.config.dispense;
        self.send(&gcode::stop_extrude(self.config.motion.travel_feedrate)?)
            .await?;
        self.send(&gcode::retract_and_raise(
            dispense.retraction_degrees,
            self.config.motion.safe_z,
        )?)
        .await?;
        self.run.stop_dispense();

        if self.run.is_learning() && current > 0 {
            self.run.record_timing(elapsed);
            debug!("pad {} took {} ms", current, elapsed);
        }
        Ok(())
    }

    async fn start_pad(&mut self, index: usize, target: Point3) -> Result<(), EngineError> {
        let batch = tip_batch(target, self.config.motion.safe_z)?;
        self.send(&batch).await?;

        let dispense = self.config.dispense;
        self.send(&gcode::start_extrude(
            dispense.extrude_distance,
            dispense.extrude_feedrate,
        )?)
        .await?;
        self.run.set_current(index);
        self.run.start_dispense(self.clock.now_ms());
        debug!("dispensing on placement {}", index);
        Ok(())
    }

    async fn park(&mut self) -> Result<(), EngineError> {
        self.leave_current_pad().await?;
        let motion = self.config.motion;
        self.send(&travel_batch(motion.park_x, motion.park_y, motion.safe_z)?)
            .await
    }
}
