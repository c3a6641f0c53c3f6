//! Camera-to-tip offset calibration

use dabber_protocol::gcode;

use crate::calibration::ToolOffset;
use crate::engine::{Engine, Outcome};
use crate::error::EngineError;
use crate::traits::{Clock, Prompt, PromptResponse, Transport, Vision};

impl<T, V, P, C> Engine<T, V, P, C>
where
    T: Transport,
    V: Vision,
    P: Prompt,
    C: Clock,
{
    /// Measure the offset from camera center to dispensing tip
    ///
    /// The operator centers the camera on a reference mark, the engine moves
    /// by the nominal offset and lowers the tip, then the operator centers the
    /// tip on the same mark. The difference of the two captures is the offset.
    pub async fn calibrate_tip_offset(&mut self) -> Result<Outcome, EngineError> {
        info!("tip offset calibration started");
        if self.ask("Center the camera on a reference mark and press continue").await
            == PromptResponse::Cancel
        {
            info!("tip offset calibration cancelled");
            return Ok(Outcome::Cancelled);
        }
        let camera = self.capture_position().await?;

        let tip = self.config.tip;
        self.send(&gcode::jog_xy(tip.nominal_offset_x, tip.nominal_offset_y)?)
            .await?;
        self.send(&gcode::move_z(tip.centering_z)?).await?;

        if self.ask("Center the tip on the same mark and press continue").await
            == PromptResponse::Cancel
        {
            self.raise_to_safe().await?;
            info!("tip offset calibration cancelled");
            return Ok(Outcome::Cancelled);
        }
        let tip_position = self.capture_position().await?;

        let offset = ToolOffset::new(tip_position.x - camera.x, tip_position.y - camera.y);
        self.model.set_tool_offset(offset);
        self.raise_to_safe().await?;
        info!("tip offset {} {}", offset.x, offset.y);
        Ok(Outcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use crate::traits::MachinePosition;
    use embassy_futures::block_on;

    #[test]
    fn test_offset_is_tip_minus_camera() {
        let (mut engine, sim) = rig();
        // Camera jogged onto the mark; the tip then already sits on it
        engine
            .prompt
            .jogs
            .extend([Some(MachinePosition::new(100.0, 80.0, 10.0)), None]);
        let outcome = block_on(engine.calibrate_tip_offset());
        assert_eq!(outcome, Ok(Outcome::Completed));
        assert_eq!(engine.model().tool_offset(), ToolOffset::new(45.0, 0.0));
        assert_eq!(sim.borrow().z, 31.5);

        let commands = engine.transport().commands();
        assert!(commands.iter().any(|c| c == "G0 X45.000 Y0.000"));
        assert!(commands.iter().any(|c| c == "G0 Z30.000"));
    }

    #[test]
    fn test_operator_correction_is_measured() {
        let (mut engine, sim) = rig();
        engine.prompt.jogs.extend([
            Some(MachinePosition::new(100.0, 80.0, 10.0)),
            Some(MachinePosition::new(144.2, 81.5, 30.0)),
        ]);
        block_on(engine.calibrate_tip_offset()).unwrap();
        let offset = engine.model().tool_offset();
        assert!(crate::geometry::abs(offset.x - 44.2) < 1e-9);
        assert!(crate::geometry::abs(offset.y - 1.5) < 1e-9);
        assert_eq!(sim.borrow().z, 31.5);
    }

    #[test]
    fn test_cancel_at_tip_step_raises_and_keeps_offset() {
        let (mut engine, sim) = rig();
        engine.model_mut().set_tool_offset(ToolOffset::new(40.0, 1.0));
        engine
            .prompt
            .answers
            .extend([PromptResponse::Continue, PromptResponse::Cancel]);
        assert_eq!(
            block_on(engine.calibrate_tip_offset()),
            Ok(Outcome::Cancelled)
        );
        assert_eq!(engine.model().tool_offset(), ToolOffset::new(40.0, 1.0));
        assert_eq!(sim.borrow().z, 31.5);
    }

    #[test]
    fn test_cancel_at_camera_step_moves_nothing() {
        let (mut engine, _) = rig();
        engine.prompt.answers.push_back(PromptResponse::Cancel);
        assert_eq!(
            block_on(engine.calibrate_tip_offset()),
            Ok(Outcome::Cancelled)
        );
        assert!(engine.transport().batches.is_empty());
    }
}
