//! Camera and tip positioning

use dabber_protocol::{gcode, Axis, Batch, CommandError};

use crate::engine::Engine;
use crate::error::{EngineError, Precondition};
use crate::geometry::{Point2, Point3};
use crate::traits::{Clock, Prompt, Transport, Vision};

/// Rise to `safe_z`, then travel to `(x, y)`
pub(crate) fn travel_batch(x: f64, y: f64, safe_z: f64) -> Result<Batch, CommandError> {
    let mut batch = Batch::new();
    batch
        .push(gcode::absolute())?
        .push(gcode::rapid(&[(Axis::Z, safe_z)])?)?
        .push(gcode::rapid(&[(Axis::X, x), (Axis::Y, y)])?)?;
    Ok(batch)
}

/// Travel over `target` at `safe_z`, then descend to its Z
pub(crate) fn tip_batch(target: Point3, safe_z: f64) -> Result<Batch, CommandError> {
    let mut batch = travel_batch(target.x, target.y, safe_z)?;
    batch.push(gcode::rapid(&[(Axis::Z, target.z)])?)?;
    Ok(batch)
}

impl<T, V, P, C> Engine<T, V, P, C>
where
    T: Transport,
    V: Vision,
    P: Prompt,
    C: Clock,
{
    /// Tip position for dispensing on a placement
    ///
    /// Calibrated XY plus the tool offset; resolved height minus the
    /// approach clearance.
    pub fn dispense_position(&self, index: usize) -> Result<Point3, Precondition> {
        let point = self
            .model
            .calibrated_placement(index)
            .ok_or(Precondition::PlacementOutOfRange)?;
        let offset = self.model.tool_offset();
        Ok(Point3::new(
            point.x + offset.x,
            point.y + offset.y,
            point.z - self.config.motion.approach_clearance,
        ))
    }

    /// Lift the tip to travel height
    pub async fn raise_to_safe(&mut self) -> Result<(), EngineError> {
        let batch = gcode::move_z(self.config.motion.safe_z)?;
        self.send(&batch).await
    }

    /// Center the camera over a placement at travel height
    pub async fn move_camera_to_placement(&mut self, index: usize) -> Result<(), EngineError> {
        let point = self
            .model
            .calibrated_placement(index)
            .ok_or(Precondition::PlacementOutOfRange)?;
        self.move_camera_to(point.xy()).await?;
        self.run.set_last_navigated(index);
        Ok(())
    }

    /// Center the camera over a fiducial at travel height
    pub async fn move_camera_to_fiducial(&mut self, index: usize) -> Result<(), EngineError> {
        let fiducial = self
            .model
            .fiducials()
            .get(index)
            .ok_or(Precondition::FiducialOutOfRange)?;
        let target = self.model.to_machine(fiducial.xy());
        self.move_camera_to(target).await
    }

    /// Put the tip on a placement's dispense position
    ///
    /// Travels at safe height and descends last.
    pub async fn move_tip_to_placement(&mut self, index: usize) -> Result<(), EngineError> {
        let target = self.dispense_position(index)?;
        let batch = tip_batch(target, self.config.motion.safe_z)?;
        self.send(&batch).await?;
        self.run.set_last_navigated(index);
        Ok(())
    }

    /// Where the camera currently points, in design coordinates
    pub async fn camera_design_position(&mut self) -> Result<Option<Point2>, EngineError> {
        let position = self.capture_position().await?;
        Ok(self.model.to_design(position.xy()))
    }

    pub(crate) async fn move_camera_to(&mut self, target: Point2) -> Result<(), EngineError> {
        let batch = travel_batch(target.x, target.y, self.config.motion.safe_z)?;
        self.send(&batch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{Fiducial, Placement, ToolOffset};
    use crate::design::BoardSide;
    use crate::geometry::{abs, AffineTransform};
    use crate::testing::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use embassy_futures::block_on;

    fn calibrated() -> TestEngine {
        let (mut engine, _) = rig();
        engine.model.load_design(
            vec![Placement::new(10.0, 20.0), Placement::new(30.0, 20.0)],
            Vec::new(),
            BoardSide::Front,
        );
        engine.model.set_fiducials([
            Fiducial::new(0.0, 0.0),
            Fiducial::new(50.0, 0.0),
            Fiducial::new(0.0, 50.0),
        ]);
        engine.model.set_rough(
            AffineTransform {
                c: 100.0,
                f: 200.0,
                ..AffineTransform::IDENTITY
            },
            Some(30.0),
        );
        engine.model.set_tool_offset(ToolOffset::new(45.0, -2.0));
        engine
    }

    #[test]
    fn test_dispense_position_applies_offset_and_clearance() {
        let engine = calibrated();
        let p = engine.dispense_position(1).unwrap();
        assert_eq!((p.x, p.y), (175.0, 218.0));
        assert!(abs(p.z - 29.9) < 1e-12);
        assert_eq!(engine.dispense_position(2), Err(Precondition::PlacementOutOfRange));
    }

    #[test]
    fn test_tip_move_descends_last() {
        let mut engine = calibrated();
        block_on(engine.move_tip_to_placement(0)).unwrap();
        assert_eq!(
            engine.transport().batches[0],
            ["G90", "G0 Z31.500", "G0 X155.000 Y218.000", "G0 Z29.900"]
        );
        assert_eq!(engine.run_state().last_navigated(), Some(0));
    }

    #[test]
    fn test_camera_moves_ignore_tool_offset() {
        let mut engine = calibrated();
        block_on(engine.move_camera_to_fiducial(1)).unwrap();
        assert_eq!(engine.transport().batches[0][2], "G0 X150.000 Y200.000");
        assert_eq!(
            block_on(engine.move_camera_to_fiducial(3)),
            Err(EngineError::PreconditionFailed(Precondition::FiducialOutOfRange))
        );
    }

    #[test]
    fn test_camera_design_position() {
        let mut engine = calibrated();
        block_on(engine.move_camera_to_placement(1)).unwrap();
        let p = block_on(engine.camera_design_position()).unwrap().unwrap();
        assert!(abs(p.x - 30.0) < 1e-9 && abs(p.y - 20.0) < 1e-9);
    }
}
