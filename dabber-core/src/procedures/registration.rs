//! Board registration: rough (jogged), fine (vision) and visual homing

use alloc::format;

use dabber_protocol::{gcode, Batch};

use crate::engine::{Engine, Outcome};
use crate::error::{EngineError, Precondition};
use crate::geometry::{AffineTransform, Point2};
use crate::traits::{Clock, Prompt, PromptResponse, Transport, Vision, VisionError};

impl<T, V, P, C> Engine<T, V, P, C>
where
    T: Transport,
    V: Vision,
    P: Prompt,
    C: Clock,
{
    /// Rough registration by jogging the camera onto each fiducial
    ///
    /// Prompts the operator to center the camera on fiducials 1 to 3, then to
    /// bring the tip down to dispensing height. Builds the rough transform
    /// from the design triple to the captured triple and keeps the captured Z
    /// as the base height.
    pub async fn rough_registration(&mut self) -> Result<Outcome, EngineError> {
        let fiducials = self.model.fiducial_triple()?;
        info!("rough registration started");

        let mut measured = [Point2::default(); 3];
        for (i, slot) in measured.iter_mut().enumerate() {
            let message = format!("Center the camera on fiducial {} and press continue", i + 1);
            if self.ask(&message).await == PromptResponse::Cancel {
                info!("rough registration cancelled");
                return Ok(Outcome::Cancelled);
            }
            *slot = self.capture_position().await?.xy();
        }

        if self.ask("Lower the tip to dispensing height and press continue").await
            == PromptResponse::Cancel
        {
            info!("rough registration cancelled");
            return Ok(Outcome::Cancelled);
        }
        let height = self.capture_position().await?.z;

        let design = fiducials.map(|f| f.xy());
        let transform = AffineTransform::from_triangles(&design, &measured)?;
        self.model.set_rough(transform, Some(height));
        info!("rough registration done, base height {}", height);
        Ok(Outcome::Completed)
    }

    /// Vision registration refining the rough transform
    ///
    /// Visits each fiducial at its current calibrated position, re-centers on
    /// it with the camera and captures the result. If any fiducial is never
    /// detected the procedure fails and the fine transform is left as it was.
    pub async fn fine_registration(&mut self) -> Result<Outcome, EngineError> {
        let fiducials = self.model.fiducial_triple()?;
        if self.model.rough().is_none() {
            return Err(Precondition::RoughRegistrationMissing.into());
        }
        info!("fine registration started");

        let mut measured = [Point2::default(); 3];
        for (i, (slot, fiducial)) in measured.iter_mut().zip(fiducials.iter()).enumerate() {
            let target = self.model.to_machine(fiducial.xy());
            self.move_camera_to(target).await?;
            self.clock.delay_ms(self.config.vision.settle_ms).await;

            if !self.refine_on_feature().await? {
                warn!("fiducial {} not detected", i + 1);
                return Err(VisionError::NotDetected.into());
            }
            *slot = self.capture_position().await?.xy();
        }

        let design = fiducials.map(|f| f.xy());
        let transform = AffineTransform::from_triangles(&design, &measured)?;
        self.model.set_fine(transform);
        info!("fine registration done");
        Ok(Outcome::Completed)
    }

    /// Re-center the camera on the alignment feature
    ///
    /// Runs the configured number of detect-and-move rounds. Rounds without
    /// a detection move nothing. Returns whether any round saw the feature.
    pub async fn refine_on_feature(&mut self) -> Result<bool, EngineError> {
        let vision = self.config.vision;
        let center_x = vision.frame_width as f64 / 2.0;
        let center_y = vision.frame_height as f64 / 2.0;
        let mut detected = false;

        for round in 0..vision.refine_rounds {
            let Some(pixel) = self.vision.detect_alignment_feature().await? else {
                debug!("refine round {}: nothing detected", round);
                continue;
            };
            detected = true;

            // Image Y grows downward, machine Y grows upward
            let dx = (pixel.x - center_x) * vision.mm_per_pixel;
            let dy = -(pixel.y - center_y) * vision.mm_per_pixel;
            debug!("refine round {}: jog {} {}", round, dx, dy);
            let batch = gcode::jog_xy(dx, dy)?;
            self.send(&batch).await?;
            self.clock.delay_ms(vision.settle_ms).await;
        }
        Ok(detected)
    }

    /// Home XY on the datum mark with the camera
    ///
    /// Moves to the configured datum, refines on the mark, then declares the
    /// refined position to be the datum.
    pub async fn visual_home(&mut self) -> Result<(), EngineError> {
        let homing = self.config.homing;
        let batch = gcode::move_xy(homing.datum_x, homing.datum_y)?;
        self.send(&batch).await?;
        self.clock.delay_ms(homing.settle_ms).await;

        if !self.refine_on_feature().await? {
            warn!("visual home: datum mark not detected");
        }

        let mut batch = Batch::new();
        batch.push(gcode::set_position(homing.datum_x, homing.datum_y)?)?;
        self.send(&batch).await?;
        info!("visual home done");
        Ok(())
    }
}
