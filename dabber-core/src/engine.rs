//! Engine: the single owner of model, run state and collaborators
//!
//! Every procedure and run is an `async fn` on [`Engine`] taking `&mut self`,
//! so at most one of them drives the machine at a time. Procedures live in
//! [`crate::procedures`], runs in [`crate::job`].

use dabber_protocol::{gcode, Batch};

use crate::calibration::{CalibrationModel, FiducialSelection};
use crate::config::{DispenseConfig, MachineCalibration, MachineConfig};
use crate::design::{BoardSide, DesignFile};
use crate::error::EngineError;
use crate::job::JobRunState;
use crate::jobfile::{JobFile, JobFileError};
use crate::traits::{Clock, MachinePosition, Prompt, PromptResponse, Transport, TransportError, Vision};

/// How a procedure or run ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Ran to the end
    Completed,
    /// Stopped at a step boundary on request
    Cancelled,
}

/// Calibration and job-execution engine
pub struct Engine<T, V, P, C> {
    pub(crate) transport: T,
    pub(crate) vision: V,
    pub(crate) prompt: P,
    pub(crate) clock: C,
    pub(crate) config: MachineConfig,
    pub(crate) model: CalibrationModel,
    pub(crate) run: JobRunState,
    pub(crate) selection: FiducialSelection,
}

impl<T, V, P, C> Engine<T, V, P, C>
where
    T: Transport,
    V: Vision,
    P: Prompt,
    C: Clock,
{
    /// Create an engine with an empty board
    pub fn new(transport: T, vision: V, prompt: P, clock: C, config: MachineConfig) -> Self {
        Self {
            transport,
            vision,
            prompt,
            clock,
            model: CalibrationModel::new(config.motion.default_z),
            config,
            run: JobRunState::new(),
            selection: FiducialSelection::new(),
        }
    }

    pub fn model(&self) -> &CalibrationModel {
        &self.model
    }

    /// Direct model access for edits that need no motion (delete, clear, mode)
    pub fn model_mut(&mut self) -> &mut CalibrationModel {
        &mut self.model
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn dispense_mut(&mut self) -> &mut DispenseConfig {
        &mut self.config.dispense
    }

    pub fn run_state(&self) -> &JobRunState {
        &self.run
    }

    pub fn fiducial_selection(&self) -> &FiducialSelection {
        &self.selection
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Put the controller into a known state after connecting
    ///
    /// Absolute mode, travel feed rate and (if configured) the ring light.
    pub async fn initialize(&mut self) -> Result<(), EngineError> {
        let mut batch = Batch::new();
        batch
            .push(gcode::absolute())?
            .push(gcode::travel_feedrate(self.config.motion.travel_feedrate))?;
        if self.config.link.ring_light {
            batch.push(gcode::ring_light(true))?;
        }
        self.send(&batch).await?;
        info!("controller initialized");
        Ok(())
    }

    /// Load a new board from the design-file loader
    ///
    /// The board side is detected from the paste-layer file name.
    pub fn load_design(&mut self, design: DesignFile, paste_filename: &str) {
        let side = BoardSide::from_filename(paste_filename);
        let (placements, candidates) = design.into_parts();
        self.model.load_design(placements, candidates, side);
        self.selection = FiducialSelection::new();
        self.run.reset();
    }

    /// Snapshot the board for saving
    pub fn export_job(&self) -> JobFile {
        JobFile::from_model(&self.model, &self.config.dispense)
    }

    /// Resume a saved board
    pub fn import_job(&mut self, job: JobFile) -> Result<(), JobFileError> {
        job.restore(&mut self.model, &mut self.config.dispense)?;
        self.selection = FiducialSelection::new();
        self.run.reset();
        Ok(())
    }

    /// Machine-level values worth persisting across boards
    pub fn machine_calibration(&self) -> MachineCalibration {
        MachineCalibration {
            tool_offset: self.model.tool_offset(),
            dispense: self.config.dispense,
            base_height: self.model.base_height(),
        }
    }

    /// Apply persisted machine-level values
    ///
    /// The stored base height belongs to a previous board and is not applied.
    pub fn apply_machine_calibration(&mut self, calibration: &MachineCalibration) {
        self.model.set_tool_offset(calibration.tool_offset);
        self.config.dispense = calibration.dispense;
    }

    // --- collaborator helpers ---

    pub(crate) async fn send(&mut self, batch: &Batch) -> Result<(), EngineError> {
        trace!("send {} commands", batch.len());
        self.transport.send(batch.as_slice()).await?;
        Ok(())
    }

    /// Current machine position; a missing report is a transport failure
    pub(crate) async fn capture_position(&mut self) -> Result<MachinePosition, EngineError> {
        let position = self
            .transport
            .query_position()
            .await?
            .ok_or(TransportError::NoPositionReport)?;
        debug!("captured x={} y={} z={}", position.x, position.y, position.z);
        Ok(position)
    }

    pub(crate) async fn ask(&mut self, message: &str) -> PromptResponse {
        self.prompt.show(message).await
    }
}
