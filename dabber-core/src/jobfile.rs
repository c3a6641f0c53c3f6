//! Job file import and export
//!
//! A job file captures a board's design points and every calibration
//! artifact as camelCase JSON, so a half-finished job can be resumed later.
//! Import tolerates missing fields; export always writes all of them.

use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationModel, Fiducial, HeightMode, Placement, ToolOffset};
use crate::config::DispenseConfig;
use crate::design::BoardSide;
use crate::geometry::{AffineTransform, HeightMesh, PlaneCoefficients, Point2, Point3};

/// Job file errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JobFileError {
    /// Malformed JSON or wrong field types
    Json,
    /// Stored mesh refers to missing vertices or has no triangles
    InvalidMesh,
}

/// Stored triangulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<Point3>,
    pub triangles: Vec<[usize; 3]>,
}

impl From<&HeightMesh> for MeshData {
    fn from(mesh: &HeightMesh) -> Self {
        Self {
            vertices: mesh.vertices().to_vec(),
            triangles: mesh.triangles().to_vec(),
        }
    }
}

/// Dispense tuning stored with the job
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobDispenseSettings {
    pub dispense_degrees: f64,
    pub retraction_degrees: f64,
    pub dwell_milliseconds: u32,
    pub adaptive: bool,
    pub degrees_per_mm2: f64,
    pub min_degrees: f64,
    pub max_degrees: f64,
}

impl Default for JobDispenseSettings {
    fn default() -> Self {
        Self::from(&DispenseConfig::default())
    }
}

impl From<&DispenseConfig> for JobDispenseSettings {
    fn from(c: &DispenseConfig) -> Self {
        Self {
            dispense_degrees: c.dispense_degrees,
            retraction_degrees: c.retraction_degrees,
            dwell_milliseconds: c.dwell_ms,
            adaptive: c.adaptive,
            degrees_per_mm2: c.degrees_per_mm2,
            min_degrees: c.min_degrees,
            max_degrees: c.max_degrees,
        }
    }
}

impl JobDispenseSettings {
    /// Overwrite the per-job fields of a dispense config
    pub fn apply_to(&self, config: &mut DispenseConfig) {
        config.dispense_degrees = self.dispense_degrees;
        config.retraction_degrees = self.retraction_degrees;
        config.dwell_ms = self.dwell_milliseconds;
        config.adaptive = self.adaptive;
        config.degrees_per_mm2 = self.degrees_per_mm2;
        config.min_degrees = self.min_degrees;
        config.max_degrees = self.max_degrees;
    }
}

/// Persisted job
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobFile {
    pub original_placements: Vec<Placement>,
    pub original_fiducials: Vec<Fiducial>,
    pub potential_fiducials: Vec<Point2>,
    pub rough_transform: Option<AffineTransform>,
    pub fine_transform: Option<AffineTransform>,
    pub base_height: Option<f64>,
    pub plane_coefficients: Option<PlaneCoefficients>,
    pub mesh_data: Option<MeshData>,
    pub height_mode: HeightMode,
    pub tip_offset_x: f64,
    pub tip_offset_y: f64,
    pub board_side: BoardSide,
    pub dispense_settings: JobDispenseSettings,
}

impl JobFile {
    /// Snapshot the model and dispense tuning
    pub fn from_model(model: &CalibrationModel, dispense: &DispenseConfig) -> Self {
        Self {
            original_placements: model.placements().to_vec(),
            original_fiducials: model.fiducials().to_vec(),
            potential_fiducials: model.candidates().to_vec(),
            rough_transform: model.rough().copied(),
            fine_transform: model.fine().copied(),
            base_height: model.base_height(),
            plane_coefficients: model.plane().copied(),
            mesh_data: model.mesh().map(MeshData::from),
            height_mode: model.height_mode(),
            tip_offset_x: model.tool_offset().x,
            tip_offset_y: model.tool_offset().y,
            board_side: model.board_side(),
            dispense_settings: JobDispenseSettings::from(dispense),
        }
    }

    pub fn from_json(input: &str) -> Result<Self, JobFileError> {
        serde_json::from_str(input).map_err(|_| JobFileError::Json)
    }

    pub fn to_json(&self) -> Result<String, JobFileError> {
        serde_json::to_string_pretty(self).map_err(|_| JobFileError::Json)
    }

    /// Load the job into a model
    ///
    /// Stored plane and mesh are kept as saved when both are present and the
    /// mesh was built from the probed placements; otherwise both are refitted
    /// from the probes. Nothing is changed if the stored mesh is invalid.
    pub fn restore(
        self,
        model: &mut CalibrationModel,
        dispense: &mut DispenseConfig,
    ) -> Result<(), JobFileError> {
        let mesh = match self.mesh_data {
            Some(data) => Some(
                HeightMesh::from_parts(data.vertices, data.triangles)
                    .map_err(|_| JobFileError::InvalidMesh)?,
            ),
            None => None,
        };

        info!(
            "job restored: {} placements, {} fiducials",
            self.original_placements.len(),
            self.original_fiducials.len()
        );

        model.placements = self.original_placements;
        model.fiducials = self.original_fiducials;
        model.candidates = self.potential_fiducials;
        model.rough = self.rough_transform;
        model.fine = self.fine_transform;
        model.base_height = self.base_height;
        model.plane = self.plane_coefficients;
        model.mesh = mesh;
        model.height_mode = self.height_mode;
        model.tool_offset = ToolOffset::new(self.tip_offset_x, self.tip_offset_y);
        model.board_side = self.board_side;
        if model.reconcile_height_model() {
            debug!("stored height model did not match the probes, refitted");
        }

        self.dispense_settings.apply_to(dispense);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn calibrated_model() -> CalibrationModel {
        let mut model = CalibrationModel::new(31.5);
        model.load_design(
            vec![
                Placement::with_area(0.0, 0.0, 0.3),
                Placement::new(60.0, 0.0),
                Placement::new(0.0, 40.0),
                Placement::new(60.0, 40.0),
            ],
            vec![Point2::new(-3.0, -3.0)],
            BoardSide::Back,
        );
        model.set_fiducials([
            Fiducial::new(-3.0, -3.0),
            Fiducial::new(63.0, -3.0),
            Fiducial::new(-3.0, 43.0),
        ]);
        model.set_rough(
            AffineTransform {
                c: 100.0,
                f: 50.0,
                ..AffineTransform::IDENTITY
            },
            Some(30.2),
        );
        for (i, z) in [(0, 30.0), (1, 30.2), (2, 30.1), (3, 30.4)] {
            model.probe_placement(i, z).unwrap();
        }
        model.set_tool_offset(ToolOffset::new(44.5, -1.25));
        model.set_height_mode(HeightMode::Mesh);
        model
    }

    #[test]
    fn test_export_then_import_restores_model() {
        let model = calibrated_model();
        let mut dispense = DispenseConfig {
            dispense_degrees: 22.0,
            ..DispenseConfig::default()
        };
        let json = JobFile::from_model(&model, &dispense).to_json().unwrap();

        let mut restored = CalibrationModel::new(31.5);
        dispense = DispenseConfig::default();
        JobFile::from_json(&json)
            .unwrap()
            .restore(&mut restored, &mut dispense)
            .unwrap();

        assert_eq!(restored.placements(), model.placements());
        assert_eq!(restored.fiducials(), model.fiducials());
        assert_eq!(restored.rough(), model.rough());
        assert_eq!(restored.plane(), model.plane());
        assert_eq!(restored.mesh(), model.mesh());
        assert_eq!(restored.height_mode(), HeightMode::Mesh);
        assert_eq!(restored.board_side(), BoardSide::Back);
        assert_eq!(restored.tool_offset(), ToolOffset::new(44.5, -1.25));
        assert_eq!(dispense.dispense_degrees, 22.0);
    }

    #[test]
    fn test_export_writes_every_field() {
        let json = JobFile::default().to_json().unwrap();
        for key in [
            "originalPlacements",
            "originalFiducials",
            "roughTransform",
            "fineTransform",
            "baseHeight",
            "planeCoefficients",
            "meshData",
            "heightMode",
            "tipOffsetX",
            "tipOffsetY",
            "dispenseSettings",
            "dwellMilliseconds",
            "boardSide",
        ] {
            assert!(json.contains(key), "missing {}", key);
        }
    }

    #[test]
    fn test_import_tolerates_missing_fields() {
        let job = JobFile::from_json(
            r#"{"originalPlacements": [{"x": 1.0, "y": 2.0}, {"x": 3.0, "y": 4.0, "z": null}],
                "planeCoefficients": {"A": 0.0, "B": 0.0, "C": -1.0, "D": 30.0}}"#,
        )
        .unwrap();
        assert_eq!(job.original_placements.len(), 2);
        assert!(job.original_placements.iter().all(|p| p.z.is_none()));
        assert!(job.rough_transform.is_none());
        assert_eq!(job.height_mode, HeightMode::Plane);
        assert_eq!(job.tip_offset_x, 0.0);
        assert_eq!(job.dispense_settings.dispense_degrees, 30.0);
        assert_eq!(job.plane_coefficients.unwrap().d, 30.0);
    }

    #[test]
    fn test_invalid_mesh_leaves_model_untouched() {
        let mut model = calibrated_model();
        let before = model.placements().to_vec();
        let job = JobFile {
            mesh_data: Some(MeshData {
                vertices: vec![Point3::new(0.0, 0.0, 1.0)],
                triangles: vec![[0, 1, 2]],
            }),
            ..JobFile::default()
        };
        let mut dispense = DispenseConfig::default();
        assert_eq!(
            job.restore(&mut model, &mut dispense),
            Err(JobFileError::InvalidMesh)
        );
        assert_eq!(model.placements(), before.as_slice());
    }

    #[test]
    fn test_missing_height_model_is_refitted() {
        let mut job = JobFile::from_model(&calibrated_model(), &DispenseConfig::default());
        job.plane_coefficients = None;
        job.mesh_data = None;

        let mut restored = CalibrationModel::new(31.5);
        job.restore(&mut restored, &mut DispenseConfig::default())
            .unwrap();
        let model = calibrated_model();
        assert_eq!(restored.plane(), model.plane());
        assert_eq!(restored.mesh(), model.mesh());
    }

    #[test]
    fn test_stale_plane_dropped_with_too_few_probes() {
        let job = JobFile::from_json(
            r#"{"originalPlacements": [{"x": 1.0, "y": 2.0, "z": 30.0}, {"x": 3.0, "y": 4.0}],
                "planeCoefficients": {"A": 0.0, "B": 0.0, "C": -1.0, "D": 30.0}}"#,
        )
        .unwrap();
        let mut model = CalibrationModel::new(31.5);
        job.restore(&mut model, &mut DispenseConfig::default())
            .unwrap();
        assert!(model.plane().is_none());
        assert!(model.mesh().is_none());
    }

    #[test]
    fn test_malformed_json() {
        assert_eq!(JobFile::from_json("{\"originalPlacements\": 5}"), Err(JobFileError::Json));
    }
}
