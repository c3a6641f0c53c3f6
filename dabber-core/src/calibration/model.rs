//! Calibration model and derived machine-space lists

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use super::points::{CalibratedPoint, Fiducial, Placement, PotentialFiducial};
use crate::design::BoardSide;
use crate::error::Precondition;
use crate::geometry::{AffineTransform, HeightMesh, PlaneCoefficients, Point2, Point3};

/// Which height model the job uses when both are available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "lowercase")]
pub enum HeightMode {
    /// Least-squares plane through the probed points
    #[default]
    Plane,
    /// Triangulated mesh through the probed points
    Mesh,
}

/// Camera-to-tip XY offset in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ToolOffset {
    pub x: f64,
    pub y: f64,
}

impl ToolOffset {
    /// Create an offset
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Which calibration artifacts exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationStatus {
    pub has_rough: bool,
    pub has_fine: bool,
    pub has_plane: bool,
    pub has_mesh: bool,
    /// True iff a rough or fine transform exists
    pub is_calibrated: bool,
}

/// Design points plus every calibration artifact
///
/// Design-file coordinates are never rewritten; every machine-space value is
/// derived on demand from the current artifacts. [`CalibrationModel::version`]
/// changes on each mutation so callers can cache derived lists.
#[derive(Debug, Clone)]
pub struct CalibrationModel {
    pub(crate) placements: Vec<Placement>,
    pub(crate) fiducials: Vec<Fiducial>,
    pub(crate) candidates: Vec<PotentialFiducial>,
    pub(crate) rough: Option<AffineTransform>,
    pub(crate) fine: Option<AffineTransform>,
    pub(crate) base_height: Option<f64>,
    pub(crate) plane: Option<PlaneCoefficients>,
    pub(crate) mesh: Option<HeightMesh>,
    pub(crate) height_mode: HeightMode,
    pub(crate) tool_offset: ToolOffset,
    pub(crate) board_side: BoardSide,
    default_height: f64,
    version: u64,
}

impl CalibrationModel {
    /// Empty model; unresolvable heights fall back to `default_height`
    pub fn new(default_height: f64) -> Self {
        Self {
            placements: Vec::new(),
            fiducials: Vec::new(),
            candidates: Vec::new(),
            rough: None,
            fine: None,
            base_height: None,
            plane: None,
            mesh: None,
            height_mode: HeightMode::default(),
            tool_offset: ToolOffset::default(),
            board_side: BoardSide::default(),
            default_height,
            version: 0,
        }
    }

    /// Replace the board with a freshly loaded design
    ///
    /// Drops fiducials and every board-specific artifact. The tool offset
    /// belongs to the machine and is kept.
    pub fn load_design(
        &mut self,
        placements: Vec<Placement>,
        candidates: Vec<PotentialFiducial>,
        side: BoardSide,
    ) {
        info!(
            "design loaded: {} placements, {} fiducial candidates",
            placements.len(),
            candidates.len()
        );
        self.placements = placements;
        self.candidates = candidates;
        self.fiducials.clear();
        self.rough = None;
        self.fine = None;
        self.base_height = None;
        self.board_side = side;
        self.recompute();
    }

    // --- accessors ---

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn fiducials(&self) -> &[Fiducial] {
        &self.fiducials
    }

    pub fn candidates(&self) -> &[PotentialFiducial] {
        &self.candidates
    }

    pub fn rough(&self) -> Option<&AffineTransform> {
        self.rough.as_ref()
    }

    pub fn fine(&self) -> Option<&AffineTransform> {
        self.fine.as_ref()
    }

    /// Fine transform if present, otherwise rough
    pub fn active_transform(&self) -> Option<&AffineTransform> {
        self.fine.as_ref().or(self.rough.as_ref())
    }

    pub fn base_height(&self) -> Option<f64> {
        self.base_height
    }

    pub fn plane(&self) -> Option<&PlaneCoefficients> {
        self.plane.as_ref()
    }

    pub fn mesh(&self) -> Option<&HeightMesh> {
        self.mesh.as_ref()
    }

    pub fn height_mode(&self) -> HeightMode {
        self.height_mode
    }

    pub fn tool_offset(&self) -> ToolOffset {
        self.tool_offset
    }

    pub fn board_side(&self) -> BoardSide {
        self.board_side
    }

    pub fn default_height(&self) -> f64 {
        self.default_height
    }

    /// Mutation counter
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn status(&self) -> CalibrationStatus {
        CalibrationStatus {
            has_rough: self.rough.is_some(),
            has_fine: self.fine.is_some(),
            has_plane: self.plane.is_some(),
            has_mesh: self.mesh.is_some(),
            is_calibrated: self.is_calibrated(),
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.active_transform().is_some()
    }

    /// The 3 finalized fiducials, if selection has completed
    pub fn fiducial_triple(&self) -> Result<[Fiducial; 3], Precondition> {
        match self.fiducials.as_slice() {
            [a, b, c] => Ok([*a, *b, *c]),
            _ => Err(Precondition::MissingFiducials),
        }
    }

    // --- fiducials ---

    /// Store the selected triple
    ///
    /// Existing transforms are kept; re-registering replaces them.
    pub fn set_fiducials(&mut self, fiducials: [Fiducial; 3]) {
        self.fiducials = fiducials.to_vec();
        self.version += 1;
    }

    /// Replace the candidate list
    pub fn set_candidates(&mut self, candidates: Vec<PotentialFiducial>) {
        self.candidates = candidates;
        self.version += 1;
    }

    pub fn delete_candidate(&mut self, index: usize) -> Result<(), Precondition> {
        if index >= self.candidates.len() {
            return Err(Precondition::CandidateOutOfRange);
        }
        self.candidates.remove(index);
        self.version += 1;
        Ok(())
    }

    pub fn delete_fiducial(&mut self, index: usize) -> Result<(), Precondition> {
        if index >= self.fiducials.len() {
            return Err(Precondition::FiducialOutOfRange);
        }
        self.fiducials.remove(index);
        self.version += 1;
        Ok(())
    }

    // --- registration ---

    /// Store the rough transform and the reference dispensing height
    pub fn set_rough(&mut self, transform: AffineTransform, base_height: Option<f64>) {
        self.rough = Some(transform);
        self.base_height = base_height;
        self.recompute();
    }

    /// Store the vision-refined transform
    pub fn set_fine(&mut self, transform: AffineTransform) {
        self.fine = Some(transform);
        self.recompute();
    }

    /// Drop the fine transform, falling back to rough
    pub fn clear_fine(&mut self) {
        self.fine = None;
        self.recompute();
    }

    /// Drop both transforms and the base height
    pub fn clear_registration(&mut self) {
        self.rough = None;
        self.fine = None;
        self.base_height = None;
        self.recompute();
    }

    pub fn set_tool_offset(&mut self, offset: ToolOffset) {
        self.tool_offset = offset;
        self.version += 1;
    }

    /// Switch height model; stored artifacts are untouched
    pub fn set_height_mode(&mut self, mode: HeightMode) {
        self.height_mode = mode;
        self.version += 1;
    }

    // --- placements ---

    /// Record a probed machine Z for a placement
    pub fn probe_placement(&mut self, index: usize, z: f64) -> Result<(), Precondition> {
        let placement = self
            .placements
            .get_mut(index)
            .ok_or(Precondition::PlacementOutOfRange)?;
        placement.z = Some(z);
        debug!("placement {} probed at z={}", index, z);
        self.recompute();
        Ok(())
    }

    /// Forget a placement's probed Z
    pub fn clear_probe(&mut self, index: usize) -> Result<(), Precondition> {
        let placement = self
            .placements
            .get_mut(index)
            .ok_or(Precondition::PlacementOutOfRange)?;
        placement.z = None;
        self.recompute();
        Ok(())
    }

    /// Forget every probed Z
    pub fn clear_all_probes(&mut self) {
        for p in &mut self.placements {
            p.z = None;
        }
        self.recompute();
    }

    pub fn delete_placement(&mut self, index: usize) -> Result<(), Precondition> {
        if index >= self.placements.len() {
            return Err(Precondition::PlacementOutOfRange);
        }
        self.placements.remove(index);
        self.recompute();
        Ok(())
    }

    /// Number of placements with a probed height
    pub fn probed_count(&self) -> usize {
        self.placements.iter().filter(|p| p.is_probed()).count()
    }

    // --- derived values ---

    /// Map a design point with the active transform (identity if none)
    pub fn to_machine(&self, design: Point2) -> Point2 {
        match self.active_transform() {
            Some(t) => t.apply(design),
            None => design,
        }
    }

    /// Map a machine point back to design space
    pub fn to_design(&self, machine: Point2) -> Option<Point2> {
        match self.active_transform() {
            Some(t) => t.inverse().map(|inv| inv.apply(machine)),
            None => Some(machine),
        }
    }

    /// Resolved height at a design point
    ///
    /// Priority: mesh (in mesh mode) → plane → base height → `own` → default.
    pub fn height_at(&self, design: Point2, own: Option<f64>) -> f64 {
        if self.height_mode == HeightMode::Mesh {
            if let Some(z) = self.mesh.as_ref().and_then(|m| m.height_at(design.x, design.y)) {
                return z;
            }
        }
        if let Some(plane) = &self.plane {
            let machine = self.to_machine(design);
            if let Some(z) = plane.height_at(machine.x, machine.y) {
                return z;
            }
        }
        self.base_height.or(own).unwrap_or(self.default_height)
    }

    /// Machine-space position and height of one placement
    pub fn calibrated_placement(&self, index: usize) -> Option<CalibratedPoint> {
        let p = self.placements.get(index)?;
        let m = self.to_machine(p.xy());
        Some(CalibratedPoint {
            x: m.x,
            y: m.y,
            z: self.height_at(p.xy(), p.z),
            probed: p.is_probed(),
            area: p.area,
        })
    }

    /// All placements in machine space
    pub fn calibrated_placements(&self) -> Vec<CalibratedPoint> {
        (0..self.placements.len())
            .filter_map(|i| self.calibrated_placement(i))
            .collect()
    }

    /// All fiducials in machine space
    pub fn calibrated_fiducials(&self) -> Vec<CalibratedPoint> {
        self.fiducials
            .iter()
            .map(|f| {
                let m = self.to_machine(f.xy());
                CalibratedPoint {
                    x: m.x,
                    y: m.y,
                    z: self.height_at(f.xy(), None),
                    probed: false,
                    area: None,
                }
            })
            .collect()
    }

    /// Bump the version after fields were restored directly
    /// Keep a restored plane and mesh only if they match the probes
    ///
    /// Both must be present and the mesh vertices must be the probed
    /// placements in order; otherwise both are refitted. Returns `true` when
    /// a refit happened.
    pub(crate) fn reconcile_height_model(&mut self) -> bool {
        let probed: Vec<Point3> = self
            .placements
            .iter()
            .filter_map(|p| p.z.map(|z| Point3::new(p.x, p.y, z)))
            .collect();
        let consistent = probed.len() >= 3
            && self.plane.is_some()
            && self
                .mesh
                .as_ref()
                .is_some_and(|mesh| mesh.vertices() == probed.as_slice());

        if consistent {
            self.version += 1;
        } else {
            self.recompute();
        }
        !consistent
    }

    /// Re-derive plane and mesh from the probed placements
    fn recompute(&mut self) {
        self.version += 1;

        let probed: Vec<(Point2, f64)> = self
            .placements
            .iter()
            .filter_map(|p| p.z.map(|z| (p.xy(), z)))
            .collect();

        if probed.len() < 3 {
            self.plane = None;
            self.mesh = None;
            return;
        }

        let machine: Vec<Point3> = probed
            .iter()
            .map(|&(p, z)| {
                let m = self.to_machine(p);
                Point3::new(m.x, m.y, z)
            })
            .collect();
        self.plane = match PlaneCoefficients::fit(&machine) {
            Ok(plane) => Some(plane),
            Err(e) => {
                warn!("plane fit failed: {:?}", e);
                None
            }
        };

        let design: Vec<Point3> = probed
            .iter()
            .map(|&(p, z)| Point3::new(p.x, p.y, z))
            .collect();
        self.mesh = match HeightMesh::build(&design) {
            Ok(mesh) => Some(mesh),
            Err(e) => {
                warn!("mesh build failed: {:?}", e);
                None
            }
        };
    }
}
