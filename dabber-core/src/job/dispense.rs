//! Dispense amount and per-pad command batches

use dabber_protocol::gcode::{self, PadDispense};
use dabber_protocol::{Batch, CommandError};

use crate::config::{DispenseConfig, MotionConfig};
use crate::geometry::Point3;

/// Extrusion screw rotation for a pad, in degrees
///
/// Fixed unless adaptive dispensing is on and the pad has an area, in which
/// case it scales with the area and is clamped to the configured range.
pub fn dispense_amount(config: &DispenseConfig, area: Option<f64>) -> f64 {
    match area {
        Some(area) if config.adaptive => {
            let degrees = area * config.degrees_per_mm2;
            degrees.max(config.min_degrees).min(config.max_degrees)
        }
        _ => config.dispense_degrees,
    }
}

/// Complete batch for one pad of an unattended run
pub fn pad_batch(
    position: Point3,
    area: Option<f64>,
    dispense: &DispenseConfig,
    motion: &MotionConfig,
) -> Result<Batch, CommandError> {
    gcode::dispense_pad(&PadDispense {
        x: position.x,
        y: position.y,
        z: position.z,
        dispense_degrees: dispense_amount(dispense, area),
        retraction_degrees: dispense.retraction_degrees,
        dwell_ms: dispense.dwell_ms,
        safe_z: motion.safe_z,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec::Vec;

    #[test]
    fn test_fixed_amount_ignores_area() {
        let config = DispenseConfig::default();
        assert_eq!(dispense_amount(&config, Some(4.0)), 30.0);
        assert_eq!(dispense_amount(&config, None), 30.0);
    }

    #[test]
    fn test_adaptive_amount_scales_and_clamps() {
        let config = DispenseConfig {
            adaptive: true,
            ..DispenseConfig::default()
        };
        assert_eq!(dispense_amount(&config, Some(0.5)), 15.0);
        assert_eq!(dispense_amount(&config, Some(0.01)), 5.0);
        assert_eq!(dispense_amount(&config, Some(10.0)), 90.0);
        // No area: fall back to the fixed amount
        assert_eq!(dispense_amount(&config, None), 30.0);
    }

    #[test]
    fn test_pad_batch() {
        let batch = pad_batch(
            Point3::new(10.0, 20.0, 29.9),
            None,
            &DispenseConfig::default(),
            &MotionConfig::default(),
        )
        .unwrap();
        let lines: Vec<_> = batch.as_slice().iter().map(|c| c.as_str().to_string()).collect();
        assert_eq!(
            lines,
            [
                "G90",
                "G0 X10.000 Y20.000",
                "G0 Z29.900",
                "G91",
                "G0 B-30.000",
                "G0 B1.000",
                "G90",
                "G4 P100",
                "G0 Z31.500",
            ]
        );
    }
}
