//! Configuration type definitions
//!
//! Every field has a default so a config file only needs the keys it changes.

use serde::{Deserialize, Serialize};

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// TOML syntax or type error
    TomlParse,
    /// Camera frame has zero width or height
    InvalidFrameSize,
    /// Pixel scale is not positive
    InvalidScale,
    /// Minimum dispense angle is above the maximum
    InvalidDispenseRange,
    /// Acknowledgment timeout is zero
    InvalidTimeout,
    /// Feed rate is zero
    InvalidFeedrate,
    /// Vision refinement needs at least one round
    InvalidRefineRounds,
}

/// Gantry motion settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct MotionConfig {
    /// Travel height (mm)
    pub safe_z: f64,
    /// Height used when nothing better is known (mm)
    pub default_z: f64,
    /// Subtracted from the resolved height when dispensing (mm)
    pub approach_clearance: f64,
    /// Rapid move feed rate (mm/min)
    pub travel_feedrate: u32,
    /// Where the gantry parks after an automated run
    pub park_x: f64,
    pub park_y: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            safe_z: 31.5,
            default_z: 31.5,
            approach_clearance: 0.1,
            travel_feedrate: 35000,
            park_x: 0.0,
            park_y: 0.0,
        }
    }
}

/// Paste extrusion settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct DispenseConfig {
    /// Fixed screw rotation per pad (degrees)
    pub dispense_degrees: f64,
    /// Back-rotation after each pad (degrees)
    pub retraction_degrees: f64,
    /// Pause after retraction (ms)
    pub dwell_ms: u32,
    /// Scale the rotation with pad area
    pub adaptive: bool,
    /// Adaptive rotation per mm² of pad
    pub degrees_per_mm2: f64,
    /// Adaptive clamp
    pub min_degrees: f64,
    pub max_degrees: f64,
    /// Continuous extrusion used while learning (screw units)
    pub extrude_distance: f64,
    /// Continuous extrusion feed rate
    pub extrude_feedrate: u32,
}

impl Default for DispenseConfig {
    fn default() -> Self {
        Self {
            dispense_degrees: 30.0,
            retraction_degrees: 1.0,
            dwell_ms: 100,
            adaptive: false,
            degrees_per_mm2: 30.0,
            min_degrees: 5.0,
            max_degrees: 90.0,
            extrude_distance: 20000.0,
            extrude_feedrate: 2000,
        }
    }
}

/// Camera settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct VisionConfig {
    /// Frame size in pixels
    pub frame_width: u32,
    pub frame_height: u32,
    /// Image scale (mm per pixel)
    pub mm_per_pixel: f64,
    /// Detect-and-move rounds per feature
    pub refine_rounds: u8,
    /// Pause after each correction move so the frame settles (ms)
    pub settle_ms: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            frame_width: 640,
            frame_height: 480,
            mm_per_pixel: 0.02,
            refine_rounds: 2,
            settle_ms: 1500,
        }
    }
}

/// Nominal camera-to-tip geometry used by the tip-offset procedure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct TipConfig {
    /// Mechanical XY offset from camera to tip (mm)
    pub nominal_offset_x: f64,
    pub nominal_offset_y: f64,
    /// Height the tip is lowered to for centering (mm)
    pub centering_z: f64,
}

impl Default for TipConfig {
    fn default() -> Self {
        Self {
            nominal_offset_x: 45.0,
            nominal_offset_y: 0.0,
            centering_z: 30.0,
        }
    }
}

/// Visual homing datum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct HomingConfig {
    pub datum_x: f64,
    pub datum_y: f64,
    /// Pause after reaching the datum (ms)
    pub settle_ms: u64,
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            datum_x: 218.0,
            datum_y: 196.0,
            settle_ms: 1000,
        }
    }
}

/// Controller link settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct LinkConfig {
    /// Per-command acknowledgment timeout (ms)
    pub ack_timeout_ms: u64,
    /// Turn the ring light on after connecting
    pub ring_light: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: 5000,
            ring_light: true,
        }
    }
}

/// Complete machine configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct MachineConfig {
    pub motion: MotionConfig,
    pub dispense: DispenseConfig,
    pub vision: VisionConfig,
    pub tip: TipConfig,
    pub homing: HomingConfig,
    pub link: LinkConfig,
}

impl MachineConfig {
    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vision.frame_width == 0 || self.vision.frame_height == 0 {
            return Err(ConfigError::InvalidFrameSize);
        }
        if !(self.vision.mm_per_pixel > 0.0) {
            return Err(ConfigError::InvalidScale);
        }
        if self.vision.refine_rounds == 0 {
            return Err(ConfigError::InvalidRefineRounds);
        }
        if !(self.dispense.min_degrees <= self.dispense.max_degrees) {
            return Err(ConfigError::InvalidDispenseRange);
        }
        if self.link.ack_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.motion.travel_feedrate == 0 || self.dispense.extrude_feedrate == 0 {
            return Err(ConfigError::InvalidFeedrate);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MachineConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.motion.safe_z, 31.5);
        assert_eq!(config.vision.mm_per_pixel, 0.02);
        assert_eq!(config.link.ack_timeout_ms, 5000);
    }

    #[test]
    fn test_inverted_dispense_range() {
        let mut config = MachineConfig::default();
        config.dispense.min_degrees = 100.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidDispenseRange));
    }

    #[test]
    fn test_nan_scale_rejected() {
        let mut config = MachineConfig::default();
        config.vision.mm_per_pixel = f64::NAN;
        assert_eq!(config.validate(), Err(ConfigError::InvalidScale));
    }
}
