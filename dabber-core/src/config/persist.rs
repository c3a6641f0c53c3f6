//! Persisted machine calibration
//!
//! Tool offset and dispense tuning survive across boards and sessions. They
//! are stored as postcard binary data behind a magic number, a format version
//! and a CRC32 over the serialized payload.

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use super::types::DispenseConfig;
use crate::calibration::ToolOffset;

/// Magic number to identify valid calibration data
pub const CALIBRATION_MAGIC: u32 = 0x4441_4243; // "DABC"

/// Current calibration data version
pub const CALIBRATION_VERSION: u8 = 1;

/// Errors loading or storing the calibration record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PersistError {
    /// postcard encode failed
    Serialize,
    /// postcard decode failed or the data is truncated
    Deserialize,
    /// Magic number does not match
    BadMagic,
    /// Stored by an incompatible version
    VersionMismatch,
    /// Checksum does not match
    CrcMismatch,
}

/// Machine-level calibration values
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MachineCalibration {
    /// Camera-to-tip offset
    pub tool_offset: ToolOffset,
    /// Last used dispense tuning
    pub dispense: DispenseConfig,
    /// Reference dispensing height from the last rough registration
    pub base_height: Option<f64>,
}

#[derive(Serialize, Deserialize)]
struct Header {
    magic: u32,
    version: u8,
}

impl MachineCalibration {
    /// Serialize as `header | payload | crc32(header | payload)`
    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistError> {
        let header = Header {
            magic: CALIBRATION_MAGIC,
            version: CALIBRATION_VERSION,
        };
        let mut bytes = postcard::to_allocvec(&header).map_err(|_| PersistError::Serialize)?;
        let payload = postcard::to_allocvec(self).map_err(|_| PersistError::Serialize)?;
        bytes.extend_from_slice(&payload);
        let crc = crc32(&bytes);
        bytes.extend_from_slice(&crc.to_le_bytes());
        Ok(bytes)
    }

    /// Parse and verify stored bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PersistError> {
        if bytes.len() < 4 {
            return Err(PersistError::Deserialize);
        }
        let (body, crc_bytes) = bytes.split_at(bytes.len() - 4);
        let stored_crc = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);

        let (header, payload): (Header, &[u8]) =
            postcard::take_from_bytes(body).map_err(|_| PersistError::Deserialize)?;
        if header.magic != CALIBRATION_MAGIC {
            return Err(PersistError::BadMagic);
        }
        if header.version != CALIBRATION_VERSION {
            return Err(PersistError::VersionMismatch);
        }
        if crc32(body) != stored_crc {
            return Err(PersistError::CrcMismatch);
        }
        postcard::from_bytes(payload).map_err(|_| PersistError::Deserialize)
    }

    /// Load stored bytes, falling back to defaults on any error
    pub fn load_or_default(bytes: &[u8], defaults: DispenseConfig) -> Self {
        match Self::from_bytes(bytes) {
            Ok(calibration) => {
                info!("machine calibration loaded");
                calibration
            }
            Err(e) => {
                warn!("machine calibration invalid ({:?}), using defaults", e);
                Self {
                    dispense: defaults,
                    ..Self::default()
                }
            }
        }
    }
}

/// CRC32 (IEEE 802.3 polynomial)
fn crc32(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB88320;
    let mut crc: u32 = 0xFFFF_FFFF;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    !crc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MachineCalibration {
        MachineCalibration {
            tool_offset: ToolOffset::new(44.7, -0.35),
            dispense: DispenseConfig {
                dispense_degrees: 24.0,
                ..DispenseConfig::default()
            },
            base_height: Some(30.85),
        }
    }

    #[test]
    fn test_crc_known_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_store_and_load() {
        let bytes = sample().to_bytes().unwrap();
        assert_eq!(MachineCalibration::from_bytes(&bytes), Ok(sample()));
    }

    #[test]
    fn test_corruption_detected() {
        let mut bytes = sample().to_bytes().unwrap();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0x40;
        assert!(MachineCalibration::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_wrong_version() {
        let mut bytes = sample().to_bytes().unwrap();
        // Version byte follows the varint-encoded magic
        let magic_len = postcard::to_allocvec(&CALIBRATION_MAGIC).unwrap().len();
        bytes[magic_len] = CALIBRATION_VERSION + 1;
        assert_eq!(
            MachineCalibration::from_bytes(&bytes),
            Err(PersistError::VersionMismatch)
        );
    }

    #[test]
    fn test_fallback_to_defaults() {
        let defaults = DispenseConfig::default();
        let loaded = MachineCalibration::load_or_default(&[1, 2, 3], defaults);
        assert_eq!(loaded.tool_offset, ToolOffset::default());
        assert_eq!(loaded.dispense, defaults);
        assert_eq!(loaded.base_height, None);
    }
}
