//! Machine configuration
//!
//! Static machine settings come from a TOML file; the machine calibration
//! (tool offset, dispense tuning) is persisted as postcard binary data.

pub mod persist;
pub mod toml;
pub mod types;

pub use persist::{MachineCalibration, PersistError};
pub use self::toml::parse_config;
pub use types::*;
