//! TOML configuration loading

use super::types::{ConfigError, MachineConfig};

/// Parse and validate a TOML machine configuration
///
/// Missing sections and keys take their defaults.
pub fn parse_config(input: &str) -> Result<MachineConfig, ConfigError> {
    let config: MachineConfig = ::toml::from_str(input).map_err(|_| {
        warn!("config: TOML parse failed");
        ConfigError::TomlParse
    })?;
    config.validate()?;
    debug!(
        "config: safe_z={} ack_timeout_ms={}",
        config.motion.safe_z,
        config.link.ack_timeout_ms
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_default() {
        assert_eq!(parse_config(""), Ok(MachineConfig::default()));
    }

    #[test]
    fn test_partial_sections() {
        let input = r#"
# Bench machine
[motion]
safe_z = 35.0
park_x = 10.0
park_y = 250.0

[dispense]
adaptive = true
max_degrees = 60.0

[vision]
frame_width = 1280
frame_height = 720
"#;
        let config = parse_config(input).unwrap();
        assert_eq!(config.motion.safe_z, 35.0);
        assert_eq!(config.motion.default_z, 31.5);
        assert_eq!(config.motion.park_y, 250.0);
        assert!(config.dispense.adaptive);
        assert_eq!(config.dispense.max_degrees, 60.0);
        assert_eq!(config.dispense.dispense_degrees, 30.0);
        assert_eq!(config.vision.frame_width, 1280);
        assert_eq!(config.homing.datum_x, 218.0);
    }

    #[test]
    fn test_syntax_error() {
        assert_eq!(parse_config("[motion\nsafe_z = 1"), Err(ConfigError::TomlParse));
    }

    #[test]
    fn test_wrong_type() {
        assert_eq!(
            parse_config("[link]\nack_timeout_ms = \"soon\""),
            Err(ConfigError::TomlParse)
        );
    }

    #[test]
    fn test_validation_runs() {
        assert_eq!(
            parse_config("[vision]\nframe_width = 0"),
            Err(ConfigError::InvalidFrameSize)
        );
    }
}
