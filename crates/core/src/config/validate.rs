use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Engine buffers and diagnostic tail are non-empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let engine = &config.engine;
    if engine.diagnostic_tail_lines == 0 {
        return Err(ConfigError::ValidationError(
            "engine.diagnostic_tail_lines cannot be 0".to_string(),
        ));
    }
    if engine.line_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "engine.line_buffer cannot be 0".to_string(),
        ));
    }
    if engine.event_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "engine.event_buffer cannot be 0".to_string(),
        ));
    }

    Ok(())
}
