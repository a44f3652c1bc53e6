use super::{types::Config, ConfigError};
use crate::job::{INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER};

/// Validate configuration
/// Currently validates:
/// - Admission limit and poll interval are not 0
/// - Converter executable is set
/// - Argument template mentions both `{input}` and `{output}`
/// - Output extension is set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.scheduler.admission_limit == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.admission_limit cannot be 0".to_string(),
        ));
    }

    if config.scheduler.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.poll_interval_ms cannot be 0".to_string(),
        ));
    }

    if config.converter.executable.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "converter.executable cannot be empty".to_string(),
        ));
    }

    for placeholder in [INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER] {
        if !config.converter.args.iter().any(|a| a.contains(placeholder)) {
            return Err(ConfigError::ValidationError(format!(
                "converter.args must contain {}",
                placeholder
            )));
        }
    }

    if config.output.extension.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "output.extension cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_admission_limit_fails() {
        let mut config = Config::default();
        config.scheduler.admission_limit = 0;
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_poll_interval_fails() {
        let mut config = Config::default();
        config.scheduler.poll_interval_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_missing_output_placeholder_fails() {
        let mut config = Config::default();
        config.converter.args = vec!["-no-upgrade".to_string(), "{input}".to_string()];
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("{output}"));
    }

    #[test]
    fn test_validate_empty_executable_fails() {
        let mut config = Config::default();
        config.converter.executable = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }
}
