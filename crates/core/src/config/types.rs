use serde::{Deserialize, Serialize};

use crate::driver::ConverterConfig;
use crate::naming::OutputConfig;
use crate::preflight::PreflightConfig;
use crate::scheduler::SchedulerConfig;

/// Root configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub preflight: PreflightConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::UnknownExitPolicy;
    use crate::naming::OutputNaming;
    use std::path::PathBuf;

    #[test]
    fn test_deserialize_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.converter.executable, "bfconvert");
        assert_eq!(config.scheduler.admission_limit, 3);
        assert_eq!(config.scheduler.poll_interval_ms, 2000);
        assert!(config.preflight.enabled);
        assert_eq!(config.output.naming, OutputNaming::Hash);
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[converter]
tool_dir = "/opt/bftools"
executable = "bfconvert"
args = ["-no-upgrade", "{input}", "{output}"]
unknown_exit_codes = "success"

[scheduler]
admission_limit = 6
poll_interval_ms = 500

[preflight]
enabled = false
runtime_command = []

[output]
naming = "stem"
extension = "ome.tiff"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.converter.tool_path(),
            PathBuf::from("/opt/bftools/bfconvert")
        );
        assert_eq!(config.converter.args.len(), 3);
        assert_eq!(
            config.converter.unknown_exit_codes,
            UnknownExitPolicy::Success
        );
        assert_eq!(config.scheduler.admission_limit, 6);
        assert!(!config.preflight.enabled);
        assert!(config.preflight.runtime_command.is_empty());
        assert_eq!(config.output.naming, OutputNaming::Stem);
        assert_eq!(config.output.extension, "ome.tiff");
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let toml = r#"
[converter]
unknown_exit_codes = "maybe"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.converter.args, config.converter.args);
    }
}
