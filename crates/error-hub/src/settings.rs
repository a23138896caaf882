use crate::error::ConfigError;
use model::execution::target::SinkTarget;
use planner::query::{
    EncodingPolicy, encoder::DEFAULT_MAX_LINE_SIZE, schema::ErrorTableSchema,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Number of queued records that triggers a flush.
pub const DEFAULT_BATCH_THRESHOLD: usize = 100;

/// Lifetime limit on accepted error records.
pub const DEFAULT_MAX_ERROR_NUM: u64 = 50;

/// Flush and encoding policy of an error hub.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HubSettings {
    pub batch_threshold: usize,
    pub max_error_num: u64,
    pub max_line_size: usize,
    pub encoding_policy: EncodingPolicy,
    pub schema: ErrorTableSchema,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            batch_threshold: DEFAULT_BATCH_THRESHOLD,
            max_error_num: DEFAULT_MAX_ERROR_NUM,
            max_line_size: DEFAULT_MAX_LINE_SIZE,
            encoding_policy: EncodingPolicy::default(),
            schema: ErrorTableSchema::default(),
        }
    }
}

impl HubSettings {
    pub fn with_batch_threshold(mut self, batch_threshold: usize) -> Self {
        self.batch_threshold = batch_threshold;
        self
    }

    pub fn with_max_error_num(mut self, max_error_num: u64) -> Self {
        self.max_error_num = max_error_num;
        self
    }

    pub fn with_max_line_size(mut self, max_line_size: usize) -> Self {
        self.max_line_size = max_line_size;
        self
    }

    pub fn with_encoding_policy(mut self, policy: EncodingPolicy) -> Self {
        self.encoding_policy = policy;
        self
    }

    pub fn with_schema(mut self, schema: ErrorTableSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_threshold == 0 {
            return Err(ConfigError::Setting {
                name: "batch_threshold",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_line_size == 0 {
            return Err(ConfigError::Setting {
                name: "max_line_size",
                reason: "must be at least 1".to_string(),
            });
        }
        self.schema.validate()?;

        // Legal, but only close() will ever flush in this configuration.
        if self.max_error_num < self.batch_threshold as u64 {
            warn!(
                max_error_num = self.max_error_num,
                batch_threshold = self.batch_threshold,
                "Error limit is below the batch threshold; records are flushed on close only"
            );
        }
        Ok(())
    }
}

/// Everything needed to build a hub: where to write and how.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HubConfig {
    pub target: SinkTarget,
    #[serde(default)]
    pub settings: HubSettings,
}

impl HubConfig {
    pub fn new(target: SinkTarget, settings: HubSettings) -> Self {
        Self { target, settings }
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: HubConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.target.validate().map_err(ConfigError::Target)?;
        self.settings.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::execution::target::TargetIssue;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tracing_test::traced_test;

    const CONFIG_JSON: &str = r#"{
        "target": {
            "host": "10.0.0.5",
            "port": 9030,
            "user": "loader",
            "password": "pw",
            "database": "load_errors",
            "table": "error_log"
        },
        "settings": {
            "batch_threshold": 200,
            "encoding_policy": "skip_record"
        }
    }"#;

    #[test]
    fn test_defaults_match_reference_policy() {
        let settings = HubSettings::default();
        assert_eq!(settings.batch_threshold, 100);
        assert_eq!(settings.max_error_num, 50);
        assert_eq!(settings.max_line_size, 500);
        assert_eq!(settings.encoding_policy, EncodingPolicy::FailBatch);
    }

    #[test]
    fn test_partial_settings_fall_back_to_defaults() {
        let config = HubConfig::from_json_str(CONFIG_JSON).unwrap();
        assert_eq!(config.target.port, 9030);
        assert_eq!(config.settings.batch_threshold, 200);
        assert_eq!(config.settings.max_error_num, DEFAULT_MAX_ERROR_NUM);
        assert_eq!(config.settings.encoding_policy, EncodingPolicy::SkipRecord);
        assert_eq!(config.settings.schema, ErrorTableSchema::default());
    }

    #[test]
    fn test_missing_settings_section() {
        let json = r#"{"target": {"host": "h", "port": 1, "user": "u", "database": "d", "table": "t"}}"#;
        let config = HubConfig::from_json_str(json).unwrap();
        assert_eq!(config.settings, HubSettings::default());
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let err = HubSettings::default()
            .with_batch_threshold(0)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Setting {
                name: "batch_threshold",
                ..
            }
        ));
    }

    #[test]
    fn test_validate_rejects_bad_target() {
        let json = r#"{"target": {"host": "h", "port": 0, "user": "u", "database": "d", "table": "t"}}"#;
        let err = HubConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::Target(TargetIssue::ZeroPort)));
    }

    #[test]
    fn test_invalid_json() {
        let err = HubConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[traced_test]
    #[test]
    fn test_warns_when_limit_below_threshold() {
        HubSettings::default().validate().unwrap();
        assert!(logs_contain("records are flushed on close only"));
    }

    #[tokio::test]
    async fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(CONFIG_JSON.as_bytes()).unwrap();

        let config = HubConfig::from_file(file.path()).await.unwrap();
        assert_eq!(config.target.table, "error_log");
    }

    #[tokio::test]
    async fn test_from_missing_file() {
        let err = HubConfig::from_file("/nonexistent/hub.json").await.unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }
}
