//! The structured sidecar written next to the generated configuration.
//!
//! Peers read this record during overlap checks instead of scraping the
//! generated Terraform text.

use crate::name::EnvName;
use crate::params::EnvParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Current record format version. Incremented on incompatible changes.
pub const RECORD_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to read environment record: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse environment record: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("failed to serialize environment record: {0}")]
    SerializeToml(#[from] toml::ser::Error),
    #[error("unsupported record format_version: {0}, expected {RECORD_FORMAT_VERSION}")]
    UnsupportedVersion(u32),
    #[error("record names environment '{found}' but lives in directory '{expected}'")]
    NameMismatch { expected: String, found: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvRecord {
    pub format_version: u32,
    pub environment: EnvName,
    pub created_at: String,
    pub params: EnvParams,
}

impl EnvRecord {
    pub fn new(params: EnvParams) -> Self {
        Self {
            format_version: RECORD_FORMAT_VERSION,
            environment: params.environment.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
            params,
        }
    }

    pub fn to_toml(&self) -> Result<String, RecordError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Fail if the record was copied from another environment's directory.
    pub fn verify_owner(&self, dir_name: &str) -> Result<(), RecordError> {
        if self.environment.as_str() == dir_name {
            Ok(())
        } else {
            Err(RecordError::NameMismatch {
                expected: dir_name.to_owned(),
                found: self.environment.to_string(),
            })
        }
    }
}

pub fn parse_record_str(input: &str) -> Result<EnvRecord, RecordError> {
    let record: EnvRecord = toml::from_str(input)?;
    if record.format_version != RECORD_FORMAT_VERSION {
        return Err(RecordError::UnsupportedVersion(record.format_version));
    }
    Ok(record)
}

pub fn parse_record_file(path: impl AsRef<Path>) -> Result<EnvRecord, RecordError> {
    let content = fs::read_to_string(path)?;
    parse_record_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamDefaults;

    fn sample() -> EnvRecord {
        let env = EnvName::sanitize("stage").unwrap();
        EnvRecord::new(EnvParams::from_defaults(&env, &ParamDefaults::default()))
    }

    #[test]
    fn serializes_params_table() {
        let text = sample().to_toml().unwrap();
        assert!(text.contains("format_version = 1"));
        assert!(text.contains("[params]"));
        assert!(text.contains("vnet_address_space = \"10.0.0.0/16\""));
        assert!(text.contains("subnet_address_space = \"10.0.1.0/24\""));
    }

    #[test]
    fn parse_reads_back_written_record() {
        let record = sample();
        let parsed = parse_record_str(&record.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn rejects_future_format_version() {
        let text = sample().to_toml().unwrap().replace(
            "format_version = 1",
            "format_version = 7",
        );
        assert!(matches!(
            parse_record_str(&text),
            Err(RecordError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn rejects_malformed_block() {
        let text = sample()
            .to_toml()
            .unwrap()
            .replace("10.0.0.0/16", "10.0.0.9/16");
        assert!(matches!(
            parse_record_str(&text),
            Err(RecordError::ParseToml(_))
        ));
    }

    #[test]
    fn verify_owner_detects_copied_record() {
        let record = sample();
        assert!(record.verify_owner("stage").is_ok());
        assert!(matches!(
            record.verify_owner("prod"),
            Err(RecordError::NameMismatch { .. })
        ));
    }

    #[test]
    fn parse_file_reports_missing_file() {
        let dir = std::env::temp_dir().join("infrabox-record-missing-test");
        assert!(matches!(
            parse_record_file(dir.join("environment.toml")),
            Err(RecordError::Io(_))
        ));
    }
}
