use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use thiserror::Error;

/// Environment names offered by the CLI for `create` and `destroy`.
pub const KNOWN_ENVIRONMENTS: &[&str] = &["dev", "stage", "prod"];

const MAX_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("environment name '{0}' contains no usable characters (expected [a-z0-9_-])")]
    Empty(String),
    #[error("environment name '{0}' is longer than 64 characters")]
    TooLong(String),
    #[error("unknown environment '{input}' (expected one of: {})", KNOWN_ENVIRONMENTS.join(", "))]
    Unknown { input: String },
}

/// A sanitized environment name: lowercase ASCII alphanumerics, `-` and `_`.
///
/// The name doubles as the environment's directory name, so the character set
/// is restricted to keep it free of path separators and traversal segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnvName(String);

impl EnvName {
    /// Strip everything outside `[A-Za-z0-9_-]` and lowercase the rest.
    pub fn sanitize(raw: &str) -> Result<Self, NameError> {
        let cleaned: String = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect::<String>()
            .to_ascii_lowercase();

        if cleaned.is_empty() {
            return Err(NameError::Empty(raw.to_owned()));
        }
        if cleaned.len() > MAX_NAME_LEN {
            return Err(NameError::TooLong(raw.to_owned()));
        }
        Ok(Self(cleaned))
    }

    /// Accept only one of [`KNOWN_ENVIRONMENTS`], verbatim.
    pub fn known(raw: &str) -> Result<Self, NameError> {
        if KNOWN_ENVIRONMENTS.contains(&raw) {
            Ok(Self(raw.to_owned()))
        } else {
            Err(NameError::Unknown {
                input: raw.to_owned(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for EnvName {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EnvName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for EnvName {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl fmt::Display for EnvName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for EnvName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EnvName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl TryFrom<String> for EnvName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let name = Self::sanitize(&value)?;
        if name.0 == value {
            Ok(name)
        } else {
            Err(NameError::Empty(value))
        }
    }
}

impl From<EnvName> for String {
    fn from(name: EnvName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_safe_characters() {
        assert_eq!(EnvName::sanitize("dev").unwrap(), "dev");
        assert_eq!(EnvName::sanitize("qa_2-east").unwrap(), "qa_2-east");
    }

    #[test]
    fn sanitize_lowercases_and_strips() {
        assert_eq!(EnvName::sanitize("  Stage!  ").unwrap(), "stage");
        assert_eq!(EnvName::sanitize("../../etc/passwd").unwrap(), "etcpasswd");
        assert_eq!(EnvName::sanitize("pr od;rm -rf").unwrap(), "prodrm-rf");
    }

    #[test]
    fn sanitize_rejects_empty_result() {
        assert!(matches!(EnvName::sanitize(""), Err(NameError::Empty(_))));
        assert!(matches!(EnvName::sanitize("/$%"), Err(NameError::Empty(_))));
    }

    #[test]
    fn sanitize_rejects_overlong_names() {
        let long = "a".repeat(65);
        assert!(matches!(EnvName::sanitize(&long), Err(NameError::TooLong(_))));
        assert!(EnvName::sanitize(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn known_accepts_only_the_fixed_set() {
        for env in KNOWN_ENVIRONMENTS {
            assert_eq!(EnvName::known(env).unwrap(), *env);
        }
        let err = EnvName::known("qa").unwrap_err();
        assert!(err.to_string().contains("dev, stage, prod"));
        assert!(EnvName::known("DEV").is_err());
    }

    #[test]
    fn deserialize_requires_sanitized_form() {
        let ok: EnvName = serde_json::from_str("\"dev\"").unwrap();
        assert_eq!(ok, "dev");
        assert!(serde_json::from_str::<EnvName>("\"Dev\"").is_err());
        assert!(serde_json::from_str::<EnvName>("\"a/b\"").is_err());
    }
}
