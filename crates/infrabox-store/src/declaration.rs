//! Address-block declarations of existing environments.
//!
//! An environment exposes its blocks either through the structured
//! `environment.toml` sidecar or, for directories without one, through the
//! `vnet_cidr = "..."` / `subnet_cidr = "..."` lines of its `variables.tf`.
//! Directories offering neither have no declaration and are skipped by the
//! overlap check.

use crate::layout::RECORD_FILE;
use infrabox_schema::{parse_record_file, AddressBlock, Artifact};
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Where a declaration was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationSource {
    Record,
    VariablesFile,
}

/// The address blocks one environment declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub source: DeclarationSource,
    pub network: Vec<AddressBlock>,
    pub subnet: Vec<AddressBlock>,
    /// Raw values that failed to parse and were left out.
    pub skipped: Vec<String>,
}

impl Declaration {
    /// Network blocks first, then subnet blocks.
    pub fn blocks(&self) -> impl Iterator<Item = &AddressBlock> {
        self.network.iter().chain(self.subnet.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.network.is_empty() && self.subnet.is_empty()
    }
}

fn cidr_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"\b(vnet|subnet)_cidr\s*=\s*["']([^"']+)["']"#).expect("valid cidr key pattern")
    })
}

/// Read the declaration of the environment stored in `dir`.
///
/// Never fails: an unreadable or malformed sidecar falls back to
/// `variables.tf`, and unparsable values are skipped with a warning.
pub fn read_declaration(dir: &Path) -> Option<Declaration> {
    if let Some(decl) = from_record(dir) {
        return Some(decl);
    }
    from_variables_file(dir)
}

fn from_record(dir: &Path) -> Option<Declaration> {
    let path = dir.join(RECORD_FILE);
    if !path.is_file() {
        return None;
    }
    match parse_record_file(&path) {
        Ok(record) => Some(Declaration {
            source: DeclarationSource::Record,
            network: vec![record.params.vnet_address_space],
            subnet: vec![record.params.subnet_address_space],
            skipped: Vec::new(),
        }),
        Err(e) => {
            warn!(
                "ignoring unreadable environment record {}: {e}",
                path.display()
            );
            None
        }
    }
}

fn from_variables_file(dir: &Path) -> Option<Declaration> {
    let path = dir.join(Artifact::Variables.file_name());
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("no declaration in {}", dir.display());
            return None;
        }
        Err(e) => {
            warn!("cannot read {}: {e}", path.display());
            return None;
        }
    };

    let decl = parse_variables(&content);
    for raw in &decl.skipped {
        warn!(
            "skipping malformed address block '{raw}' declared in {}",
            path.display()
        );
    }
    if decl.is_empty() && decl.skipped.is_empty() {
        debug!("{} declares no address blocks", path.display());
        return None;
    }
    Some(decl)
}

/// Extract every `vnet_cidr` / `subnet_cidr` assignment from Terraform text.
pub(crate) fn parse_variables(content: &str) -> Declaration {
    let mut decl = Declaration {
        source: DeclarationSource::VariablesFile,
        network: Vec::new(),
        subnet: Vec::new(),
        skipped: Vec::new(),
    };
    for caps in cidr_key_pattern().captures_iter(content) {
        let raw = &caps[2];
        match AddressBlock::parse(raw) {
            Ok(block) if &caps[1] == "vnet" => decl.network.push(block),
            Ok(block) => decl.subnet.push(block),
            Err(_) => decl.skipped.push(raw.to_owned()),
        }
    }
    decl
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrabox_schema::{EnvName, EnvParams, EnvRecord, ParamDefaults};

    const VARIABLES: &str = r#"
locals {
  vnet_cidr   = "10.4.0.0/16"
  subnet_cidr = '10.4.1.0/24'
}
"#;

    #[test]
    fn parses_both_keys() {
        let decl = parse_variables(VARIABLES);
        assert_eq!(decl.network, vec![AddressBlock::parse("10.4.0.0/16").unwrap()]);
        assert_eq!(decl.subnet, vec![AddressBlock::parse("10.4.1.0/24").unwrap()]);
        assert!(decl.skipped.is_empty());
        assert_eq!(decl.blocks().count(), 2);
    }

    #[test]
    fn malformed_values_are_skipped_not_fatal() {
        let decl = parse_variables("vnet_cidr = \"10.0.0.5/24\"\nsubnet_cidr = \"10.9.0.0/24\"\n");
        assert!(decl.network.is_empty());
        assert_eq!(decl.subnet.len(), 1);
        assert_eq!(decl.skipped, vec!["10.0.0.5/24".to_owned()]);
    }

    #[test]
    fn other_keys_are_ignored() {
        let decl = parse_variables("my_vnet_cidr_list = \"10.0.0.0/8\"\nnot_a_cidr = \"x\"\n");
        assert!(decl.is_empty());
    }

    #[test]
    fn missing_directory_has_no_declaration() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_declaration(&dir.path().join("nope")).is_none());
        assert!(read_declaration(dir.path()).is_none());
    }

    #[test]
    fn variables_file_without_keys_has_no_declaration() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("variables.tf"), "variable \"x\" {}\n").unwrap();
        assert!(read_declaration(dir.path()).is_none());
    }

    #[test]
    fn sidecar_is_preferred_over_variables_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("variables.tf"), VARIABLES).unwrap();
        let env = EnvName::sanitize("dev").unwrap();
        let record = EnvRecord::new(EnvParams::from_defaults(&env, &ParamDefaults::default()));
        fs::write(dir.path().join(RECORD_FILE), record.to_toml().unwrap()).unwrap();

        let decl = read_declaration(dir.path()).unwrap();
        assert_eq!(decl.source, DeclarationSource::Record);
        assert_eq!(decl.network[0].to_string(), "10.0.0.0/16");
    }

    #[test]
    fn broken_sidecar_falls_back_to_variables_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("variables.tf"), VARIABLES).unwrap();
        fs::write(dir.path().join(RECORD_FILE), "format_version = \"x\"").unwrap();

        let decl = read_declaration(dir.path()).unwrap();
        assert_eq!(decl.source, DeclarationSource::VariablesFile);
        assert_eq!(decl.network[0].to_string(), "10.4.0.0/16");
    }
}
