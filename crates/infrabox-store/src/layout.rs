use infrabox_schema::Artifact;
use std::path::{Path, PathBuf};

/// File name of the structured sidecar inside each environment directory.
pub const RECORD_FILE: &str = "environment.toml";

/// Directory layout for the environments root.
///
/// Every environment is one subdirectory named after the environment, holding
/// the generated Terraform files and the sidecar record.
#[derive(Debug, Clone)]
pub struct EnvLayout {
    root: PathBuf,
}

impl EnvLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn env_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    #[inline]
    pub fn artifact_path(&self, name: &str, artifact: Artifact) -> PathBuf {
        self.env_path(name).join(artifact.file_name())
    }

    #[inline]
    pub fn record_path(&self, name: &str) -> PathBuf {
        self.env_path(name).join(RECORD_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_are_correct() {
        let layout = EnvLayout::new("/tmp/infrabox-test/environments");
        assert_eq!(
            layout.env_path("dev"),
            PathBuf::from("/tmp/infrabox-test/environments/dev")
        );
        assert_eq!(
            layout.artifact_path("dev", Artifact::Variables),
            PathBuf::from("/tmp/infrabox-test/environments/dev/variables.tf")
        );
        assert_eq!(
            layout.record_path("stage"),
            PathBuf::from("/tmp/infrabox-test/environments/stage/environment.toml")
        );
    }
}
