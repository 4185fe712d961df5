use crate::layout::EnvLayout;
use crate::{write_atomic, StoreError};
use infrabox_schema::{parse_record_file, Artifact, EnvName, EnvRecord};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

/// A directory found under the environments root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvEntry {
    pub name: String,
    pub path: PathBuf,
}

/// Environment directories under one root.
///
/// An environment exists exactly when its directory exists; the generated
/// files inside it are the environment's only durable state.
#[derive(Debug, Clone)]
pub struct EnvStore {
    layout: EnvLayout,
}

impl EnvStore {
    pub fn new(layout: EnvLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &EnvLayout {
        &self.layout
    }

    pub fn exists(&self, name: &str) -> bool {
        self.layout.env_path(name).exists()
    }

    /// Every non-hidden directory under the root, sorted by name. A missing
    /// root is an empty listing.
    pub fn list(&self) -> Result<Vec<EnvEntry>, StoreError> {
        let root = self.layout.root();
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("environments root {} does not exist yet", root.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                warn!("skipping non-UTF-8 directory under {}", root.display());
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            out.push(EnvEntry {
                name,
                path: entry.path(),
            });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    /// Create the environment directory. Fails if it is already present, so
    /// two initializations of the same name can never both proceed.
    pub fn create_dir(&self, name: &EnvName) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(self.layout.root())?;
        let path = self.layout.env_path(name);
        match fs::create_dir(&path) {
            Ok(()) => {
                debug!("created environment directory {}", path.display());
                Ok(path)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StoreError::AlreadyExists(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write one file into an existing environment directory.
    pub fn write_file(
        &self,
        name: &EnvName,
        file_name: &str,
        content: &str,
    ) -> Result<PathBuf, StoreError> {
        let dir = self.layout.env_path(name);
        if !dir.is_dir() {
            return Err(StoreError::EnvNotFound(name.to_string()));
        }
        let dest = dir.join(file_name);
        write_atomic(&dest, content)?;
        debug!("wrote {}", dest.display());
        Ok(dest)
    }

    pub fn write_artifact(
        &self,
        name: &EnvName,
        artifact: Artifact,
        content: &str,
    ) -> Result<PathBuf, StoreError> {
        self.write_file(name, artifact.file_name(), content)
    }

    pub fn write_record(&self, record: &EnvRecord) -> Result<PathBuf, StoreError> {
        let content = record.to_toml()?;
        self.write_file(&record.environment, crate::layout::RECORD_FILE, &content)
    }

    /// Read the sidecar record. `Ok(None)` when the environment has none,
    /// which is the case for directories written by hand or by older tools.
    pub fn read_record(&self, name: &str) -> Result<Option<EnvRecord>, StoreError> {
        let path = self.layout.record_path(name);
        if !path.is_file() {
            return Ok(None);
        }
        let record = parse_record_file(&path)?;
        record.verify_owner(name)?;
        Ok(Some(record))
    }

    /// Remove an environment directory and everything in it.
    pub fn remove(&self, name: &str) -> Result<(), StoreError> {
        let path = self.layout.env_path(name);
        match fs::remove_dir_all(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::EnvNotFound(name.to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrabox_schema::{EnvParams, ParamDefaults};

    fn setup() -> (tempfile::TempDir, EnvStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = EnvStore::new(EnvLayout::new(dir.path().join("environments")));
        (dir, store)
    }

    fn env(name: &str) -> EnvName {
        EnvName::sanitize(name).unwrap()
    }

    #[test]
    fn list_of_missing_root_is_empty() {
        let (_dir, store) = setup();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn create_dir_then_exists() {
        let (_dir, store) = setup();
        assert!(!store.exists("dev"));
        let path = store.create_dir(&env("dev")).unwrap();
        assert!(path.is_dir());
        assert!(store.exists("dev"));
    }

    #[test]
    fn create_dir_twice_fails() {
        let (_dir, store) = setup();
        store.create_dir(&env("dev")).unwrap();
        let err = store.create_dir(&env("dev")).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(name) if name == "dev"));
    }

    #[test]
    fn list_skips_files_and_hidden_dirs_and_sorts() {
        let (_dir, store) = setup();
        store.create_dir(&env("stage")).unwrap();
        store.create_dir(&env("dev")).unwrap();
        fs::create_dir(store.layout().root().join(".cache")).unwrap();
        fs::write(store.layout().root().join("README"), "notes").unwrap();

        let names: Vec<_> = store.list().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["dev", "stage"]);
    }

    #[test]
    fn write_file_requires_directory() {
        let (_dir, store) = setup();
        let err = store.write_file(&env("dev"), "main.tf", "x").unwrap_err();
        assert!(matches!(err, StoreError::EnvNotFound(_)));
    }

    #[test]
    fn write_artifact_lands_in_env_dir() {
        let (_dir, store) = setup();
        store.create_dir(&env("dev")).unwrap();
        let path = store
            .write_artifact(&env("dev"), Artifact::Main, "resource {}\n")
            .unwrap();
        assert_eq!(path, store.layout().artifact_path("dev", Artifact::Main));
        assert_eq!(fs::read_to_string(path).unwrap(), "resource {}\n");
    }

    #[test]
    fn record_write_read_cycle() {
        let (_dir, store) = setup();
        let name = env("dev");
        store.create_dir(&name).unwrap();
        let record = EnvRecord::new(EnvParams::from_defaults(&name, &ParamDefaults::default()));
        store.write_record(&record).unwrap();

        let loaded = store.read_record("dev").unwrap().unwrap();
        assert_eq!(loaded.params, record.params);
    }

    #[test]
    fn read_record_absent_is_none() {
        let (_dir, store) = setup();
        store.create_dir(&env("dev")).unwrap();
        assert!(store.read_record("dev").unwrap().is_none());
    }

    #[test]
    fn read_record_rejects_copied_sidecar() {
        let (_dir, store) = setup();
        let dev = env("dev");
        store.create_dir(&dev).unwrap();
        store.create_dir(&env("stage")).unwrap();
        let record = EnvRecord::new(EnvParams::from_defaults(&dev, &ParamDefaults::default()));
        store
            .write_file(&env("stage"), crate::layout::RECORD_FILE, &record.to_toml().unwrap())
            .unwrap();

        assert!(matches!(
            store.read_record("stage"),
            Err(StoreError::Record(_))
        ));
    }

    #[test]
    fn remove_deletes_tree() {
        let (_dir, store) = setup();
        store.create_dir(&env("dev")).unwrap();
        store.write_file(&env("dev"), "main.tf", "x").unwrap();
        store.remove("dev").unwrap();
        assert!(!store.exists("dev"));
        assert!(matches!(store.remove("dev"), Err(StoreError::EnvNotFound(_))));
    }
}
