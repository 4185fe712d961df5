//! On-disk environment state for infrabox.
//!
//! This crate owns the environments directory: `EnvLayout` for path
//! computation, `EnvStore` for creating, listing, writing, and removing
//! environment directories, `read_declaration` for discovering the address
//! blocks a peer environment declares, `check_overlap` for the CIDR overlap
//! guard, and `Rollback` for undoing a half-finished initialization.

pub mod declaration;
pub mod environments;
pub mod layout;
pub mod overlap;
pub mod rollback;

pub use declaration::{read_declaration, Declaration, DeclarationSource};
pub use environments::{EnvEntry, EnvStore};
pub use layout::{EnvLayout, RECORD_FILE};
pub use overlap::{check_overlap, find_conflicts, OverlapError};
pub use rollback::{Rollback, RollbackStep};

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Write `content` to `dest` through a temp file in the same directory, so a
/// reader never observes a half-written file.
pub(crate) fn write_atomic(dest: &Path, content: &str) -> Result<(), StoreError> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("environment record error: {0}")]
    Record(#[from] infrabox_schema::RecordError),
    #[error("environment directory '{0}' already exists")]
    AlreadyExists(String),
    #[error("environment not found: {0}")]
    EnvNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("main.tf");
        write_atomic(&dest, "first").unwrap();
        write_atomic(&dest, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "second");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn store_error_display_already_exists() {
        let e = StoreError::AlreadyExists("dev".to_owned());
        assert!(e.to_string().contains("'dev' already exists"));
    }

    #[test]
    fn store_error_display_env_not_found() {
        let e = StoreError::EnvNotFound("prod".to_owned());
        assert!(e.to_string().contains("prod"));
    }
}
