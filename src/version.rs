use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Single-line record of the release tag installed at the global path.
#[derive(Debug, Clone)]
pub struct VersionStore {
    path: PathBuf,
}

impl VersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the directory holding the record. Never creates the record itself.
    pub fn ensure_dir(&self) -> Result<(), String> {
        let Some(parent) = self.path.parent() else {
            return Ok(());
        };
        fs::create_dir_all(parent)
            .map_err(|e| format!("could not create directory '{}': {e}", parent.display()))
    }

    /// The recorded tag, or `None` if nothing has been installed yet.
    pub fn read(&self) -> Result<Option<String>, String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(format!(
                "could not read version file '{}': {e}",
                self.path.display()
            )),
        }
    }

    /// Overwrite the record with exactly `tag`.
    pub fn write(&self, tag: &str) -> Result<(), String> {
        self.ensure_dir()?;
        fs::write(&self.path, tag).map_err(|e| {
            format!(
                "could not write version {tag} to '{}': {e}",
                self.path.display()
            )
        })
    }
}
