use std::path::{Path, PathBuf};
use std::process::Command;

/// Walk up from `start` to the first directory containing `.git`.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

/// Run `binary` inside `root` with inherited stdio and return its exit code.
pub fn launch(binary: &Path, root: &Path) -> Result<i32, String> {
    let status = Command::new(binary)
        .current_dir(root)
        .status()
        .map_err(|e| format!("failed to run '{}': {e}", binary.display()))?;

    // killed by a signal
    Ok(status.code().unwrap_or(1))
}
