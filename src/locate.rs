use std::io;
use std::path::{Path, PathBuf};

use crate::platform::Platform;

/// Where a usable payload binary was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryLocation {
    /// Inside the repository. Pinned by the user, never updated.
    LocalOverride(PathBuf),
    GlobalInstall(PathBuf),
    /// Nothing installed yet.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocateError {
    #[error("could not determine sidestepper binary name, your platform ({0}) is probably unsupported")]
    UnsupportedPlatform(Platform),

    #[error("'{}' exists but is not a file", .0.display())]
    NotAFile(PathBuf),

    #[error("'{}' exists but is not executable", .0.display())]
    NotExecutable(PathBuf),

    #[error("could not inspect '{}': {message}", .path.display())]
    Inaccessible { path: PathBuf, message: String },
}

/// Candidate override paths inside a repository, in search order.
pub fn local_candidates(root: &Path, asset_name: &str, binary_name: &str) -> [PathBuf; 4] {
    let tooling = root.join("Tooling");
    [
        root.join(asset_name),
        root.join(binary_name),
        tooling.join(asset_name),
        tooling.join(binary_name),
    ]
}

/// Find the payload binary, preferring a repository-local override over the global install.
///
/// A candidate that exists but is unusable stops the search: falling through to the
/// next candidate could hide a broken override.
pub fn locate(
    root: Option<&Path>,
    platform: Platform,
    global_binary: &Path,
) -> Result<BinaryLocation, LocateError> {
    let asset_name = platform
        .asset_name()
        .ok_or(LocateError::UnsupportedPlatform(platform))?;

    if let Some(root) = root {
        for candidate in local_candidates(root, &asset_name, &platform.binary_file_name()) {
            tracing::debug!("trying to use '{}'", candidate.display());
            if check_candidate(&candidate)? {
                return Ok(BinaryLocation::LocalOverride(candidate));
            }
        }
    }

    tracing::debug!("trying to use '{}'", global_binary.display());
    if check_candidate(global_binary)? {
        Ok(BinaryLocation::GlobalInstall(global_binary.to_path_buf()))
    } else {
        Ok(BinaryLocation::NotFound)
    }
}

/// `Ok(false)` if absent, `Ok(true)` if usable, `Err` if present but unusable.
fn check_candidate(path: &Path) -> Result<bool, LocateError> {
    let metadata = match path.metadata() {
        Ok(metadata) => metadata,
        Err(e) if is_absent(&e) => return Ok(false),
        Err(e) => {
            return Err(LocateError::Inaccessible {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    };
    if !metadata.is_file() {
        return Err(LocateError::NotAFile(path.to_path_buf()));
    }
    if !is_executable(path) {
        return Err(LocateError::NotExecutable(path.to_path_buf()));
    }
    Ok(true)
}

/// Whether `path` is an existing regular file the current user may execute.
pub fn is_usable(path: &Path) -> bool {
    path.metadata().is_ok_and(|m| m.is_file()) && is_executable(path)
}

#[cfg(unix)]
fn is_absent(e: &io::Error) -> bool {
    // a path component that is a regular file, e.g. `Tooling` as a file
    e.kind() == io::ErrorKind::NotFound || e.raw_os_error() == Some(libc::ENOTDIR)
}

#[cfg(not(unix))]
fn is_absent(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::NotFound
}

/// Execute permission for the current user, as `access(2)` with `X_OK` reports it.
#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: `c_path` is a NUL-terminated string that outlives the call.
    unsafe { libc::access(c_path.as_ptr(), libc::X_OK) == 0 }
}

#[cfg(not(unix))]
const fn is_executable(_path: &Path) -> bool {
    true
}
