use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::locate;
use crate::platform::{Os, Platform};
use crate::release::{self, Transport};
use crate::version::VersionStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The recorded tag matches the feed and the binary is in place; nothing was written.
    UpToDate { tag: String },
    Installed { tag: String, path: PathBuf, bytes: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("could not determine sidestepper binary name, your platform ({0}) is probably unsupported")]
    UnsupportedPlatform(Platform),

    #[error("{0}")]
    VersionStore(String),

    #[error("{0}")]
    NoRelease(String),

    #[error("could not download sidestepper release {tag}: {message}")]
    Download { tag: String, message: String },

    #[error("could not make sidestepper release {tag} at '{}' executable ({message}); try running `chmod +x '{}'`", .path.display(), .path.display())]
    Permissions {
        tag: String,
        path: PathBuf,
        message: String,
    },

    #[error("{0}")]
    RecordVersion(String),
}

/// Bring the global install up to date with the newest release.
///
/// The version record is only written after the new binary is fully in place, so a
/// failed download never advances it.
pub fn update(
    config: &Config,
    platform: Platform,
    transport: &dyn Transport,
    diag: &mut Diagnostics,
) -> Result<UpdateOutcome, UpdateError> {
    let asset_name = platform
        .asset_name()
        .ok_or(UpdateError::UnsupportedPlatform(platform))?;
    diag.record("asset", asset_name.clone());

    let store = VersionStore::new(&config.version_file);
    store.ensure_dir().map_err(UpdateError::VersionStore)?;
    diag.record("version file", store.path().display().to_string());
    tracing::debug!("resolved version file path to '{}'", store.path().display());

    let info = release::fetch_release(transport, &config.endpoints, &asset_name, diag)
        .map_err(UpdateError::NoRelease)?;

    let current = store.read().map_err(UpdateError::VersionStore)?;
    if let Some(current) = &current {
        diag.record("local tag", current.clone());
    }
    if current.as_deref() == Some(info.tag.as_str()) && locate::is_usable(&config.global_binary) {
        tracing::debug!("sidestepper {} is already installed, nothing to do", info.tag);
        return Ok(UpdateOutcome::UpToDate { tag: info.tag });
    }

    tracing::debug!("downloading {} from {}", info.tag, info.asset_url);
    let bytes = install(
        transport,
        &info.asset_url,
        &config.global_binary,
        platform.os,
    )
    .map_err(|e| match e {
        InstallError::Download(message) => UpdateError::Download {
            tag: info.tag.clone(),
            message,
        },
        InstallError::Permissions(message) => UpdateError::Permissions {
            tag: info.tag.clone(),
            path: config.global_binary.clone(),
            message,
        },
    })?;

    tracing::debug!(
        "writing sidestepper version {} to '{}'",
        info.tag,
        store.path().display()
    );
    store.write(&info.tag).map_err(UpdateError::RecordVersion)?;

    Ok(UpdateOutcome::Installed {
        tag: info.tag,
        path: config.global_binary.clone(),
        bytes,
    })
}

enum InstallError {
    Download(String),
    Permissions(String),
}

/// Stream `url` into a temporary file beside `dest`, mark it executable, then move it over
/// `dest`. On failure `dest` is left as it was.
fn install(
    transport: &dyn Transport,
    url: &str,
    dest: &Path,
    os: Os,
) -> Result<u64, InstallError> {
    let dir = dest
        .parent()
        .ok_or_else(|| InstallError::Download(format!("'{}' has no parent", dest.display())))?;
    fs::create_dir_all(dir).map_err(|e| {
        InstallError::Download(format!("failed to create {}: {e}", dir.display()))
    })?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| {
        InstallError::Download(format!("failed to create temporary file in {}: {e}", dir.display()))
    })?;

    let bytes = transport
        .download(url, tmp.as_file_mut())
        .map_err(|e| InstallError::Download(format!("{e} (from {url})")))?;
    tmp.as_file_mut()
        .flush()
        .map_err(|e| InstallError::Download(format!("failed to flush download: {e}")))?;

    if os != Os::Windows {
        set_executable(tmp.path()).map_err(InstallError::Permissions)?;
    }

    tmp.persist(dest).map_err(|e| {
        InstallError::Download(format!("failed to move download to {}: {}", dest.display(), e.error))
    })?;

    Ok(bytes)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<(), String> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|e| format!("failed to set permissions: {e}"))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<(), String> {
    Ok(())
}
