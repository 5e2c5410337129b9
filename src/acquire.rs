use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::locate::{self, BinaryLocation, LocateError};
use crate::platform::Platform;
use crate::release::Transport;
use crate::update::{self, UpdateError, UpdateOutcome};

/// A runnable payload binary and how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquired {
    /// Repository-local override, used as-is.
    Local(PathBuf),
    /// Existing global install, updated if possible.
    Global(PathBuf),
    /// Freshly downloaded into the global location.
    Installed(PathBuf),
}

impl Acquired {
    pub fn path(&self) -> &Path {
        match self {
            Self::Local(p) | Self::Global(p) | Self::Installed(p) => p,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error("could not find sidestepper binary")]
    Unresolved,
}

impl AcquireError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Unresolved => 2,
            Self::Locate(_) | Self::Update(_) => 3,
        }
    }
}

/// Produce a runnable, reasonably current payload binary.
///
/// A local override is returned untouched. An existing global install is updated on a
/// best-effort basis; if that fails the stale binary is still returned. With nothing
/// installed, a full update must succeed.
pub fn acquire(
    root: Option<&Path>,
    config: &Config,
    platform: Platform,
    transport: &dyn Transport,
    diag: &mut Diagnostics,
) -> Result<Acquired, AcquireError> {
    diag.record("platform", platform.to_string());
    diag.record("global binary", config.global_binary.display().to_string());
    if let Some(root) = root {
        diag.record("root", root.display().to_string());
    }

    let location = locate::locate(root, platform, &config.global_binary)?;
    tracing::debug!("resolved binary location: {location:?}");

    match location {
        BinaryLocation::LocalOverride(path) => Ok(Acquired::Local(path)),
        BinaryLocation::GlobalInstall(path) => {
            tracing::debug!("attempting update");
            match update::update(config, platform, transport, diag) {
                Ok(outcome) => log_outcome(&outcome),
                Err(e) => diag.warn(format!(
                    "tried to update sidestepper but failed, continuing with the installed binary ({e})"
                )),
            }
            Ok(Acquired::Global(path))
        }
        BinaryLocation::NotFound => {
            tracing::debug!("no binary found, downloading latest");
            let outcome = update::update(config, platform, transport, diag)?;
            log_outcome(&outcome);
            if locate::is_usable(&config.global_binary) {
                Ok(Acquired::Installed(config.global_binary.clone()))
            } else {
                Err(AcquireError::Unresolved)
            }
        }
    }
}

fn log_outcome(outcome: &UpdateOutcome) {
    match outcome {
        UpdateOutcome::UpToDate { tag } => tracing::debug!("sidestepper {tag} is up to date"),
        UpdateOutcome::Installed { tag, path, bytes } => {
            tracing::debug!("installed sidestepper {tag} to '{}' ({bytes} bytes)", path.display());
        }
    }
}
