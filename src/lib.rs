mod acquire;
mod config;
mod diagnostics;
mod launch;
mod locate;
mod platform;
mod release;
mod update;
mod version;

use std::path::Path;

pub use acquire::{acquire, AcquireError, Acquired};
pub use config::{Config, Endpoint};
pub use diagnostics::Diagnostics;
pub use launch::{find_repo_root, launch};
pub use locate::{locate, BinaryLocation, LocateError};
pub use platform::{Arch, Os, Platform};
pub use release::{fetch_release, HttpTransport, ReleaseInfo, Transport};
pub use update::{update, UpdateError, UpdateOutcome};

#[derive(Debug, thiserror::Error)]
pub enum LauncherError {
    #[error("configuration failed: {0}")]
    Config(String),

    #[error(transparent)]
    Acquire(#[from] AcquireError),
}

impl LauncherError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 3,
            Self::Acquire(e) => e.exit_code(),
        }
    }
}

/// Locate, and if needed download or update, the `sidestepper` binary for this host.
///
/// `root` is the enclosing repository, searched for a pinned local binary first.
pub fn acquire_for_host(
    root: Option<&Path>,
    diag: &mut Diagnostics,
) -> Result<Acquired, LauncherError> {
    let platform = Platform::current();
    let config = Config::detect(platform).map_err(LauncherError::Config)?;
    let transport =
        HttpTransport::new(&config.user_agent, config.http_timeout).map_err(LauncherError::Config)?;

    Ok(acquire(root, &config, platform, &transport, diag)?)
}
