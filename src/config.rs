use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::platform::{Os, Platform};

pub const PRIMARY_RELEASE_URL: &str =
    "https://forge.joshwel.co/api/v1/repos/mark/sidestepper/releases/latest";
pub const SECONDARY_RELEASE_URL: &str =
    "https://api.github.com/repos/markjoshwel/sidestepper/releases/latest";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// A release feed, queried with a plain GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    pub url: String,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Release feeds, tried in order.
    pub endpoints: Vec<Endpoint>,
    pub global_binary: PathBuf,
    pub version_file: PathBuf,
    pub http_timeout: Duration,
    pub user_agent: String,
}

impl Config {
    /// Default configuration rooted at the current user's home directory.
    pub fn detect(platform: Platform) -> Result<Self, String> {
        let home = dirs::home_dir().ok_or("could not determine home directory")?;
        Ok(Self::with_home(&home, platform))
    }

    pub fn with_home(home: &Path, platform: Platform) -> Self {
        Self {
            endpoints: vec![
                Endpoint::new("primary", PRIMARY_RELEASE_URL),
                Endpoint::new("secondary", SECONDARY_RELEASE_URL),
            ],
            global_binary: home
                .join(".local")
                .join("bin")
                .join(platform.binary_file_name()),
            version_file: version_file_path(home, platform.os),
            http_timeout: HTTP_TIMEOUT,
            user_agent: format!("sidestep/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

fn version_file_path(home: &Path, os: Os) -> PathBuf {
    let dir = match os {
        Os::Windows => home
            .join("AppData")
            .join("Roaming")
            .join("sota staircase")
            .join("sidestepper"),
        Os::Macos => home
            .join("Library")
            .join("Application Support")
            .join("co.joshwel.sotastaircase")
            .join("sidestepper"),
        Os::Linux | Os::Unknown => home.join(".local").join("share").join("sotastaircase"),
    };
    dir.join("sidestepper.version.txt")
}
