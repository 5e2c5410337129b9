use std::env::consts::{ARCH, OS};
use std::fmt;

/// Name shared by every published asset and the global install.
pub const BINARY_STEM: &str = "sidestepper";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Windows,
    Linux,
    Macos,
    Unknown,
}

impl Os {
    /// Map a raw OS name (as reported by the runtime) to a known OS.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            "darwin" | "macos" => Self::Macos,
            _ => Self::Unknown,
        }
    }

    pub const fn token(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Macos => "macos",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X86_64,
    Aarch64,
    Unknown,
}

impl Arch {
    /// Map a raw CPU architecture name to a known architecture, folding synonyms.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Self::X86_64,
            "aarch64" | "arm64" => Self::Aarch64,
            _ => Self::Unknown,
        }
    }

    pub const fn token(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        Self::from_raw(OS, ARCH)
    }

    pub fn from_raw(os: &str, arch: &str) -> Self {
        Self {
            os: Os::from_raw(os),
            arch: Arch::from_raw(arch),
        }
    }

    pub fn is_supported(self) -> bool {
        self.os != Os::Unknown && self.arch != Arch::Unknown
    }

    /// Release asset name for this platform, e.g. `sidestepper-linux-x86_64`.
    ///
    /// Returns `None` when either component is unknown.
    pub fn asset_name(self) -> Option<String> {
        if !self.is_supported() {
            return None;
        }
        let name = format!("{BINARY_STEM}-{}-{}", self.os.token(), self.arch.token());
        Some(if self.os == Os::Windows {
            format!("{name}.exe")
        } else {
            name
        })
    }

    /// File name of the global install and of the canonical local override.
    pub fn binary_file_name(self) -> String {
        if self.os == Os::Windows {
            format!("{BINARY_STEM}.exe")
        } else {
            BINARY_STEM.to_string()
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.token(), self.arch.token())
    }
}
