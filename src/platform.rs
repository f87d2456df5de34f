use std::{fmt, sync::LazyLock};

use serde::{Deserialize, Serialize};

/// Operating system family, as far as release filenames are concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Darwin,
    Linux,
    Windows,
    Other,
}

impl OsFamily {
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "darwin" | "macos" | "ios" => Self::Darwin,
            "linux" => Self::Linux,
            "windows" => Self::Windows,
            _ => Self::Other,
        }
    }

    /// Pattern matched against lowercased filenames built for this OS
    pub fn filename_pattern(self) -> Option<&'static str> {
        match self {
            Self::Darwin => Some("darwin|apple|macos|osx"),
            Self::Linux => Some(r"linux|\.deb"),
            Self::Windows => Some(r"windows|\.exe"),
            Self::Other => None,
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Darwin => write!(f, "darwin"),
            Self::Linux => write!(f, "linux"),
            Self::Windows => write!(f, "windows"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Host description used to pick release artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: OsFamily,
    pub arch: String,
}

static CURRENT_PLATFORM: LazyLock<Platform> = LazyLock::new(Platform::detect);

impl Platform {
    pub fn new(os: OsFamily, arch: impl Into<String>) -> Self {
        let arch = arch.into().to_lowercase();

        // Apple names its 64-bit ARM targets 'arm64' in release filenames
        let arch = if os == OsFamily::Darwin && arch == "aarch64" {
            "arm64".to_owned()
        } else {
            arch
        };

        Self { os, arch }
    }

    /// Platform of the running process, computed once
    pub fn current() -> &'static Platform {
        &CURRENT_PLATFORM
    }

    fn detect() -> Self {
        Self::new(
            OsFamily::parse(std::env::consts::OS),
            std::env::consts::ARCH,
        )
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}
