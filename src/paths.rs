use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tokio::fs;

pub const BIN_DIR_ENV: &str = "TOOL_INSTALLER_BIN_DIR";
pub const PACKAGE_DIR_ENV: &str = "TOOL_INSTALLER_PACKAGE_DIR";
pub const GIT_PROJECT_DIR_ENV: &str = "TOOL_INSTALLER_GIT_PROJECT_DIR";

/// Directories tools are installed into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallDirs {
    /// Executables (or links to them) exposed to the user
    pub bin_dir: PathBuf,
    /// Extracted archives, one directory per package
    pub package_dir: PathBuf,
    /// Cloned git repositories
    pub git_project_dir: PathBuf,
}

impl InstallDirs {
    pub fn new(bin_dir: PathBuf, package_dir: PathBuf, git_project_dir: PathBuf) -> Self {
        Self {
            bin_dir,
            package_dir,
            git_project_dir,
        }
    }

    pub fn from_env() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Failed to determine path to home directory")?;
        Self::from_lookup(&home_dir, |var| std::env::var_os(var))
    }

    fn from_lookup(home_dir: &Path, lookup: impl Fn(&str) -> Option<OsString>) -> Result<Self> {
        let dir = |var: &str, default: &[&str]| -> Result<PathBuf> {
            let path = match lookup(var).filter(|value| !value.is_empty()) {
                Some(value) => PathBuf::from(value),
                None => default.iter().fold(home_dir.to_owned(), |path, segment| path.join(segment)),
            };

            std::path::absolute(&path)
                .with_context(|| format!("Failed to make path absolute: {}", path.display()))
        };

        Ok(Self {
            bin_dir: dir(BIN_DIR_ENV, &[".local", "bin"])?,
            package_dir: dir(PACKAGE_DIR_ENV, &["opt", "packages"])?,
            git_project_dir: dir(GIT_PROJECT_DIR_ENV, &["opt", "git_projects"])?,
        })
    }

    /// Downloads and extractions happen below this directory, so that they can be renamed into place
    pub fn temp_root(&self) -> PathBuf {
        self.package_dir.join(".tmp")
    }

    pub async fn ensure_bin_dir(&self) -> Result<()> {
        ensure_dir(&self.bin_dir, "binaries").await
    }

    pub async fn ensure_package_dir(&self) -> Result<()> {
        ensure_dir(&self.package_dir, "packages").await
    }

    /// Fresh temporary directory, removed when dropped
    pub async fn temp_dir(&self) -> Result<TempDir> {
        let temp_root = self.temp_root();

        ensure_dir(&temp_root, "temporary").await?;

        tempfile::Builder::new()
            .prefix("download-")
            .tempdir_in(&temp_root)
            .with_context(|| {
                format!(
                    "Failed to create a temporary directory in: {}",
                    temp_root.display()
                )
            })
    }
}

async fn ensure_dir(dir: &Path, what: &str) -> Result<()> {
    if !fs::try_exists(dir).await.with_context(|| {
        format!(
            "Failed to check if {what} directory exists at path: {}",
            dir.display()
        )
    })? {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {what} directory at: {}", dir.display()))?;
    }

    Ok(())
}

/// Location of the user's tool definitions when not provided on the command line
pub fn default_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().context("Failed to determine path to home directory")?;

    Ok(home_dir.join(".config").join("runtool").join("config.yaml"))
}
