use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::{fs, process::Command};

use crate::{utils::make_executable, validator::validate_git_url};

use super::direct::default_branch;

/// An executable living in a git repository, cloned locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitProjectSource {
    pub git_url: String,
    /// Path of the executable inside the repository
    pub path: String,
    #[serde(default = "default_branch")]
    pub tag: String,
    /// Update the checkout every time the tool is resolved
    #[serde(default)]
    pub pull: bool,
}

impl GitProjectSource {
    pub fn checkout_dir(&self, git_project_dir: &Path) -> PathBuf {
        let url = self.git_url.trim_end_matches('/');
        git_project_dir.join(url.rsplit(['/', ':']).next().unwrap_or(url))
    }

    pub fn executable_path(&self, git_project_dir: &Path) -> PathBuf {
        self.checkout_dir(git_project_dir).join(&self.path)
    }

    /// Clone the repository if the executable is missing, pull it if asked to
    pub async fn checkout(&self, git_project_dir: &Path) -> Result<PathBuf> {
        let checkout_dir = self.checkout_dir(git_project_dir);
        let executable = self.executable_path(git_project_dir);

        if !executable.exists() {
            fs::create_dir_all(git_project_dir).await.with_context(|| {
                format!(
                    "Failed to create git projects directory at path: {}",
                    git_project_dir.display()
                )
            })?;

            info!("Cloning {} (branch {})...", self.git_url, self.tag);

            let status = Command::new("git")
                .arg("clone")
                .arg("-b")
                .arg(&self.tag)
                .arg(&self.git_url)
                .arg(&checkout_dir)
                .status()
                .await
                .context("Failed to run git")?;

            if !status.success() {
                bail!("Failed to clone {} ({status})", self.git_url);
            }
        } else if self.pull {
            let status = Command::new("git")
                .arg("-C")
                .arg(&checkout_dir)
                .arg("pull")
                .status()
                .await;

            match status {
                Ok(status) if status.success() => {}
                Ok(status) => warn!("Failed to update {} ({status})", checkout_dir.display()),
                Err(err) => warn!("Failed to run git: {err}"),
            }
        }

        make_executable(&executable).await?;

        Ok(executable)
    }

    pub fn validate(&self, errors: &mut Vec<String>) {
        validate_git_url(&self.git_url, "Git URL", errors);

        let path = Path::new(&self.path);

        if self.path.is_empty()
            || !path
                .components()
                .all(|component| matches!(component, Component::Normal(_)))
        {
            errors.push(format!(
                "Executable path {:?} must be relative to the repository root",
                self.path
            ));
        }
    }
}
