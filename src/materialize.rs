use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use log::{debug, error, info, warn};
use tokio::fs;

use crate::{
    error::ResolveError,
    extract::extract_archive,
    http::Http,
    paths::InstallDirs,
    utils::{make_executable, move_file, read_dir_tree, url_basename},
};

/// Turns downloads into executables available in the bin directory
pub struct Materializer<'a> {
    dirs: &'a InstallDirs,
    http: &'a Http,
}

impl<'a> Materializer<'a> {
    pub fn new(dirs: &'a InstallDirs, http: &'a Http) -> Self {
        Self { dirs, http }
    }

    /// Download a single file straight into the bin directory
    pub async fn executable_from_url(&self, url: &str, rename: Option<&str>) -> Result<PathBuf> {
        let name = rename.unwrap_or_else(|| url_basename(url));

        if matches!(name, "" | "." | "..") {
            bail!("Cannot derive an executable name from URL {url}, a rename is required");
        }

        let path = self.dirs.bin_dir.join(name);

        if !fs::try_exists(&path).await? {
            self.dirs.ensure_bin_dir().await?;

            let tmp_dir = self.dirs.temp_dir().await?;
            let download_path = tmp_dir.path().join(name);

            self.http.download(url, &download_path).await?;

            move_file(&download_path, &path).await.with_context(|| {
                format!("Failed to move downloaded file to: {}", path.display())
            })?;

            info!("Installed {name} at {}", path.display());
        }

        make_executable(&path).await?;

        Ok(path)
    }

    /// Download and extract an archive into the package directory, then publish one of its files
    pub async fn executable_from_package(
        &self,
        url: &str,
        executable_name: &str,
        package_name: Option<&str>,
        rename: Option<&str>,
    ) -> Result<PathBuf> {
        let package_path = self
            .dirs
            .package_dir
            .join(package_name.unwrap_or_else(|| url_basename(url)));

        let executable = match find_executable(&package_path, executable_name)? {
            Some(executable) => executable,
            None => {
                self.fetch_package(url, &package_path).await?;

                find_executable(&package_path, executable_name)?.ok_or_else(|| {
                    error!(
                        "Executable '{executable_name}' not found in {}",
                        package_path.display()
                    );

                    ResolveError::ExecutableNotFound {
                        executable: executable_name.to_owned(),
                        package_dir: package_path.clone(),
                    }
                })?
            }
        };

        make_executable(&executable).await?;

        self.publish(&executable, rename.unwrap_or(executable_name))
            .await
    }

    async fn fetch_package(&self, url: &str, package_path: &Path) -> Result<()> {
        let tmp_dir = self.dirs.temp_dir().await?;

        let archive = tmp_dir.path().join(url_basename(url));
        self.http.download(url, &archive).await?;

        let extraction_dir = tmp_dir.path().join("package");

        extract_archive(&archive, &extraction_dir)
            .await
            .with_context(|| format!("Failed to extract archive downloaded from {url}"))?;

        if fs::try_exists(package_path).await? {
            warn!(
                "Replacing package directory without the expected executable: {}",
                package_path.display()
            );

            fs::remove_dir_all(package_path).await.with_context(|| {
                format!(
                    "Failed to remove stale package directory: {}",
                    package_path.display()
                )
            })?;
        }

        self.dirs.ensure_package_dir().await?;

        fs::rename(&extraction_dir, package_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to move extracted package to: {}",
                    package_path.display()
                )
            })?;

        info!("Installed package at {}", package_path.display());

        Ok(())
    }

    /// Expose an executable in the bin directory, leaving user-placed files untouched
    pub async fn publish(&self, executable: &Path, link_name: &str) -> Result<PathBuf> {
        self.dirs.ensure_bin_dir().await?;

        let link = self.dirs.bin_dir.join(link_name);

        match fs::symlink_metadata(&link).await {
            Ok(metadata) if !metadata.file_type().is_symlink() => {
                info!(
                    "File is already in {} with name {link_name}, leaving it untouched",
                    self.dirs.bin_dir.display()
                );

                return Ok(executable.to_owned());
            }

            Ok(_) => {
                let current = fs::canonicalize(&link).await.ok();
                let target = fs::canonicalize(executable).await.with_context(|| {
                    format!("Failed to resolve path: {}", executable.display())
                })?;

                if current.as_deref() == Some(target.as_path()) {
                    return Ok(link);
                }

                debug!("Replacing outdated link: {}", link.display());

                fs::remove_file(&link)
                    .await
                    .with_context(|| format!("Failed to remove link: {}", link.display()))?;
            }

            Err(err) if err.kind() == ErrorKind::NotFound => {}

            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to inspect path: {}", link.display()))
            }
        }

        create_link(executable, &link).await?;

        Ok(link)
    }
}

#[cfg(unix)]
async fn create_link(executable: &Path, link: &Path) -> Result<()> {
    fs::symlink(executable, link).await.with_context(|| {
        format!(
            "Failed to link '{}' to '{}'",
            link.display(),
            executable.display()
        )
    })
}

#[cfg(not(unix))]
async fn create_link(executable: &Path, link: &Path) -> Result<()> {
    fs::copy(executable, link).await.with_context(|| {
        format!(
            "Failed to copy '{}' to '{}'",
            executable.display(),
            link.display()
        )
    })?;

    Ok(())
}

/// Regular file named `executable_name` in a package, or else the first whose name starts with it
pub fn find_executable(package_dir: &Path, executable_name: &str) -> Result<Option<PathBuf>> {
    if !package_dir.is_dir() {
        return Ok(None);
    }

    let files = read_dir_tree(package_dir)?;

    let name_of = |path: &Path| {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    };

    let found = files
        .iter()
        .find(|path| name_of(path) == executable_name)
        .or_else(|| {
            files
                .iter()
                .find(|path| name_of(path).starts_with(executable_name))
        });

    Ok(found.cloned())
}
