use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::debug;

/// Regular files below a directory, depth-first, each directory's entries sorted by name.
/// Symbolic links are never followed nor listed.
pub fn read_dir_tree(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory '{}'", dir.display()))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to list content of directory '{}'", dir.display()))?;

    entries.sort();

    let mut out = vec![];

    for path in entries {
        if path.is_symlink() {
            debug!("> Ignoring symbolic link '{}'", path.display());
        } else if path.is_dir() {
            out.extend(read_dir_tree(&path)?);
        } else if path.is_file() {
            out.push(path);
        } else {
            debug!("> Ignoring special file '{}'", path.display());
        }
    }

    Ok(out)
}

/// Add the owner's execute permission, keeping the other mode bits
pub async fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("Failed to get metadata of '{}'", path.display()))?
            .permissions();

        perms.set_mode(perms.mode() | 0o100);

        tokio::fs::set_permissions(path, perms)
            .await
            .with_context(|| format!("Failed to make '{}' executable", path.display()))?;
    }

    #[cfg(not(unix))]
    {
        let _ = path;
    }

    Ok(())
}

/// Move a file, copying it when source and destination are on different filesystems
pub async fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Err(err) = tokio::fs::rename(from, to).await {
        debug!("Failed to rename '{}' ({err}), copying it instead", from.display());
    } else {
        return Ok(());
    }

    tokio::fs::copy(from, to).await.with_context(|| {
        format!(
            "Failed to copy '{}' to '{}'",
            from.display(),
            to.display()
        )
    })?;

    tokio::fs::remove_file(from)
        .await
        .with_context(|| format!("Failed to remove '{}'", from.display()))
}

/// Last path segment of a URL, without query or fragment
pub fn url_basename(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}
