use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;

mod tar;
mod zip;

/// Compression of a tarball, detected from its first bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Bzip2,
    Xz,
    None,
}

impl Compression {
    pub fn sniff(magic: &[u8]) -> Self {
        if magic.starts_with(&[0x1f, 0x8b]) {
            Self::Gzip
        } else if magic.starts_with(b"BZh") {
            Self::Bzip2
        } else if magic.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            Self::Xz
        } else {
            Self::None
        }
    }
}

/// Extract a whole archive into `dest`, which is created if needed
pub async fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)
        .await
        .with_context(|| format!("Failed to create extraction directory '{}'", dest.display()))?;

    let is_zip = archive
        .file_name()
        .is_some_and(|name| name.to_string_lossy().to_lowercase().ends_with(".zip"));

    if is_zip {
        zip::extract_zip(archive, dest).await
    } else {
        tar::extract_tar(archive, dest).await
    }
}

/// Relative path of an archive entry, or `None` if it would land outside the extraction directory
fn enclosed_path(name: &str) -> Option<PathBuf> {
    let mut out = PathBuf::new();

    for component in Path::new(name).components() {
        match component {
            Component::CurDir => {}
            Component::Normal(str) => out.push(str),
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::Prefix(_) | Component::RootDir => return None,
        }
    }

    Some(out)
}
