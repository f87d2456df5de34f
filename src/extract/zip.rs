use std::path::Path;

use anyhow::{Context, Result};
use async_zip::tokio::read::fs::ZipFileReader;
use log::warn;
use tokio::fs::{self, File};
use tokio_util::compat::FuturesAsyncReadCompatExt;

use super::enclosed_path;

pub async fn extract_zip(archive_path: &Path, dest: &Path) -> Result<()> {
    let zip = ZipFileReader::new(archive_path)
        .await
        .context("Failed to open ZIP archive")?;

    let entries = zip
        .file()
        .entries()
        .iter()
        .map(|entry| -> Result<(String, bool)> {
            let name = entry
                .filename()
                .as_str()
                .context("Failed to decode entry name from ZIP archive")?;

            Ok((name.to_owned(), entry.dir()?))
        })
        .collect::<Result<Vec<_>>>()?;

    for (index, (name, is_dir)) in entries.into_iter().enumerate() {
        let Some(path) = enclosed_path(&name) else {
            warn!("> Ignoring entry outside of the archive's root: {name}");
            continue;
        };

        let path = dest.join(path);

        if is_dir {
            fs::create_dir_all(&path)
                .await
                .with_context(|| format!("Failed to create directory '{name}'"))?;

            continue;
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create parent directory of '{name}'"))?;
        }

        let reader = zip
            .reader_without_entry(index)
            .await
            .with_context(|| format!("Failed to read entry '{name}' from ZIP archive"))?
            .compat();

        tokio::pin!(reader);

        let mut out_file = File::create(&path)
            .await
            .with_context(|| format!("Failed to create file '{name}'"))?;

        tokio::io::copy(&mut reader, &mut out_file)
            .await
            .with_context(|| format!("Failed to extract file '{name}'"))?;
    }

    Ok(())
}
