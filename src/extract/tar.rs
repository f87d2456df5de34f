use std::path::Path;

use anyhow::{Context, Result};
use async_compression::tokio::bufread::{BzDecoder, GzipDecoder, XzDecoder};
use log::{debug, warn};
use tokio::{
    fs::File,
    io::{AsyncRead, AsyncReadExt, AsyncSeekExt, BufReader},
};
use tokio_stream::StreamExt;
use tokio_tar::Archive;

use super::Compression;

pub async fn extract_tar(archive_path: &Path, dest: &Path) -> Result<()> {
    let mut file = File::open(archive_path)
        .await
        .context("Failed to open downloaded archive")?;

    let compression = sniff_compression(&mut file).await?;

    debug!("Extracting tarball with compression: {compression:?}");

    let reader = BufReader::new(file);

    let reader: Box<dyn AsyncRead + Unpin + Send> = match compression {
        Compression::Gzip => Box::new(GzipDecoder::new(reader)),
        Compression::Bzip2 => Box::new(BzDecoder::new(reader)),
        Compression::Xz => Box::new(XzDecoder::new(reader)),
        Compression::None => Box::new(reader),
    };

    let mut archive = Archive::new(reader);

    let mut entries = archive
        .entries()
        .context("Failed to get entries from tarball")?;

    while let Some(entry) = entries.next().await {
        let mut entry = entry.context("Failed to read entry from tarball archive")?;

        let unpacked = entry
            .unpack_in(dest)
            .await
            .context("Failed to extract entry from tarball archive")?;

        if !unpacked {
            warn!(
                "> Ignoring entry outside of the archive's root: {}",
                entry.path()?.display()
            );
        }
    }

    Ok(())
}

async fn sniff_compression(file: &mut File) -> Result<Compression> {
    let mut magic = [0; 6];
    let mut read = 0;

    while read < magic.len() {
        let count = file
            .read(&mut magic[read..])
            .await
            .context("Failed to read archive header")?;

        if count == 0 {
            break;
        }

        read += count;
    }

    file.rewind().await.context("Failed to rewind archive")?;

    Ok(Compression::sniff(&magic[..read]))
}
