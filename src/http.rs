use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use reqwest::{header, Client, Response};
use tokio::{fs::File, io::AsyncWriteExt};

use crate::error::ResolveError;

pub const GITHUB_URL: &str = "https://github.com";
pub const RAW_GITHUB_URL: &str = "https://raw.githubusercontent.com";

static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP client used for every page, API and artifact fetch
#[derive(Debug, Clone)]
pub struct Http {
    client: Client,
    github_url: String,
    raw_github_url: String,
}

impl Http {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build the HTTP client")?;

        Ok(Self {
            client,
            github_url: GITHUB_URL.to_owned(),
            raw_github_url: RAW_GITHUB_URL.to_owned(),
        })
    }

    /// Point GitHub requests to another host (e.g. a mirror)
    pub fn with_github_urls(
        mut self,
        github_url: impl Into<String>,
        raw_github_url: impl Into<String>,
    ) -> Self {
        self.github_url = github_url.into().trim_end_matches('/').to_owned();
        self.raw_github_url = raw_github_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn github_url(&self) -> &str {
        &self.github_url
    }

    pub fn raw_github_url(&self) -> &str {
        &self.raw_github_url
    }

    pub async fn get_text(&self, url: &str) -> Result<String> {
        debug!("Fetching: {url}");

        let res = self.get(url).await?;

        res.text()
            .await
            .map_err(|source| ResolveError::Network {
                url: url.to_owned(),
                source,
            })
            .with_context(|| format!("Failed to read response body as text from: {url}"))
    }

    /// Stream the content at `url` into a new file at `dest`
    pub async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        info!("Downloading: {url}");

        let mut res = self.get(url).await?;

        let mut file = File::create(dest)
            .await
            .with_context(|| format!("Failed to create download file at: {}", dest.display()))?;

        while let Some(chunk) = res.chunk().await.map_err(|source| ResolveError::Network {
            url: url.to_owned(),
            source,
        })? {
            file.write_all(&chunk)
                .await
                .context("Failed to write chunk to disk")?;
        }

        file.flush().await?;

        Ok(())
    }

    async fn get(&self, url: &str) -> Result<Response> {
        let res = self
            .client
            .get(url)
            .header(header::ACCEPT, "*/*")
            .send()
            .await
            .map_err(|source| ResolveError::Network {
                url: url.to_owned(),
                source,
            })?;

        let status = res.status();

        if !status.is_success() {
            return Err(ResolveError::HttpStatus {
                url: url.to_owned(),
                status,
            }
            .into());
        }

        Ok(res)
    }
}
