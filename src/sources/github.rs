use std::{borrow::Cow, collections::HashSet};

use anyhow::{Context, Result};
use log::{debug, error, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{http::Http, validator::validate_name};

use super::{direct::validate_target, LinkSource, LinkTarget};

/// Assets of a GitHub release, scraped from the release page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubReleaseSource {
    pub user: String,
    pub project: String,
    #[serde(default = "default_release")]
    pub tag: String,
    /// Defaults to the project name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
}

fn default_release() -> String {
    "latest".to_owned()
}

impl GithubReleaseSource {
    pub fn release_url(&self, github_url: &str) -> String {
        let Self { user, project, .. } = self;

        if self.tag == "latest" {
            format!("{github_url}/{user}/{project}/releases/latest")
        } else {
            format!("{github_url}/{user}/{project}/releases/tag/{}", self.tag)
        }
    }

    pub fn validate(&self, errors: &mut Vec<String>) {
        validate_name(&self.user, "GitHub user name", errors);
        validate_name(&self.project, "GitHub project name", errors);
        validate_target(&self.target(), errors);
    }
}

impl LinkSource for GithubReleaseSource {
    fn target(&self) -> LinkTarget<'_> {
        LinkTarget {
            binary: self.binary.as_deref().unwrap_or(&self.project),
            package_name: Some(Cow::Owned(format!("{}_{}", self.user, self.project))),
            rename: self.rename.as_deref(),
        }
    }

    async fn links(&self, http: &Http) -> Result<Vec<String>> {
        let Self { user, project, .. } = self;

        let url = self.release_url(http.github_url());
        let html = http.get_text(&url).await?;

        let links = download_links(&html, http.github_url(), user, project)?;

        if !links.is_empty() {
            return Ok(links);
        }

        warn!("Assets of {user}/{project} are lazily loaded, fetching the expanded assets");

        let Some(assets_url) = expanded_assets_url(&html, http.github_url(), user, project)? else {
            error!("No expanded assets found in release page: {url}");
            return Ok(vec![]);
        };

        debug!("Found expanded assets at: {assets_url}");

        let html = http.get_text(&assets_url).await?;

        download_links(&html, http.github_url(), user, project)
    }
}

/// Absolute, deduplicated asset download links found in a release page (or fragment)
pub fn download_links(
    html: &str,
    github_url: &str,
    user: &str,
    project: &str,
) -> Result<Vec<String>> {
    let pattern = project_path_regex(user, project, "download")?;
    let mut seen = HashSet::new();

    Ok(pattern
        .find_iter(html)
        .map(|m| m.as_str())
        .filter(|path| seen.insert(*path))
        .map(|path| format!("{github_url}{path}"))
        .collect())
}

/// URL of the lazily-loaded assets fragment of a release page
pub fn expanded_assets_url(
    html: &str,
    github_url: &str,
    user: &str,
    project: &str,
) -> Result<Option<String>> {
    Ok(project_path_regex(user, project, "expanded_assets")?
        .find(html)
        .map(|m| format!("{github_url}{}", m.as_str())))
}

fn project_path_regex(user: &str, project: &str, kind: &str) -> Result<Regex> {
    let pattern = format!(
        r#"/{}/{}/releases/{kind}/[^"]+"#,
        regex::escape(user),
        regex::escape(project)
    );

    Regex::new(&pattern).with_context(|| format!("Failed to build link pattern {pattern:?}"))
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;

    fn fzf() -> GithubReleaseSource {
        GithubReleaseSource {
            user: "junegunn".to_owned(),
            project: "fzf".to_owned(),
            tag: default_release(),
            binary: None,
            rename: None,
        }
    }

    const FRAGMENT: &str = r#"
        <a href="/junegunn/fzf/releases/download/v0.55.0/fzf-0.55.0-linux_amd64.tar.gz">linux</a>
        <a href="/junegunn/fzf/releases/download/v0.55.0/fzf-0.55.0-darwin_arm64.tar.gz">darwin</a>
        <a href="/junegunn/fzf/releases/download/v0.55.0/fzf-0.55.0-linux_amd64.tar.gz">again</a>
        <a href="/junegunn/fzf/archive/refs/tags/v0.55.0.zip">sources</a>
    "#;

    #[test]
    fn extracts_deduplicated_links() {
        assert_eq!(
            download_links(FRAGMENT, "https://github.com", "junegunn", "fzf").unwrap(),
            [
                "https://github.com/junegunn/fzf/releases/download/v0.55.0/fzf-0.55.0-linux_amd64.tar.gz",
                "https://github.com/junegunn/fzf/releases/download/v0.55.0/fzf-0.55.0-darwin_arm64.tar.gz",
            ]
        );

        assert!(download_links(FRAGMENT, "https://github.com", "other", "fzf")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn builds_release_urls() {
        assert_eq!(
            fzf().release_url("https://github.com"),
            "https://github.com/junegunn/fzf/releases/latest"
        );

        let tagged = GithubReleaseSource {
            tag: "v0.55.0".to_owned(),
            ..fzf()
        };

        assert_eq!(
            tagged.release_url("https://github.com"),
            "https://github.com/junegunn/fzf/releases/tag/v0.55.0"
        );
    }

    #[test]
    fn target_defaults_to_project() {
        let release = fzf();
        let target = release.target();

        assert_eq!(target.binary, "fzf");
        assert_eq!(target.package_name.as_deref(), Some("junegunn_fzf"));
        assert_eq!(target.exposed_name(), "fzf");
    }

    #[tokio::test]
    async fn follows_expanded_assets_fragment() {
        let server = MockServer::start_async().await;

        let page = server
            .mock_async(|when, then| {
                when.method(GET).path("/junegunn/fzf/releases/latest");
                then.status(200).body(
                    r#"<include-fragment src="/junegunn/fzf/releases/expanded_assets/v0.55.0"></include-fragment>"#,
                );
            })
            .await;

        let fragment = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/junegunn/fzf/releases/expanded_assets/v0.55.0");
                then.status(200).body(FRAGMENT);
            })
            .await;

        let http = Http::new()
            .unwrap()
            .with_github_urls(server.base_url(), server.base_url());

        let links = fzf().links(&http).await.unwrap();

        assert_eq!(links.len(), 2);
        assert!(links[0].starts_with(&server.base_url()));
        page.assert_calls_async(1).await;
        fragment.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn missing_fragment_yields_no_links() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/junegunn/fzf/releases/latest");
                then.status(200).body("<html>nothing here</html>");
            })
            .await;

        let http = Http::new()
            .unwrap()
            .with_github_urls(server.base_url(), server.base_url());

        assert!(fzf().links(&http).await.unwrap().is_empty());
    }
}
