use std::borrow::Cow;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::http::Http;

use self::{
    direct::{GithubScriptSource, LinksSource, PackageSource, UrlSource},
    git::GitProjectSource,
    github::GithubReleaseSource,
    manifest::JsonManifestSource,
    scraped::ScrapedPageSource,
};

pub mod direct;
pub mod git;
pub mod github;
pub mod manifest;
pub mod pattern;
pub mod scraped;

/// Where a tool comes from and how to turn it into an executable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub enum SourceSpec {
    Url(UrlSource),
    GithubScript(GithubScriptSource),
    Package(PackageSource),
    Links(LinksSource),
    ScrapedPage(ScrapedPageSource),
    GithubRelease(GithubReleaseSource),
    JsonManifest(JsonManifestSource),
    GitProject(GitProjectSource),
}

impl SourceSpec {
    pub fn class(&self) -> &'static str {
        match self {
            Self::Url(_) => "Url",
            Self::GithubScript(_) => "GithubScript",
            Self::Package(_) => "Package",
            Self::Links(_) => "Links",
            Self::ScrapedPage(_) => "ScrapedPage",
            Self::GithubRelease(_) => "GithubRelease",
            Self::JsonManifest(_) => "JsonManifest",
            Self::GitProject(_) => "GitProject",
        }
    }

    /// Human-readable origin, used when listing tools
    pub fn origin(&self) -> String {
        match self {
            Self::Url(src) => src.url.clone(),
            Self::GithubScript(src) => format!("{}/{} ({})", src.user, src.project, src.tag),
            Self::Package(src) => src.package_url.clone(),
            Self::Links(src) => format!("{} link(s)", src.links.len()),
            Self::ScrapedPage(src) => src.page_url.clone(),
            Self::GithubRelease(src) => format!("{}/{} ({})", src.user, src.project, src.tag),
            Self::JsonManifest(src) => src.manifest_url.clone(),
            Self::GitProject(src) => src.git_url.clone(),
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = vec![];

        match self {
            Self::Url(src) => src.validate(&mut errors),
            Self::GithubScript(src) => src.validate(&mut errors),
            Self::Package(src) => src.validate(&mut errors),
            Self::Links(src) => src.validate(&mut errors),
            Self::ScrapedPage(src) => src.validate(&mut errors),
            Self::GithubRelease(src) => src.validate(&mut errors),
            Self::JsonManifest(src) => src.validate(&mut errors),
            Self::GitProject(src) => src.validate(&mut errors),
        }

        errors
    }
}

/// Sources that list candidate downloads, one of which gets picked for the host
#[allow(async_fn_in_trait)]
pub trait LinkSource {
    fn target(&self) -> LinkTarget<'_>;

    async fn links(&self, http: &Http) -> Result<Vec<String>>;
}

/// What to look for in the picked download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget<'a> {
    pub binary: &'a str,
    pub package_name: Option<Cow<'a, str>>,
    pub rename: Option<&'a str>,
}

impl LinkTarget<'_> {
    /// Name of the entry in the bin directory
    pub fn exposed_name(&self) -> &str {
        self.rename.unwrap_or(self.binary)
    }
}
