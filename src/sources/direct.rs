use std::borrow::Cow;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{
    http::Http,
    platform::Platform,
    utils::url_basename,
    validator::{validate_file_name, validate_name, validate_url},
};

use super::{LinkSource, LinkTarget};

/// A single executable file served at a fixed URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlSource {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
}

impl UrlSource {
    pub fn validate(&self, errors: &mut Vec<String>) {
        validate_url(&self.url, "URL", errors);

        match &self.rename {
            Some(rename) => validate_name(rename, "Renamed executable", errors),
            None => validate_file_name(url_basename(&self.url), "File name of URL", errors),
        }
    }
}

/// A script committed in a GitHub repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubScriptSource {
    pub user: String,
    pub project: String,
    /// Defaults to a file named after the project at the repository's root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default = "default_branch")]
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
}

pub(super) fn default_branch() -> String {
    "master".to_owned()
}

impl GithubScriptSource {
    pub fn url(&self, http: &Http) -> String {
        let Self {
            user,
            project,
            path,
            tag,
            rename: _,
        } = self;

        let path = path.as_deref().unwrap_or(project);

        format!("{}/{user}/{project}/{tag}/{path}", http.raw_github_url())
    }

    pub fn validate(&self, errors: &mut Vec<String>) {
        validate_name(&self.user, "GitHub user name", errors);
        validate_name(&self.project, "GitHub project name", errors);

        if let Some(rename) = &self.rename {
            validate_name(rename, "Renamed executable", errors);
        }
    }
}

/// An archive served at a fixed URL, containing the executable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSource {
    /// May contain `{os}` and `{arch}` placeholders
    pub package_url: String,
    pub executable_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
}

impl PackageSource {
    pub fn url(&self, platform: &Platform) -> String {
        self.package_url
            .replace("{os}", &platform.os.to_string())
            .replace("{arch}", &platform.arch)
    }

    pub fn validate(&self, errors: &mut Vec<String>) {
        validate_url(&self.package_url, "Package URL", errors);
        validate_name(&self.executable_name, "Executable name", errors);

        if let Some(package_name) = &self.package_name {
            validate_file_name(package_name, "Package name", errors);
        }

        if let Some(rename) = &self.rename {
            validate_name(rename, "Renamed executable", errors);
        }
    }
}

/// A fixed list of downloads, one per supported platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinksSource {
    pub links: Vec<String>,
    pub binary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
}

impl LinksSource {
    pub fn validate(&self, errors: &mut Vec<String>) {
        if self.links.is_empty() {
            errors.push("Links list is empty".to_owned());
        }

        for link in &self.links {
            validate_url(link, "Link", errors);
        }

        validate_target(&self.target(), errors);
    }
}

impl LinkSource for LinksSource {
    fn target(&self) -> LinkTarget<'_> {
        LinkTarget {
            binary: &self.binary,
            package_name: self.package_name.as_deref().map(Cow::Borrowed),
            rename: self.rename.as_deref(),
        }
    }

    async fn links(&self, _: &Http) -> Result<Vec<String>> {
        Ok(self.links.clone())
    }
}

pub(super) fn validate_target(target: &LinkTarget, errors: &mut Vec<String>) {
    validate_name(target.binary, "Binary name", errors);

    if let Some(package_name) = &target.package_name {
        validate_file_name(package_name, "Package name", errors);
    }

    if let Some(rename) = target.rename {
        validate_name(rename, "Renamed executable", errors);
    }
}
