use std::{path::Path, sync::Arc};

use anyhow::Result;
use log::debug;

use crate::{cache::ResolutionCache, install::Installer, registry::Registry, sources::SourceSpec};

/// Resolves tool names to executables, installing them on first use
pub struct ToolResolver {
    registry: Registry,
    installer: Installer,
    cache: ResolutionCache,
}

impl ToolResolver {
    pub fn new(registry: Registry, installer: Installer) -> Self {
        Self {
            registry,
            installer,
            cache: ResolutionCache::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn installer(&self) -> &Installer {
        &self.installer
    }

    /// Path to the tool's executable, installed if it isn't yet.
    /// Later calls for the same tool return the same path without touching the network.
    pub async fn get_executable(&self, name: &str) -> Result<Arc<Path>> {
        let spec = self.spec(name)?;

        self.cache
            .get_or_try_resolve(name, || async {
                let path = self.installer.install(name, spec).await?;
                debug!("Resolved tool '{name}' to {}", path.display());
                Ok(Arc::from(path))
            })
            .await
    }

    /// Where the tool currently is, without installing it
    pub fn installed_path(&self, name: &str) -> Result<Option<Arc<Path>>> {
        if let Some(path) = self.cache.cached(name) {
            return Ok(Some(path));
        }

        let spec = self.spec(name)?;

        Ok(self.installer.installed_path(spec).map(Arc::from))
    }

    pub async fn save_registry(&self) -> Result<()> {
        self.registry.save().await
    }

    fn spec(&self, name: &str) -> Result<&SourceSpec> {
        self.registry
            .get(name)
            .ok_or_else(|| self.registry.not_found(name).into())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use httpmock::prelude::*;
    use tempfile::TempDir;

    use crate::{
        error::ResolveError,
        http::Http,
        paths::InstallDirs,
        platform::{OsFamily, Platform},
        sources::{direct::UrlSource, github::GithubReleaseSource},
    };

    use super::*;

    fn new_resolver(root: &Path, http: Http, tools: Vec<(&str, SourceSpec)>) -> ToolResolver {
        let mut registry = Registry::builtin(root.join("config.yaml"));

        for (name, spec) in tools {
            registry.insert(name.to_owned(), spec);
        }

        let dirs = InstallDirs::new(
            root.join("bin"),
            root.join("packages"),
            root.join("git_projects"),
        );

        let installer =
            Installer::new(dirs, http).with_platform(Platform::new(OsFamily::Linux, "x86_64"));

        ToolResolver::new(registry, installer)
    }

    #[tokio::test]
    async fn resolution_is_idempotent() {
        let server = MockServer::start_async().await;

        let page = server
            .mock_async(|when, then| {
                when.method(GET).path("/me/mytool/releases/latest");
                then.status(200).body(
                    r#"
                    <a href="/me/mytool/releases/download/v1/mytool-linux-amd64">linux</a>
                    <a href="/me/mytool/releases/download/v1/mytool-darwin-arm64">darwin</a>
                    <a href="/me/mytool/releases/download/v1/checksums.txt">checksums</a>
                "#,
                );
            })
            .await;

        let binary = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/me/mytool/releases/download/v1/mytool-linux-amd64");
                then.status(200).body("#!/bin/sh\necho mytool\n");
            })
            .await;

        let tmp_dir = TempDir::new().unwrap();
        let http = Http::new()
            .unwrap()
            .with_github_urls(server.base_url(), server.base_url());

        let spec = SourceSpec::GithubRelease(GithubReleaseSource {
            user: "me".to_owned(),
            project: "mytool".to_owned(),
            tag: "latest".to_owned(),
            binary: None,
            rename: None,
        });

        let resolver = new_resolver(tmp_dir.path(), http.clone(), vec![("mytool", spec.clone())]);

        let first = resolver.get_executable("mytool").await.unwrap();
        let second = resolver.get_executable("mytool").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(&*first, tmp_dir.path().join("bin").join("mytool"));

        // A new process finds the tool already installed
        let other = new_resolver(tmp_dir.path(), http, vec![("mytool", spec)]);
        assert_eq!(other.installed_path("mytool").unwrap().as_deref(), Some(&*first));
        assert_eq!(other.get_executable("mytool").await.unwrap(), first);

        page.assert_calls_async(1).await;
        binary.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn unknown_tools_are_reported_with_a_suggestion() {
        let tmp_dir = TempDir::new().unwrap();
        let resolver = new_resolver(tmp_dir.path(), Http::new().unwrap(), vec![]);

        let err = resolver.get_executable("lazygti").await.unwrap_err();

        match err.downcast_ref::<ResolveError>() {
            Some(ResolveError::ToolNotFound { name, suggestion }) => {
                assert_eq!(name, "lazygti");
                assert_eq!(suggestion.as_deref(), Some("lazygit"));
            }
            _ => panic!("unexpected error: {err:?}"),
        }
    }

    #[tokio::test]
    async fn failed_resolutions_can_be_retried() {
        let server = MockServer::start_async().await;

        let mut failing = server
            .mock_async(|when, then| {
                when.method(GET).path("/tool");
                then.status(500);
            })
            .await;

        let tmp_dir = TempDir::new().unwrap();

        let spec = SourceSpec::Url(UrlSource {
            url: server.url("/tool"),
            rename: None,
        });

        let resolver = new_resolver(tmp_dir.path(), Http::new().unwrap(), vec![("tool", spec)]);

        assert!(resolver.get_executable("tool").await.is_err());
        assert_eq!(resolver.installed_path("tool").unwrap(), None);

        failing.delete_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/tool");
                then.status(200).body("#!/bin/sh\n");
            })
            .await;

        let path = resolver.get_executable("tool").await.unwrap();
        assert_eq!(&*path, tmp_dir.path().join("bin").join("tool"));
        assert!(PathBuf::from(&*path).exists());
    }
}
