use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    error::ResolveError,
    http::Http,
    links::{file_name, select_best_link, Chooser, LongestName},
    materialize::{find_executable, Materializer},
    paths::InstallDirs,
    platform::Platform,
    sources::{LinkSource, SourceSpec},
    utils::url_basename,
};

/// Installs tools from their source definition
pub struct Installer {
    dirs: InstallDirs,
    http: Http,
    platform: Platform,
    chooser: Box<dyn Chooser + Send + Sync>,
}

impl Installer {
    pub fn new(dirs: InstallDirs, http: Http) -> Self {
        Self {
            dirs,
            http,
            platform: Platform::current().clone(),
            chooser: Box::new(LongestName),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_chooser(mut self, chooser: impl Chooser + Send + Sync + 'static) -> Self {
        self.chooser = Box::new(chooser);
        self
    }

    pub fn dirs(&self) -> &InstallDirs {
        &self.dirs
    }

    /// Where the tool's executable currently is, without installing anything
    pub fn installed_path(&self, spec: &SourceSpec) -> Option<PathBuf> {
        let in_bin_dir = |name: &str| {
            let path = self.dirs.bin_dir.join(name);
            path.exists().then_some(path)
        };

        match spec {
            SourceSpec::Url(src) => {
                in_bin_dir(src.rename.as_deref().unwrap_or_else(|| url_basename(&src.url)))
            }
            SourceSpec::GithubScript(src) => {
                let url = src.url(&self.http);
                in_bin_dir(src.rename.as_deref().unwrap_or_else(|| url_basename(&url)))
            }
            SourceSpec::Package(src) => src
                .rename
                .as_deref()
                .and_then(in_bin_dir)
                .or_else(|| in_bin_dir(&src.executable_name))
                .or_else(|| {
                    let url = src.url(&self.platform);
                    let package_name = src
                        .package_name
                        .as_deref()
                        .unwrap_or_else(|| url_basename(&url));

                    let package_path = self.dirs.package_dir.join(package_name);

                    find_executable(&package_path, &src.executable_name)
                        .ok()
                        .flatten()
                }),
            SourceSpec::Links(src) => in_bin_dir(src.target().exposed_name()),
            SourceSpec::ScrapedPage(src) => in_bin_dir(src.target().exposed_name()),
            SourceSpec::GithubRelease(src) => in_bin_dir(src.target().exposed_name()),
            SourceSpec::JsonManifest(src) => in_bin_dir(src.target().exposed_name()),
            SourceSpec::GitProject(src) => {
                let path = src.executable_path(&self.dirs.git_project_dir);
                path.exists().then_some(path)
            }
        }
    }

    /// Install the tool if needed, and return the path to its executable
    pub async fn install(&self, tool: &str, spec: &SourceSpec) -> Result<PathBuf> {
        debug!("Resolving tool '{tool}' from a {} source", spec.class());

        let materializer = Materializer::new(&self.dirs, &self.http);

        match spec {
            SourceSpec::Url(src) => {
                materializer
                    .executable_from_url(&src.url, src.rename.as_deref())
                    .await
            }

            SourceSpec::GithubScript(src) => {
                materializer
                    .executable_from_url(&src.url(&self.http), src.rename.as_deref())
                    .await
            }

            SourceSpec::Package(src) => {
                materializer
                    .executable_from_package(
                        &src.url(&self.platform),
                        &src.executable_name,
                        src.package_name.as_deref(),
                        src.rename.as_deref(),
                    )
                    .await
            }

            SourceSpec::Links(src) => self.install_best(tool, src, &materializer).await,
            SourceSpec::ScrapedPage(src) => self.install_best(tool, src, &materializer).await,
            SourceSpec::GithubRelease(src) => self.install_best(tool, src, &materializer).await,
            SourceSpec::JsonManifest(src) => self.install_best(tool, src, &materializer).await,

            SourceSpec::GitProject(src) => src.checkout(&self.dirs.git_project_dir).await,
        }
    }

    async fn install_best(
        &self,
        tool: &str,
        source: &impl LinkSource,
        materializer: &Materializer<'_>,
    ) -> Result<PathBuf> {
        let target = source.target();
        let exposed_name = target.exposed_name();

        let exposed = self.dirs.bin_dir.join(exposed_name);

        if exposed.exists() {
            debug!("Tool '{tool}' is already available at {}", exposed.display());
            return Ok(exposed);
        }

        let links = source
            .links(&self.http)
            .await
            .with_context(|| format!("Failed to list downloads for tool '{tool}'"))?;

        if links.is_empty() {
            return Err(ResolveError::NoCandidates {
                tool: tool.to_owned(),
            }
            .into());
        }

        let url = select_best_link(&links, &self.platform, self.chooser.as_ref()).ok_or_else(
            || ResolveError::NoSuitableLink {
                tool: tool.to_owned(),
            },
        )?;

        info!("Selected download for {tool}: {url}");

        if is_archive(&file_name(&url)) {
            materializer
                .executable_from_package(
                    &url,
                    target.binary,
                    target.package_name.as_deref(),
                    Some(exposed_name),
                )
                .await
        } else {
            materializer
                .executable_from_url(&url, Some(exposed_name))
                .await
        }
    }
}

fn is_archive(file_name: &str) -> bool {
    file_name.ends_with(".zip")
        || file_name.contains(".tar")
        || file_name.ends_with(".tgz")
        || file_name.ends_with(".tbz")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use async_compression::tokio::write::GzipEncoder;
    use httpmock::prelude::*;
    use tempfile::TempDir;
    use tokio::io::AsyncWriteExt;
    use tokio_tar::{Builder, Header};

    use crate::{
        platform::OsFamily,
        sources::direct::{LinksSource, UrlSource},
    };

    use super::*;

    fn installer(root: &std::path::Path) -> Installer {
        let dirs = InstallDirs::new(
            root.join("bin"),
            root.join("packages"),
            root.join("git_projects"),
        );

        Installer::new(dirs, Http::new().unwrap())
            .with_platform(Platform::new(OsFamily::Linux, "x86_64"))
    }

    async fn tar_gz(path: &str, content: &[u8]) -> Vec<u8> {
        let mut builder = Builder::new(Vec::new());

        let mut header = Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, content).await.unwrap();

        let tar = builder.into_inner().await.unwrap();

        let mut encoder = GzipEncoder::new(Vec::new());
        encoder.write_all(&tar).await.unwrap();
        encoder.shutdown().await.unwrap();
        encoder.into_inner()
    }

    #[test]
    fn detects_archives() {
        assert!(is_archive("tool-linux-amd64.tar.gz"));
        assert!(is_archive("tool.tgz"));
        assert!(is_archive("tool.zip"));
        assert!(is_archive("tool.tar"));
        assert!(!is_archive("tool-linux-amd64"));
        assert!(!is_archive("tool.exe"));
    }

    #[tokio::test]
    async fn installs_best_link_from_archive() {
        let server = MockServer::start_async().await;

        let body = tar_gz("tool-1.0/tool", b"#!/bin/sh\n").await;

        let archive = server
            .mock_async(|when, then| {
                when.method(GET).path("/tool-linux-amd64.tar.gz");
                then.status(200).body(body.clone());
            })
            .await;

        let tmp_dir = TempDir::new().unwrap();
        let installer = installer(tmp_dir.path());

        let spec = SourceSpec::Links(LinksSource {
            links: vec![
                server.url("/tool-darwin-amd64.tar.gz"),
                server.url("/tool-linux-amd64.tar.gz"),
                server.url("/checksums.txt"),
            ],
            binary: "tool".to_owned(),
            package_name: Some("tool".to_owned()),
            rename: None,
        });

        assert_eq!(installer.installed_path(&spec), None);

        let path = installer.install("tool", &spec).await.unwrap();
        assert_eq!(path, installer.dirs().bin_dir.join("tool"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "#!/bin/sh\n");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o100, 0o100);
        }

        // Second resolution doesn't hit the network
        installer.install("tool", &spec).await.unwrap();
        archive.assert_calls_async(1).await;

        assert_eq!(installer.installed_path(&spec), Some(path));
    }

    #[tokio::test]
    async fn empty_link_lists_are_reported() {
        let tmp_dir = TempDir::new().unwrap();

        let spec = SourceSpec::Links(LinksSource {
            links: vec![],
            binary: "tool".to_owned(),
            package_name: None,
            rename: None,
        });

        let err = installer(tmp_dir.path())
            .install("tool", &spec)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ResolveError>(),
            Some(ResolveError::NoCandidates { tool }) if tool == "tool"
        ));
    }

    #[tokio::test]
    async fn installs_plain_urls() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/repo");
                then.status(200).body("#!/usr/bin/env python3\n");
            })
            .await;

        let tmp_dir = TempDir::new().unwrap();
        let installer = installer(tmp_dir.path());

        let spec = SourceSpec::Url(UrlSource {
            url: server.url("/repo"),
            rename: Some("git-repo".to_owned()),
        });

        let path = installer.install("repo", &spec).await.unwrap();

        assert_eq!(path, installer.dirs().bin_dir.join("git-repo"));
        assert_eq!(installer.installed_path(&spec), Some(path));
    }
}
