use std::sync::LazyLock;

use dialoguer::Select;
use log::{debug, warn};
use regex::Regex;

use crate::platform::{OsFamily, Platform};

static NOISE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.txt|license|\.md|\.sha256|\.sha256sum|checksums|\.asc|\.sig|src").unwrap()
});

static SYSTEMS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let patterns = [OsFamily::Darwin, OsFamily::Linux, OsFamily::Windows]
        .into_iter()
        .filter_map(OsFamily::filename_pattern)
        .collect::<Vec<_>>();

    Regex::new(&patterns.join("|")).unwrap()
});

/// Settles a selection the filters could not narrow down to a single link
pub trait Chooser {
    /// Index of the chosen option, or `None` to fall back to the default pick
    fn choose(&self, options: &[String]) -> Option<usize>;
}

/// Never chooses, so the longest link always wins
pub struct LongestName;

impl Chooser for LongestName {
    fn choose(&self, _: &[String]) -> Option<usize> {
        None
    }
}

/// Asks the user on the terminal
pub struct PromptChooser;

impl Chooser for PromptChooser {
    fn choose(&self, options: &[String]) -> Option<usize> {
        let result = Select::new()
            .with_prompt("Please select one of the following downloads")
            .items(options)
            .default(0)
            .interact_opt();

        match result {
            Ok(choice) => choice,
            Err(err) => {
                warn!("Failed to prompt for a download choice: {err}");
                None
            }
        }
    }
}

/// Pick the link the most likely to work on the provided platform
pub fn select_best_link(
    links: &[String],
    platform: &Platform,
    chooser: &dyn Chooser,
) -> Option<String> {
    match links {
        [] => return None,
        [link] => return Some(link.clone()),
        _ => {}
    }

    let links = narrow_links(links, platform);

    if let [link] = links.as_slice() {
        return Some(link.clone());
    }

    if let Some(link) = chooser.choose(&links).and_then(|idx| links.get(idx)) {
        return Some(link.clone());
    }

    // Longest is usually the most qualified filename (e.g. 'x86_64-unknown-linux-musl')
    // NOTE: `max_by_key` returns the last maximum, which keeps ties deterministic
    links.into_iter().max_by_key(String::len)
}

/// Apply all filters in order. Each filter is skipped when it would discard every link.
pub fn narrow_links(links: &[String], platform: &Platform) -> Vec<String> {
    let links = links.to_vec();

    if links.len() <= 1 {
        return links;
    }

    let links = narrow(links, "noise", |name| !NOISE_REGEX.is_match(name));

    let links = match platform.os.filename_pattern() {
        Some(pattern) => {
            let host = Regex::new(pattern).unwrap();

            // When the host's only matches are distribution packages (dropped below),
            // artifacts that don't name any system (e.g. 'tool_x86_64.tar.gz') are kept too
            let host_has_archive = links.iter().map(|link| file_name(link)).any(|name| {
                host.is_match(&name) && !name.ends_with(".deb") && !name.ends_with(".rpm")
            });

            narrow(links, "system", |name| {
                host.is_match(name) || (!host_has_archive && !SYSTEMS_REGEX.is_match(name))
            })
        }
        None => links,
    };

    let links = narrow(links, "rpm", |name| !name.ends_with(".rpm"));
    let links = narrow(links, "deb", |name| !name.ends_with(".deb"));

    let arch_regex = arch_regex(&platform.arch);
    let links = narrow(links, "arch", |name| arch_regex.is_match(name));

    let links = narrow(links, "musl", |name| name.contains("musl"));
    narrow(links, "armv7", |name| !name.contains("armv7"))
}

fn arch_regex(arch: &str) -> Regex {
    let pattern = match arch {
        // Node.js and others name it 'x64'
        "x86_64" => "x86_64|amd64|x86|x64",
        "arm64" => "arm64|arch64",
        "aarch64" => "aarch64|armv7l|armv7|arm64",
        other => other,
    };

    Regex::new(pattern).unwrap_or_else(|_| Regex::new(&regex::escape(pattern)).unwrap())
}

fn narrow(links: Vec<String>, filter: &str, keep: impl Fn(&str) -> bool) -> Vec<String> {
    if links.len() <= 1 {
        return links;
    }

    let kept = links
        .iter()
        .filter(|link| keep(&file_name(link)))
        .cloned()
        .collect::<Vec<_>>();

    if kept.is_empty() {
        debug!("Filter '{filter}' would discard every link, skipping it");
        links
    } else {
        debug!("Filter '{filter}' kept {} out of {} links", kept.len(), links.len());
        kept
    }
}

/// Lowercased last segment of a URL
pub fn file_name(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(links: &[&str]) -> Vec<String> {
        links.iter().map(|link| (*link).to_owned()).collect()
    }

    fn linux(arch: &str) -> Platform {
        Platform::new(OsFamily::Linux, arch)
    }

    fn best(list: &[&str], platform: &Platform) -> Option<String> {
        select_best_link(&links(list), platform, &LongestName)
    }

    struct PickFirst;

    impl Chooser for PickFirst {
        fn choose(&self, _: &[String]) -> Option<usize> {
            Some(0)
        }
    }

    #[test]
    fn empty_and_single_lists() {
        assert_eq!(best(&[], &linux("x86_64")), None);
        assert_eq!(
            best(&["tool-darwin-arm64.zip"], &linux("x86_64")).as_deref(),
            Some("tool-darwin-arm64.zip")
        );
    }

    #[test]
    fn picks_linux_amd64() {
        let picked = best(
            &[
                "tool-linux-amd64.tar.gz",
                "tool-darwin-amd64.tar.gz",
                "tool-windows-amd64.exe",
            ],
            &linux("x86_64"),
        );

        assert_eq!(picked.as_deref(), Some("tool-linux-amd64.tar.gz"));
    }

    #[test]
    fn drops_deb_packages() {
        let picked = best(&["tool_x86_64.deb", "tool_x86_64.tar.gz"], &linux("x86_64"));
        assert_eq!(picked.as_deref(), Some("tool_x86_64.tar.gz"));
    }

    #[test]
    fn unnamed_systems_are_dropped_when_the_host_has_archives() {
        let picked = best(
            &["tool-1.0-win-x64-portable.zip", "tool-1.0-linux-x64.tar.gz"],
            &linux("x86_64"),
        );

        assert_eq!(picked.as_deref(), Some("tool-1.0-linux-x64.tar.gz"));

        let narrowed = narrow_links(
            &links(&["tool-aix-x86_64.tar.gz", "tool-linux-x86_64.tar.gz", "tool.msi"]),
            &linux("x86_64"),
        );

        assert_eq!(narrowed, links(&["tool-linux-x86_64.tar.gz"]));
    }

    #[test]
    fn drops_rpm_packages() {
        let picked = best(
            &["tool-linux-x86_64.rpm", "tool-linux-x86_64.tar.gz"],
            &linux("x86_64"),
        );

        assert_eq!(picked.as_deref(), Some("tool-linux-x86_64.tar.gz"));
    }

    #[test]
    fn prefers_musl() {
        let picked = best(
            &[
                "https://example.com/dl/tool-x86_64-unknown-linux-gnu.tar.gz",
                "https://example.com/dl/tool-x86_64-unknown-linux-musl.tar.gz",
            ],
            &linux("x86_64"),
        );

        assert_eq!(
            picked.as_deref(),
            Some("https://example.com/dl/tool-x86_64-unknown-linux-musl.tar.gz")
        );
    }

    #[test]
    fn avoids_armv7() {
        let picked = best(
            &["tool-linux-armv7.tar.gz", "tool-linux-aarch64.tar.gz"],
            &linux("aarch64"),
        );

        assert_eq!(picked.as_deref(), Some("tool-linux-aarch64.tar.gz"));

        let picked = best(&["tool-armv7.tar.gz", "tool-aarch64.tar.gz"], &linux("aarch64"));
        assert_eq!(picked.as_deref(), Some("tool-aarch64.tar.gz"));
    }

    #[test]
    fn removes_noise_before_platform_filters() {
        let narrowed = narrow_links(
            &links(&["checksums.txt", "tool.tar.gz.sha256", "tool.tar.gz"]),
            &linux("x86_64"),
        );

        assert_eq!(narrowed, links(&["tool.tar.gz"]));
    }

    #[test]
    fn noise_filter_only_looks_at_file_names() {
        let narrowed = narrow_links(
            &links(&[
                "https://example.com/src/tool-linux-x86_64.tar.gz",
                "https://example.com/src/tool-src.tar.gz",
            ]),
            &linux("x86_64"),
        );

        assert_eq!(
            narrowed,
            links(&["https://example.com/src/tool-linux-x86_64.tar.gz"])
        );
    }

    #[test]
    fn never_empties_a_non_empty_list() {
        let inputs: &[&[&str]] = &[
            &["checksums.txt", "LICENSE.md"],
            &["tool.rpm", "tool.deb"],
            &["tool-freebsd-riscv.tar.gz", "tool-solaris-sparc.tar.gz"],
            &["a", "b", "c"],
        ];

        let platforms = [
            linux("x86_64"),
            linux("aarch64"),
            Platform::new(OsFamily::Darwin, "aarch64"),
            Platform::new(OsFamily::Windows, "x86_64"),
            Platform::new(OsFamily::Other, "s390x"),
            Platform::new(OsFamily::Other, "weird(arch"),
        ];

        for input in inputs {
            for platform in &platforms {
                assert!(!narrow_links(&links(input), platform).is_empty());
                assert!(best(input, platform).is_some());
            }
        }
    }

    #[test]
    fn ties_resolve_to_the_longest_name() {
        let list = ["tool-linux-x86_64.tar.gz", "tool-linux-x86_64-static.tar.gz"];

        for _ in 0..3 {
            assert_eq!(
                best(&list, &linux("x86_64")).as_deref(),
                Some("tool-linux-x86_64-static.tar.gz")
            );
        }

        // Equal lengths: the last one wins, whatever the input order
        assert_eq!(best(&["aaa-linux", "bbb-linux"], &linux("x86_64")).as_deref(), Some("bbb-linux"));
        assert_eq!(best(&["bbb-linux", "aaa-linux"], &linux("x86_64")).as_deref(), Some("aaa-linux"));
    }

    #[test]
    fn chooser_settles_ambiguous_selections() {
        let list = links(&["tool-linux-x86_64.tar.gz", "tool-linux-x86_64-static.tar.gz"]);

        assert_eq!(
            select_best_link(&list, &linux("x86_64"), &PickFirst).as_deref(),
            Some("tool-linux-x86_64.tar.gz")
        );
    }

    #[test]
    fn darwin_arm64_matches_apple_names() {
        let picked = best(
            &[
                "tool-aarch64-apple-darwin.tar.gz",
                "tool-x86_64-apple-darwin.tar.gz",
                "tool-aarch64-unknown-linux-gnu.tar.gz",
            ],
            &Platform::new(OsFamily::Darwin, "aarch64"),
        );

        assert_eq!(picked.as_deref(), Some("tool-aarch64-apple-darwin.tar.gz"));
    }

    #[test]
    fn x64_is_x86_64() {
        let picked = best(
            &[
                "https://nodejs.org/dist/latest/node-v22.9.0-headers.tar.gz",
                "https://nodejs.org/dist/latest/node-v22.9.0-linux-ppc64le.tar.gz",
                "https://nodejs.org/dist/latest/node-v22.9.0-linux-x64.tar.gz",
                "https://nodejs.org/dist/latest/node-v22.9.0-darwin-x64.tar.gz",
                "https://nodejs.org/dist/latest/node-v22.9.0-win-x64.zip",
            ],
            &linux("x86_64"),
        );

        assert_eq!(
            picked.as_deref(),
            Some("https://nodejs.org/dist/latest/node-v22.9.0-linux-x64.tar.gz")
        );
    }

    #[test]
    fn unknown_arch_is_used_literally() {
        let picked = best(
            &["tool-linux-s390x.tar.gz", "tool-linux-ppc64le.tar.gz"],
            &linux("s390x"),
        );

        assert_eq!(picked.as_deref(), Some("tool-linux-s390x.tar.gz"));
    }
}
