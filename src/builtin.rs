use std::collections::BTreeMap;

use regex::Regex;

use crate::sources::{
    direct::{GithubScriptSource, PackageSource, UrlSource},
    git::GitProjectSource,
    github::GithubReleaseSource,
    manifest::JsonManifestSource,
    pattern::Pattern,
    scraped::ScrapedPageSource,
    SourceSpec,
};

/// Tools available without any configuration
pub fn builtin_tools() -> BTreeMap<String, SourceSpec> {
    let mut tools = BTreeMap::new();

    let mut add = |name: &str, spec: SourceSpec| {
        tools.insert(name.to_owned(), spec);
    };

    add("theme.sh", github_script("lemnos", "theme.sh", Some("bin/theme.sh")));
    add("neofetch", github_script("dylanaraps", "neofetch", None));
    add("adb-sync", github_script("google", "adb-sync", None));
    add("bb", github_script("FlavioAmurrioCS", "dot", Some(".dot/bin/scripts/bb")));

    for (user, project, binary) in [
        ("linkedin", "shiv", None),
        ("junegunn", "fzf", None),
        ("microsoft", "ripgrep-prebuilt", Some("rg")),
        ("docker", "compose", Some("docker-compose")),
        ("dundee", "gdu", None),
        ("isacikgoz", "tldr", None),
        ("jesseduffield", "lazydocker", None),
        ("jesseduffield", "lazygit", None),
        ("jesseduffield", "lazynpm", None),
        ("koalaman", "shellcheck", None),
        ("sharkdp", "bat", None),
        ("sharkdp", "fd", None),
        ("dandavison", "delta", None),
        ("aristocratos", "btop", None),
        ("denoland", "deno", None),
        ("hadolint", "hadolint", None),
        ("coder", "code-server", None),
        ("mozilla", "geckodriver", None),
        ("veeso", "termscp", None),
        ("cli", "cli", Some("gh")),
        ("docker", "machine", Some("docker-machine")),
        ("wasmerio", "wasmer", None),
        ("jqlang", "jq", None),
        ("mikefarah", "yq", None),
        ("helix-editor", "helix", Some("hx")),
        ("neovim", "neovim", Some("nvim")),
    ] {
        add(binary.unwrap_or(project), github_release(user, project, binary, None));
    }

    add("shfmt", github_release("mvdan", "sh", None, Some("shfmt")));

    add("pyenv", git_project("https://github.com/pyenv/pyenv", "libexec/pyenv"));
    add("nodenv", git_project("https://github.com/nodenv/nodenv", "libexec/nodenv"));

    add(
        "repo",
        SourceSpec::Url(UrlSource {
            url: "https://storage.googleapis.com/git-repo-downloads/repo".to_owned(),
            rename: None,
        }),
    );

    add(
        "cht.sh",
        SourceSpec::Url(UrlSource {
            url: "https://cht.sh/:cht.sh".to_owned(),
            rename: Some("cht.sh".to_owned()),
        }),
    );

    for executable in ["adb", "fastboot"] {
        add(
            executable,
            SourceSpec::Package(PackageSource {
                package_url:
                    "https://dl.google.com/android/repository/platform-tools-latest-{os}.zip"
                        .to_owned(),
                executable_name: executable.to_owned(),
                package_name: Some("platform-tools".to_owned()),
                rename: None,
            }),
        );
    }

    add(
        "heroku",
        scraped_page(
            "https://devcenter.heroku.com/articles/heroku-cli",
            r#"<a href="(https://cli-assets\.heroku\.com/channels/stable/heroku-[^"]+)""#,
            Some("manifest"),
            "heroku",
            "heroku",
        ),
    );

    add(
        "rclone",
        scraped_page(
            "https://downloads.rclone.org/",
            r#"<a href="(\./rclone-current-[^"]+)""#,
            None,
            "rclone",
            "rclone",
        ),
    );

    for binary in ["node", "npm", "npx"] {
        add(
            binary,
            scraped_page(
                "https://nodejs.org/dist/latest/",
                r#"<a href="(node-v[^"]+)""#,
                None,
                binary,
                "nodejs",
            ),
        );
    }

    for binary in ["native-image", "java", "javac"] {
        add(
            binary,
            scraped_page(
                "https://www.oracle.com/java/technologies/downloads/",
                r#"<a href="(https://download\.oracle\.com/graalvm[^"]+)""#,
                None,
                binary,
                "native-image",
            ),
        );
    }

    add(
        "zig",
        SourceSpec::JsonManifest(JsonManifestSource {
            manifest_url: "https://ziglang.org/download/index.json".to_owned(),
            pointer: "/master".to_owned(),
            key: "tarball".to_owned(),
            binary: "zig".to_owned(),
            package_name: Some("zig".to_owned()),
            rename: None,
        }),
    );

    tools
}

fn github_script(user: &str, project: &str, path: Option<&str>) -> SourceSpec {
    SourceSpec::GithubScript(GithubScriptSource {
        user: user.to_owned(),
        project: project.to_owned(),
        path: path.map(str::to_owned),
        tag: "master".to_owned(),
        rename: None,
    })
}

fn github_release(
    user: &str,
    project: &str,
    binary: Option<&str>,
    rename: Option<&str>,
) -> SourceSpec {
    SourceSpec::GithubRelease(GithubReleaseSource {
        user: user.to_owned(),
        project: project.to_owned(),
        tag: "latest".to_owned(),
        binary: binary.map(str::to_owned),
        rename: rename.map(str::to_owned),
    })
}

fn git_project(git_url: &str, path: &str) -> SourceSpec {
    SourceSpec::GitProject(GitProjectSource {
        git_url: git_url.to_owned(),
        path: path.to_owned(),
        tag: "master".to_owned(),
        pull: false,
    })
}

fn scraped_page(
    page_url: &str,
    link_pattern: &str,
    exclude: Option<&str>,
    binary: &str,
    package_name: &str,
) -> SourceSpec {
    SourceSpec::ScrapedPage(ScrapedPageSource {
        page_url: page_url.to_owned(),
        link_pattern: Pattern(Regex::new(link_pattern).unwrap()),
        exclude: exclude.map(|exclude| Pattern(Regex::new(exclude).unwrap())),
        binary: binary.to_owned(),
        package_name: Some(package_name.to_owned()),
        rename: None,
    })
}
