use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^([a-zA-Z0-9\-_.]+)$"#).unwrap());

static SCP_LIKE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[\w.-]+@[\w.-]+:[^/].*$"#).unwrap());

/// Tool names, GitHub user and project names
pub fn validate_name(name: &str, what: &str, errors: &mut Vec<String>) {
    if !NAME_REGEX.is_match(name) {
        errors.push(format!("{what} {name:?} contains invalid character(s)"));
    }
}

/// Names that end up as a single path component
pub fn validate_file_name(name: &str, what: &str, errors: &mut Vec<String>) {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        errors.push(format!("{what} {name:?} is not a valid file name"));
    }
}

pub fn validate_url(url: &str, what: &str, errors: &mut Vec<String>) {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        Ok(parsed) => errors.push(format!(
            "{what} {url:?} uses unsupported scheme '{}'",
            parsed.scheme()
        )),
        Err(err) => errors.push(format!("{what} {url:?} is not a valid URL: {err}")),
    }
}

/// Anything `git clone` understands: scp-like `user@host:path` or a URL
pub fn validate_git_url(url: &str, what: &str, errors: &mut Vec<String>) {
    if SCP_LIKE_REGEX.is_match(url) {
        return;
    }

    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https" | "ssh" | "git" | "file") => {}
        Ok(parsed) => errors.push(format!(
            "{what} {url:?} uses unsupported scheme '{}'",
            parsed.scheme()
        )),
        Err(err) => errors.push(format!("{what} {url:?} is not a valid git URL: {err}")),
    }
}
