use std::{borrow::Cow, collections::HashSet};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{http::Http, validator::validate_url};

use super::{direct::validate_target, pattern::Pattern, LinkSource, LinkTarget};

/// Download links scraped from a web page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedPageSource {
    pub page_url: String,
    /// Matches the links in the page, through its first capture group if it has one
    pub link_pattern: Pattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Pattern>,
    pub binary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
}

impl ScrapedPageSource {
    pub fn validate(&self, errors: &mut Vec<String>) {
        validate_url(&self.page_url, "Page URL", errors);
        validate_target(&self.target(), errors);
    }
}

impl LinkSource for ScrapedPageSource {
    fn target(&self) -> LinkTarget<'_> {
        LinkTarget {
            binary: &self.binary,
            package_name: self.package_name.as_deref().map(Cow::Borrowed),
            rename: self.rename.as_deref(),
        }
    }

    async fn links(&self, http: &Http) -> Result<Vec<String>> {
        let html = http.get_text(&self.page_url).await?;

        scrape_links(
            &html,
            &self.page_url,
            &self.link_pattern,
            self.exclude.as_ref(),
        )
    }
}

/// Absolute, deduplicated links matched in a page
pub fn scrape_links(
    html: &str,
    page_url: &str,
    pattern: &Pattern,
    exclude: Option<&Pattern>,
) -> Result<Vec<String>> {
    let base =
        Url::parse(page_url).with_context(|| format!("Invalid page URL: {page_url}"))?;

    let mut seen = HashSet::new();
    let mut links = vec![];

    for href in pattern.extract_all(html) {
        if exclude.is_some_and(|exclude| exclude.is_match(href)) {
            debug!("Excluded link: {href}");
            continue;
        }

        let link = base
            .join(href)
            .with_context(|| format!("Invalid link {href:?} in page {page_url}"))?
            .to_string();

        if seen.insert(link.clone()) {
            links.push(link);
        }
    }

    Ok(links)
}
