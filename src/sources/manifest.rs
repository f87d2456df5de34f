use std::borrow::Cow;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{http::Http, validator::validate_url};

use super::{direct::validate_target, LinkSource, LinkTarget};

/// Download links listed in a JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonManifestSource {
    pub manifest_url: String,
    /// JSON pointer to the part of the document holding the links
    #[serde(default)]
    pub pointer: String,
    #[serde(default = "default_key")]
    pub key: String,
    pub binary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
}

fn default_key() -> String {
    "tarball".to_owned()
}

impl JsonManifestSource {
    pub fn validate(&self, errors: &mut Vec<String>) {
        validate_url(&self.manifest_url, "Manifest URL", errors);

        if !self.pointer.is_empty() && !self.pointer.starts_with('/') {
            errors.push(format!(
                "JSON pointer {:?} must be empty or start with '/'",
                self.pointer
            ));
        }

        validate_target(&self.target(), errors);
    }
}

impl LinkSource for JsonManifestSource {
    fn target(&self) -> LinkTarget<'_> {
        LinkTarget {
            binary: &self.binary,
            package_name: self.package_name.as_deref().map(Cow::Borrowed),
            rename: self.rename.as_deref(),
        }
    }

    async fn links(&self, http: &Http) -> Result<Vec<String>> {
        let text = http.get_text(&self.manifest_url).await?;

        let manifest = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("Failed to parse manifest at {}", self.manifest_url))?;

        let root = manifest.pointer(&self.pointer).with_context(|| {
            format!(
                "Nothing found at {:?} in manifest {}",
                self.pointer, self.manifest_url
            )
        })?;

        let mut links = vec![];
        collect_values(root, &self.key, &mut links);
        Ok(links)
    }
}

/// Every string stored under `key`, at any depth
pub fn collect_values(value: &Value, key: &str, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (name, value) in map {
                match value {
                    Value::String(string) if name == key => out.push(string.clone()),
                    _ => collect_values(value, key, out),
                }
            }
        }
        Value::Array(values) => {
            for value in values {
                collect_values(value, key, out);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}
