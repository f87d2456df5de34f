use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use log::debug;
use rapidfuzz::distance::jaro_winkler::BatchComparator;
use tokio::fs;

use crate::{builtin::builtin_tools, error::ResolveError, sources::SourceSpec, validator::validate_name};

/// Tool definitions: the built-in ones, overridden by the user's configuration file
#[derive(Debug, Clone)]
pub struct Registry {
    config_path: PathBuf,
    tools: BTreeMap<String, SourceSpec>,
}

impl Registry {
    pub fn builtin(config_path: PathBuf) -> Self {
        Self {
            config_path,
            tools: builtin_tools(),
        }
    }

    /// Built-in definitions, plus the ones from the configuration file if it exists
    pub async fn load(config_path: PathBuf) -> Result<Self> {
        let mut registry = Self::builtin(config_path);

        if !fs::try_exists(&registry.config_path).await.with_context(|| {
            format!(
                "Failed to check if configuration file exists at path: {}",
                registry.config_path.display()
            )
        })? {
            debug!(
                "No configuration file at {}, using built-in tools only",
                registry.config_path.display()
            );

            return Ok(registry);
        }

        let content = fs::read_to_string(&registry.config_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to read configuration file at: {}",
                    registry.config_path.display()
                )
            })?;

        let overrides = parse_config(&registry.config_path, &content).with_context(|| {
            format!(
                "Failed to parse configuration file at: {}",
                registry.config_path.display()
            )
        })?;

        debug!("Loaded {} tool(s) from configuration file", overrides.len());

        registry.tools.extend(overrides);

        Ok(registry)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get(&self, name: &str) -> Option<&SourceSpec> {
        self.tools.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SourceSpec)> {
        self.tools.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn insert(&mut self, name: String, spec: SourceSpec) -> Option<SourceSpec> {
        self.tools.insert(name, spec)
    }

    /// Closest known tool name, if any is close enough
    pub fn suggest(&self, name: &str) -> Option<&str> {
        let comparator = BatchComparator::new(name.chars());

        self.names()
            .map(|candidate| (candidate, comparator.distance(candidate.chars())))
            .filter(|(_, distance)| *distance < 0.3)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(candidate, _)| candidate)
    }

    /// Error for an unknown tool name
    pub fn not_found(&self, name: &str) -> ResolveError {
        ResolveError::ToolNotFound {
            name: name.to_owned(),
            suggestion: self.suggest(name).map(str::to_owned),
        }
    }

    /// Write every definition to the configuration file, as JSON (which is also valid YAML)
    pub async fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!(
                    "Failed to create configuration directory at: {}",
                    parent.display()
                )
            })?;
        }

        let json = serde_json::to_string_pretty(&self.tools)
            .context("Failed to serialize tool definitions")?;

        fs::write(&self.config_path, json).await.with_context(|| {
            format!(
                "Failed to write configuration file at: {}",
                self.config_path.display()
            )
        })
    }
}

fn parse_config(path: &Path, content: &str) -> Result<BTreeMap<String, SourceSpec>> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());

    let raw: BTreeMap<String, serde_json::Value> = match extension.as_deref() {
        Some("json") => serde_json::from_str(content)?,
        Some("yaml" | "yml") => serde_yaml::from_str::<Option<_>>(content)?.unwrap_or_default(),
        _ => {
            return Err(ResolveError::UnsupportedConfig {
                path: path.to_owned(),
            }
            .into())
        }
    };

    let mut tools = BTreeMap::new();
    let mut errors = vec![];

    for (name, value) in raw {
        validate_name(&name, "Tool name", &mut errors);

        let spec = serde_json::from_value::<SourceSpec>(value)
            .with_context(|| format!("Invalid definition for tool '{name}'"))?;

        errors.extend(
            spec.validate()
                .into_iter()
                .map(|error| format!("Tool '{name}': {error}")),
        );

        tools.insert(name, spec);
    }

    if !errors.is_empty() {
        bail!(
            "Found {} error(s) in tool definitions:\n{}",
            errors.len(),
            errors
                .iter()
                .map(|error| format!("* {error}"))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    Ok(tools)
}
