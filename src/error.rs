use std::path::PathBuf;

use reqwest::StatusCode;

/// Failures that abort a tool resolution.
///
/// They are raised through [`anyhow`] like every other error of the crate, so callers that care
/// about the kind of failure can `downcast_ref::<ResolveError>()` on the returned error.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("No tool named '{name}'{}", suggestion_hint(.suggestion))]
    ToolNotFound {
        name: String,
        suggestion: Option<String>,
    },

    #[error("Failed to fetch URL: {url}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Got HTTP status {status} when fetching URL: {url}")]
    HttpStatus { url: String, status: StatusCode },

    #[error("No download candidate found for tool '{tool}'")]
    NoCandidates { tool: String },

    #[error("Could not choose an appropriate download for tool '{tool}'")]
    NoSuitableLink { tool: String },

    #[error("Executable '{executable}' not found in {}", .package_dir.display())]
    ExecutableNotFound {
        executable: String,
        package_dir: PathBuf,
    },

    #[error("Unsupported configuration file type: {}", .path.display())]
    UnsupportedConfig { path: PathBuf },
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(suggestion) => format!(" (did you mean '{suggestion}'?)"),
        None => String::new(),
    }
}
