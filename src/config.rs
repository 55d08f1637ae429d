//! Crate-level configuration, resolved from CLI flags and `NOFOS_*`
//! environment variables.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::model::GrantRecord;

/// Which remote transport variant to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Transport {
    #[default]
    Rest,
    Stream,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Rest => f.write_str("rest"),
            Transport::Stream => f.write_str("stream"),
        }
    }
}

/// Resolved search configuration for the CLI surface.
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Base URL of the AI search backend. `None` means offline (local-only).
    pub endpoint: Option<String>,
    pub transport: Transport,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

impl SearchConfig {
    /// Fill unset fields from environment variables.
    pub fn with_env_fallback(mut self) -> Self {
        if self.endpoint.is_none()
            && let Ok(endpoint) = dotenvy::var("NOFOS_ENDPOINT")
        {
            self.endpoint = Some(endpoint);
        }
        if let Ok(val) = dotenvy::var("NOFOS_TRANSPORT") {
            match val.to_lowercase().as_str() {
                "stream" | "streaming" | "ws" => self.transport = Transport::Stream,
                "rest" | "http" => self.transport = Transport::Rest,
                other => tracing::warn!(value = other, "unknown NOFOS_TRANSPORT, keeping default"),
            }
        }
        self
    }
}

/// Load the grant catalog from a JSON file (an array of records). The
/// catalog is fetched once and treated as read-only for the session.
pub fn load_catalog(path: &PathBuf) -> Result<Vec<GrantRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    let catalog: Vec<GrantRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing catalog {}", path.display()))?;
    tracing::info!(path = %path.display(), records = catalog.len(), "catalog loaded");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn catalog_loads_from_json_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"1","name":"Clean Water Fund","status":"active","isPinned":true}}]"#
        )
        .unwrap();
        let catalog = load_catalog(&file.path().to_path_buf()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog[0].is_pinned);
    }

    #[test]
    fn missing_catalog_is_a_contextual_error() {
        let err = load_catalog(&PathBuf::from("/nonexistent/catalog.json")).unwrap_err();
        assert!(err.to_string().contains("reading catalog"));
    }
}
