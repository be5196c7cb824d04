//! Layered application configuration
//!
//! Priority (lowest to highest): built-in defaults, the JSON config file,
//! then CLI flags (which fall back to env vars through clap).

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use super::cli::CliConfig;
use super::constants::{CONFIG_FILE_NAME, DEFAULT_DATABASE_PATH, DEFAULT_HOST, DEFAULT_PORT};
use crate::domain::filter::{EntityConfig, EntityRegistry};

/// Deepest relation nesting an entity may declare (`unit.building`)
const MAX_RELATION_DEPTH: usize = 2;

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    /// File path, `sqlite:` URL or `:memory:`
    pub path: Option<String>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub database: Option<DatabaseFileConfig>,
    pub entities: Option<Vec<EntityConfig>>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str = map.keys().map(String::as_str).collect::<Vec<_>>().join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub entities: Vec<EntityConfig>,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// The file is `--config` when given (and must exist), otherwise
    /// `assetdesk.json` in the working directory if present.
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let path = match cli.config {
            Some(ref path) => {
                let expanded = expand_path(&path.to_string_lossy());
                if !expanded.exists() {
                    anyhow::bail!("Config file not found: {}", expanded.display());
                }
                Some(expanded)
            }
            None => {
                let local = PathBuf::from(CONFIG_FILE_NAME);
                local.exists().then_some(local)
            }
        };

        let file_config = match path {
            Some(path) => {
                let config = FileConfig::load_from_file(&path)?;
                config.warn_unknown_fields();
                config
            }
            None => {
                tracing::debug!("No config file found, using defaults");
                FileConfig::default()
            }
        };

        let config = Self::layer(cli, file_config);
        config.validate()?;
        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            database = %config.database.path,
            entities = config.entities.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Layer defaults, file values and CLI overrides
    fn layer(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_database = file_config.database.unwrap_or_default();

        let host = cli
            .host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT);
        let path = cli
            .database
            .clone()
            .or(file_database.path)
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

        Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig { path },
            entities: file_config.entities.unwrap_or_default(),
        }
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }
        if self.database.path.trim().is_empty() {
            anyhow::bail!("Configuration error: database.path must not be empty");
        }

        let mut names = HashSet::new();
        for entity in &self.entities {
            if entity.name.trim().is_empty() {
                anyhow::bail!("Configuration error: entity name must not be empty");
            }
            if !names.insert(entity.name.as_str()) {
                anyhow::bail!("Configuration error: duplicate entity '{}'", entity.name);
            }
            if entity.table.trim().is_empty() {
                anyhow::bail!(
                    "Configuration error: entity '{}' has an empty table",
                    entity.name
                );
            }
            let mut aliases = HashSet::from([entity.alias()]);
            for relation in &entity.relations {
                if !aliases.insert(relation.alias()) {
                    anyhow::bail!(
                        "Configuration error: relation '{}' on '{}' reuses alias '{}'",
                        relation.path,
                        entity.name,
                        relation.alias()
                    );
                }
                if relation.depth() > MAX_RELATION_DEPTH {
                    anyhow::bail!(
                        "Configuration error: relation '{}' on '{}' nests deeper than {} levels",
                        relation.path,
                        entity.name,
                        MAX_RELATION_DEPTH
                    );
                }
                if let Some(parent) = relation.parent_path()
                    && !entity.relations.iter().any(|r| r.path == parent)
                {
                    anyhow::bail!(
                        "Configuration error: relation '{}' on '{}' has no parent relation '{}'",
                        relation.path,
                        entity.name,
                        parent
                    );
                }
            }
        }

        if self.entities.is_empty() {
            tracing::warn!("No entities configured, every listing will return 404");
        }
        if is_all_interfaces(&self.server.host) {
            tracing::warn!(
                host = %self.server.host,
                "Binding to all interfaces, entity data is reachable from the network"
            );
        }

        Ok(())
    }

    pub fn registry(&self) -> EntityRegistry {
        EntityRegistry::new(self.entities.iter().cloned())
    }
}

/// Check if host binds to all network interfaces
pub fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}

/// Expand a leading `~` to the home directory
fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
