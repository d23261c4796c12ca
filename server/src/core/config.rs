use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TABLE,
    DEFAULT_TRACE_LIMIT, DEFAULT_TRACING_URL, ENV_DATABASE_URL, ENV_TRACING_SERVICE,
};

// =============================================================================
// File Config (all fields optional, merged across files)
// =============================================================================

#[derive(Debug, Default, Clone, Deserialize)]
pub struct TracingFileConfig {
    pub url: Option<String>,
    pub service: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    pub url: Option<String>,
    pub table: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SyncFileConfig {
    pub limit: Option<u32>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub tracing: Option<TracingFileConfig>,
    pub database: Option<DatabaseFileConfig>,
    pub sync: Option<SyncFileConfig>,
    pub server: Option<ServerFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Unknown keys at the top level and inside each section, section-qualified
    fn unknown_fields(&self) -> Vec<String> {
        let mut keys = extra_keys(None, &self.extra);
        if let Some(tracing_cfg) = &self.tracing {
            keys.extend(extra_keys(Some("tracing"), &tracing_cfg.extra));
        }
        if let Some(database) = &self.database {
            keys.extend(extra_keys(Some("database"), &database.extra));
        }
        if let Some(sync) = &self.sync {
            keys.extend(extra_keys(Some("sync"), &sync.extra));
        }
        if let Some(server) = &self.server {
            keys.extend(extra_keys(Some("server"), &server.extra));
        }
        keys
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        let keys = self.unknown_fields();
        if !keys.is_empty() {
            tracing::warn!(
                fields = %keys.join(", "),
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(tracing_cfg) = other.tracing {
            let current = self.tracing.get_or_insert_with(TracingFileConfig::default);
            if tracing_cfg.url.is_some() {
                current.url = tracing_cfg.url;
            }
            if tracing_cfg.service.is_some() {
                current.service = tracing_cfg.service;
            }
        }

        if let Some(database) = other.database {
            let current = self.database.get_or_insert_with(DatabaseFileConfig::default);
            if database.url.is_some() {
                current.url = database.url;
            }
            if database.table.is_some() {
                current.table = database.table;
            }
        }

        if let Some(sync) = other.sync {
            let current = self.sync.get_or_insert_with(SyncFileConfig::default);
            if sync.limit.is_some() {
                current.limit = sync.limit;
            }
        }

        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                current.host = server.host;
            }
            if server.port.is_some() {
                current.port = server.port;
            }
        }
    }
}

fn extra_keys(section: Option<&str>, extra: &serde_json::Value) -> Vec<String> {
    let serde_json::Value::Object(map) = extra else {
        return Vec::new();
    };
    map.keys()
        .map(|key| match section {
            Some(section) => format!("{}.{}", section, key),
            None => key.clone(),
        })
        .collect()
}

// =============================================================================
// Final Config
// =============================================================================

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub url: String,
    pub service: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub table: String,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub limit: u32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Raised when required settings are absent from every source
#[derive(Error, Debug, PartialEq, Eq)]
#[error("Missing required configuration: {}", .missing.join(", "))]
pub struct MissingConfig {
    pub missing: Vec<String>,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub tracing: TracingConfig,
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.tracetable/tracetable.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::resolve(file_config, cli)?;
        tracing::debug!(
            service = %config.tracing.service,
            table = %config.database.table,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Layer defaults, file config and CLI values, then check required fields
    ///
    /// Every missing required field is reported in one error.
    pub fn resolve(file_config: FileConfig, cli: &CliConfig) -> Result<Self, MissingConfig> {
        let file_tracing = file_config.tracing.unwrap_or_default();
        let file_database = file_config.database.unwrap_or_default();
        let file_sync = file_config.sync.unwrap_or_default();
        let file_server = file_config.server.unwrap_or_default();

        let service = cli.service.clone().or(file_tracing.service);
        let database_url = cli.database_url.clone().or(file_database.url);

        let mut missing = Vec::new();
        if database_url.is_none() {
            missing.push(format!("database.url (--database-url / {})", ENV_DATABASE_URL));
        }
        if service.is_none() {
            missing.push(format!("tracing.service (--service / {})", ENV_TRACING_SERVICE));
        }
        let (Some(database_url), Some(service)) = (database_url, service) else {
            return Err(MissingConfig { missing });
        };

        Ok(Self {
            tracing: TracingConfig {
                url: cli
                    .tracing_url
                    .clone()
                    .or(file_tracing.url)
                    .unwrap_or_else(|| DEFAULT_TRACING_URL.to_string()),
                service,
            },
            database: DatabaseConfig {
                url: database_url,
                table: cli
                    .table
                    .clone()
                    .or(file_database.table)
                    .unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            },
            sync: SyncConfig {
                limit: file_sync.limit.unwrap_or(DEFAULT_TRACE_LIMIT),
            },
            server: ServerConfig {
                host: cli
                    .host
                    .clone()
                    .or(file_server.host)
                    .unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT),
            },
        })
    }
}

/// Get profile config path (~/.tracetable/tracetable.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
