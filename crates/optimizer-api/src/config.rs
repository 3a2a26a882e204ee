//! Service configuration
//!
//! Read from an optional file named by `OPTIMIZER_CONFIG`, overridden by
//! `OPTIMIZER_*` environment variables. Nested keys use a double underscore,
//! e.g. `OPTIMIZER_WAREHOUSE__BACKEND=sqlite`.

use anyhow::{Context, Result};
use optimizer_lib::chat::{DEFAULT_GEMINI_LOCATION, DEFAULT_GEMINI_MODEL};
use optimizer_lib::knowledge::DEFAULT_KNOWLEDGE_TABLE;
use optimizer_lib::warehouse::DEFAULT_BIGQUERY_ENDPOINT;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "OPTIMIZER_CONFIG";

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(default = "default_project_id")]
    pub project_id: String,

    #[serde(default = "default_dataset_id")]
    pub dataset_id: String,

    #[serde(default)]
    pub warehouse: WarehouseSettings,

    #[serde(default)]
    pub knowledge: KnowledgeSettings,

    #[serde(default)]
    pub chat: ChatSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarehouseBackend {
    #[default]
    Memory,
    Sqlite,
    Bigquery,
}

impl WarehouseBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarehouseBackend::Memory => "memory",
            WarehouseBackend::Sqlite => "sqlite",
            WarehouseBackend::Bigquery => "bigquery",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseSettings {
    #[serde(default)]
    pub backend: WarehouseBackend,

    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,

    #[serde(default = "default_bigquery_endpoint")]
    pub endpoint: String,

    /// OAuth bearer token for BigQuery
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for WarehouseSettings {
    fn default() -> Self {
        Self {
            backend: WarehouseBackend::default(),
            sqlite_path: default_sqlite_path(),
            endpoint: default_bigquery_endpoint(),
            access_token: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeSettings {
    #[serde(default = "default_knowledge_table")]
    pub table: String,

    /// JSON catalog replacing the built-in corpus
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            table: default_knowledge_table(),
            catalog_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_chat_location")]
    pub location: String,

    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            location: default_chat_location(),
            model: default_chat_model(),
            endpoint: None,
            access_token: None,
        }
    }
}

fn default_api_port() -> u16 {
    8080
}

fn default_project_id() -> String {
    "cementai-optimiser".to_string()
}

fn default_dataset_id() -> String {
    "cement_plant".to_string()
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("optimizer.db")
}

fn default_bigquery_endpoint() -> String {
    DEFAULT_BIGQUERY_ENDPOINT.to_string()
}

fn default_knowledge_table() -> String {
    DEFAULT_KNOWLEDGE_TABLE.to_string()
}

fn default_chat_location() -> String {
    DEFAULT_GEMINI_LOCATION.to_string()
}

fn default_chat_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            project_id: default_project_id(),
            dataset_id: default_dataset_id(),
            warehouse: WarehouseSettings::default(),
            knowledge: KnowledgeSettings::default(),
            chat: ChatSettings::default(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment and config file
    pub fn load() -> Result<Self> {
        let file = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        Self::load_from(file.as_deref(), true)
    }

    /// Build from an optional file, optionally layering `OPTIMIZER_*` variables on top
    pub fn load_from(file: Option<&Path>, with_env: bool) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        if with_env {
            builder = builder.add_source(
                config::Environment::with_prefix("OPTIMIZER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config = builder.build().context("Failed to read configuration")?;
        config
            .try_deserialize()
            .context("Invalid optimizer configuration")
    }
}
