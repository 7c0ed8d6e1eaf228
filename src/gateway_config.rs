//! Configuration for taskboard, read from `.taskboard/taskboard.toml`.
//!
//! Values are layered: file → environment → CLI. The bearer token is only
//! ever taken from the environment (`TASKBOARD_TOKEN`, optionally via a
//! `.env` file) and is never written to disk.
//!
//! # Configuration File Format
//!
//! ```toml
//! [gateway]
//! url = "http://localhost:8080"
//! reference_path = "/reference"
//! aggregator_path = "/aggregator"
//! tasks_path = "/tasks"
//! timeout_secs = 15
//!
//! [session]
//! workspace_id = 42
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::board::gateway::GatewayEndpoints;
use crate::board::models::{BoardContext, Credential};

pub const CONFIG_DIR: &str = ".taskboard";
pub const CONFIG_FILE: &str = "taskboard.toml";

pub const ENV_GATEWAY_URL: &str = "TASKBOARD_GATEWAY_URL";
pub const ENV_REFERENCE_PATH: &str = "TASKBOARD_REFERENCE_PATH";
pub const ENV_AGGREGATOR_PATH: &str = "TASKBOARD_AGGREGATOR_PATH";
pub const ENV_TASKS_PATH: &str = "TASKBOARD_TASKS_PATH";
pub const ENV_TOKEN: &str = "TASKBOARD_TOKEN";
pub const ENV_WORKSPACE_ID: &str = "TASKBOARD_WORKSPACE_ID";

/// Gateway location and per-service path prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySection {
    /// Base URL of the API gateway
    #[serde(default = "default_url")]
    pub url: String,
    /// Path prefix of the reference service (statuses)
    #[serde(default = "default_reference_path")]
    pub reference_path: String,
    /// Path prefix of the aggregator service (tasks by status)
    #[serde(default = "default_aggregator_path")]
    pub aggregator_path: String,
    /// Path prefix of the tasks service (status updates)
    #[serde(default = "default_tasks_path")]
    pub tasks_path: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_reference_path() -> String {
    "/reference".to_string()
}

fn default_aggregator_path() -> String {
    "/aggregator".to_string()
}

fn default_tasks_path() -> String {
    "/tasks".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            url: default_url(),
            reference_path: default_reference_path(),
            aggregator_path: default_aggregator_path(),
            tasks_path: default_tasks_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSection {
    /// Workspace the board opens by default
    #[serde(default)]
    pub workspace_id: Option<i64>,
}

/// Contents of `taskboard.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskboardToml {
    #[serde(default)]
    pub gateway: GatewaySection,
    #[serde(default)]
    pub session: SessionSection,
}

impl TaskboardToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse taskboard.toml")
    }

    /// Load from `<dir>/taskboard.toml`, or defaults if the file is missing.
    pub fn load_or_default(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize taskboard.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Gateway URL (env → file).
    pub fn gateway_url(&self) -> String {
        env_value(ENV_GATEWAY_URL).unwrap_or_else(|| self.gateway.url.clone())
    }

    pub fn reference_path(&self) -> String {
        env_value(ENV_REFERENCE_PATH).unwrap_or_else(|| self.gateway.reference_path.clone())
    }

    pub fn aggregator_path(&self) -> String {
        env_value(ENV_AGGREGATOR_PATH).unwrap_or_else(|| self.gateway.aggregator_path.clone())
    }

    pub fn tasks_path(&self) -> String {
        env_value(ENV_TASKS_PATH).unwrap_or_else(|| self.gateway.tasks_path.clone())
    }

    /// Workspace id (env → file). An unparsable env value is an error
    /// rather than silently falling back.
    pub fn workspace_id(&self) -> Result<Option<i64>> {
        match env_value(ENV_WORKSPACE_ID) {
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .with_context(|| format!("Invalid {} '{}': expected an integer", ENV_WORKSPACE_ID, raw)),
            None => Ok(self.session.workspace_id),
        }
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let url = self.gateway_url();
        if let Err(e) = GatewayEndpoints::new(&url, "", "", "") {
            warnings.push(e.to_string());
        }

        if self.gateway.timeout_secs == 0 {
            warnings.push("timeout_secs must be greater than 0".to_string());
        }

        for (name, path) in [
            ("reference_path", self.reference_path()),
            ("aggregator_path", self.aggregator_path()),
            ("tasks_path", self.tasks_path()),
        ] {
            if path.contains("://") || path.contains('?') {
                warnings.push(format!(
                    "Invalid {} '{}': should be a path prefix such as '/tasks'",
                    name, path
                ));
            }
        }

        if let Err(e) = self.workspace_id() {
            warnings.push(e.to_string());
        }

        warnings
    }
}

/// Non-empty value of an environment variable.
fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Resolved configuration: `taskboard.toml` plus environment and CLI overrides.
#[derive(Debug, Clone)]
pub struct TaskboardConfig {
    /// Path to the project directory
    pub project_dir: PathBuf,
    /// Path to the config file (may not exist)
    pub config_path: PathBuf,
    /// Parsed taskboard.toml configuration
    pub toml: TaskboardToml,
    /// CLI override for the workspace
    pub cli_workspace_id: Option<i64>,
    /// CLI override for the gateway URL
    pub cli_gateway_url: Option<String>,
}

impl TaskboardConfig {
    /// Loads `<project>/.taskboard/taskboard.toml`, falling back to defaults
    /// when it does not exist.
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let config_dir = project_dir.join(CONFIG_DIR);
        let toml = TaskboardToml::load_or_default(&config_dir)?;

        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE),
            project_dir,
            toml,
            cli_workspace_id: None,
            cli_gateway_url: None,
        })
    }

    /// Create a TaskboardConfig with CLI overrides. An explicit config path
    /// must exist.
    pub fn with_cli_args(
        project_dir: PathBuf,
        config_path: Option<PathBuf>,
        workspace_id: Option<i64>,
        gateway_url: Option<String>,
    ) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        if let Some(path) = config_path {
            config.toml = TaskboardToml::load(&path)?;
            config.config_path = path;
        }
        config.cli_workspace_id = workspace_id;
        config.cli_gateway_url = gateway_url;
        Ok(config)
    }

    pub fn config_dir(&self) -> PathBuf {
        self.project_dir.join(CONFIG_DIR)
    }

    /// Gateway URL (CLI → env → file).
    pub fn gateway_url(&self) -> String {
        self.cli_gateway_url
            .clone()
            .unwrap_or_else(|| self.toml.gateway_url())
    }

    /// Workspace id (CLI → env → file).
    pub fn workspace_id(&self) -> Result<Option<i64>> {
        match self.cli_workspace_id {
            Some(id) => Ok(Some(id)),
            None => self.toml.workspace_id(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.toml.gateway.timeout_secs.max(1))
    }

    pub fn token(&self) -> Option<Credential> {
        env_value(ENV_TOKEN).map(Credential::new)
    }

    pub fn endpoints(&self) -> Result<GatewayEndpoints> {
        GatewayEndpoints::new(
            &self.gateway_url(),
            &self.toml.reference_path(),
            &self.toml.aggregator_path(),
            &self.toml.tasks_path(),
        )
        .context("Invalid gateway configuration")
    }

    /// The workspace and credential the board should be scoped to.
    pub fn board_context(&self) -> Result<BoardContext> {
        let workspace_id = self.workspace_id()?.with_context(|| {
            format!(
                "No workspace selected. Pass --workspace, set {}, or add [session] workspace_id to {}",
                ENV_WORKSPACE_ID,
                self.config_path.display()
            )
        })?;
        let credential = self
            .token()
            .with_context(|| format!("No gateway token. Set {} in the environment or a .env file", ENV_TOKEN))?;
        Ok(BoardContext::new(workspace_id, credential))
    }

    /// Validate configuration and return warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.toml.validate();
        if let Some(url) = &self.cli_gateway_url
            && let Err(e) = GatewayEndpoints::new(url, "", "", "")
        {
            warnings.push(e.to_string());
        }
        if self.token().is_none() {
            warnings.push(format!("{} is not set; board commands will fail", ENV_TOKEN));
        }
        warnings
    }
}
