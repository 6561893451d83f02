//! Application configuration.
//!
//! Loaded from TOML at `<platform config dir>/notekeeper/config.toml` unless
//! an explicit path is given. A missing file yields defaults.
//!
//! ```toml
//! database_path = "/var/lib/notekeeper/notes.db"
//!
//! [auth]
//! password_iterations = 600000
//!
//! [gateway]
//! host = "127.0.0.1"
//! port = 5000
//! ```

use crate::auth::hasher::DEFAULT_ITERATIONS;
use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "notekeeper";
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "notes.db";

/// Environment variable that overrides `database_path`.
pub const DATABASE_ENV: &str = "NOTEKEEPER_DATABASE";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file.
    pub database_path: PathBuf,
    pub auth: AuthConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// PBKDF2 rounds for newly hashed passwords.
    pub password_iterations: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        let database_path = project_dirs()
            .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE));
        Self {
            database_path,
            auth: AuthConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password_iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    /// Applies the `NOTEKEEPER_DATABASE` override and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path(),
        };

        let mut config = match path {
            Some(ref p) if p.exists() => Self::from_file(p)?,
            _ => Self::default(),
        };

        if let Some(db) = std::env::var_os(DATABASE_ENV).filter(|v| !v.is_empty()) {
            config.database_path = PathBuf::from(db);
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// `<platform config dir>/notekeeper/config.toml`, if a home directory exists.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            bail!("database_path cannot be empty");
        }
        if self.auth.password_iterations == 0 {
            bail!("auth.password_iterations must be at least 1");
        }
        if self.gateway.host.trim().is_empty() {
            bail!("gateway.host cannot be empty");
        }
        Ok(())
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME)
}
