// src/config.rs

//! Resolves the bootstrap configuration from defaults, an optional TOML file
//! and the process environment.

use crate::core::credential::{DERIVED_KEY_LEN, ScryptKdf};
use crate::core::errors::BootstrapError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the store file inside the data directory.
pub const USERS_FILE_NAME: &str = "users.json";

/// Environment variables read for the admin username, in priority order.
pub const USERNAME_VARS: [&str; 2] = ["ADMIN_USER", "ADMIN_USERNAME"];
/// Environment variables read for the admin password, in priority order.
pub const PASSWORD_VARS: [&str; 2] = ["ADMIN_PASS", "ADMIN_PASSWORD"];
pub const EMAIL_VAR: &str = "ADMIN_EMAIL";
pub const DATA_DIR_VAR: &str = "DATA_DIR";
/// Overrides the installation root that the default data directory hangs off.
pub const ROOT_VAR: &str = "BOOTSTRAP_ROOT";

/// Cost parameters for the scrypt key derivation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfConfig {
    /// log2 of the CPU/memory cost `N`.
    #[serde(default = "default_log_n")]
    pub log_n: u8,
    /// Block size.
    #[serde(default = "default_r")]
    pub r: u32,
    /// Parallelization.
    #[serde(default = "default_p")]
    pub p: u32,
}

fn default_log_n() -> u8 {
    14 // N = 16384
}
fn default_r() -> u32 {
    8
}
fn default_p() -> u32 {
    1
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            log_n: default_log_n(),
            r: default_r(),
            p: default_p(),
        }
    }
}

/// A raw representation of the config file before the environment is applied.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    data_dir: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    kdf: KdfConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_log_level() -> String {
    "warn".to_string()
}

/// The fully resolved configuration for one bootstrap run.
///
/// Built once at the process boundary and passed down; nothing below `main`
/// reads the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub log_level: String,
    pub kdf: KdfConfig,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub admin_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            kdf: KdfConfig::default(),
            admin_username: None,
            admin_password: None,
            admin_email: None,
        }
    }
}

impl Config {
    /// Loads the optional config file, then layers the process environment on top.
    pub fn load(config_path: Option<&str>) -> Result<Self, BootstrapError> {
        let base = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        // Variables that are not valid UTF-8 are treated as unset.
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));
        base.with_env_vars(vars)
    }

    /// Reads a TOML config file. Admin credentials are never taken from it.
    pub fn from_file(path: &str) -> Result<Self, BootstrapError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| BootstrapError::io("Failed to read config file", path, e))?;
        let raw_config: RawConfig = toml::from_str(&contents)
            .map_err(|e| BootstrapError::Config(format!("Failed to parse TOML from '{path}': {e}")))?;

        let config = Config {
            data_dir: raw_config.data_dir.unwrap_or_else(default_data_dir),
            log_level: raw_config.log_level,
            kdf: raw_config.kdf,
            ..Config::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Applies environment-style variables on top of this configuration.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Result<Self, BootstrapError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        self.admin_username = first_non_empty(&vars, &USERNAME_VARS);
        self.admin_password = first_non_empty(&vars, &PASSWORD_VARS);
        self.admin_email = vars.get(EMAIL_VAR).cloned();

        if let Some(dir) = first_non_empty(&vars, &[DATA_DIR_VAR]) {
            self.data_dir = PathBuf::from(dir);
        } else if let Some(root) = first_non_empty(&vars, &[ROOT_VAR]) {
            self.data_dir = Path::new(&root).join(default_data_dir());
        }

        self.validate()?;
        Ok(self)
    }

    /// The full path of the user store.
    pub fn users_file(&self) -> PathBuf {
        self.data_dir.join(USERS_FILE_NAME)
    }

    /// Validates the resolved configuration to ensure logical consistency.
    fn validate(&self) -> Result<(), BootstrapError> {
        if self.log_level.trim().is_empty() {
            return Err(BootstrapError::Config("log_level cannot be empty".to_string()));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(BootstrapError::Config("data_dir cannot be empty".to_string()));
        }
        ScryptKdf::from_config(&self.kdf).map_err(|e| {
            BootstrapError::Config(format!(
                "invalid kdf parameters (log_n={}, r={}, p={}, len={DERIVED_KEY_LEN}): {e}",
                self.kdf.log_n, self.kdf.r, self.kdf.p
            ))
        })?;
        Ok(())
    }
}

fn first_non_empty(vars: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| vars.get(*key))
        .find(|value| !value.is_empty())
        .cloned()
}
