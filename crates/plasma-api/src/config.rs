//! # Operator Configuration
//!
//! Loaded from a JSON file (default `config.json`). The `PORT`,
//! `OPERATOR_PRIVATE_KEY` and `DB_PATH` environment variables override file
//! values. Without a `db_path` the ledger lives in memory only.
//!
//! ```json
//! {
//!   "port": 1323,
//!   "operator_private_key": "0x4c08...",
//!   "max_txes_per_block": 65536,
//!   "db_path": "/var/lib/plasma/db"
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use plasma_chain::{ChainConfig, KvStore, MemoryStore, SledStore};
use plasma_core::{StoreError, MERKLE_CAPACITY};
use plasma_crypto::Account;

/// Config file read when `--conf` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";
/// Port used when neither the file nor `PORT` sets one.
pub const DEFAULT_PORT: u16 = 1323;

/// Error loading the operator configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid JSON for [`AppConfig`].
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid {var}: {reason}")]
    Env {
        /// Variable name.
        var: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// No operator key in the file or the environment.
    #[error("operator private key is not set")]
    MissingOperatorKey,

    /// The operator key is not a valid secp256k1 secret.
    #[error("invalid operator private key: {0}")]
    OperatorKey(String),
}

/// Operator settings.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Hex secp256k1 secret key of the operator. Never logged.
    #[serde(default)]
    pub operator_private_key: String,
    /// Per-block transaction limit passed to the engine.
    #[serde(default = "default_max_txes_per_block")]
    pub max_txes_per_block: usize,
    /// Directory of the on-disk ledger store.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_max_txes_per_block() -> usize {
    MERKLE_CAPACITY
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            operator_private_key: String::new(),
            max_txes_per_block: MERKLE_CAPACITY,
            db_path: None,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "operator_private_key",
                &(!self.operator_private_key.is_empty()).then_some("[REDACTED]"),
            )
            .field("max_txes_per_block", &self.max_txes_per_block)
            .field("db_path", &self.db_path)
            .finish()
    }
}

impl AppConfig {
    /// Parse the JSON file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides(
            std::env::var("PORT").ok(),
            std::env::var("OPERATOR_PRIVATE_KEY").ok(),
            std::env::var("DB_PATH").ok(),
        )?;
        Ok(config)
    }

    /// Override file values with the given environment values.
    pub fn apply_overrides(
        &mut self,
        port: Option<String>,
        operator_private_key: Option<String>,
        db_path: Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(port) = port {
            self.port = port.trim().parse().map_err(|e| ConfigError::Env {
                var: "PORT",
                reason: format!("{e}"),
            })?;
        }
        if let Some(key) = operator_private_key {
            self.operator_private_key = key;
        }
        if let Some(path) = db_path.filter(|p| !p.trim().is_empty()) {
            self.db_path = Some(PathBuf::from(path.trim()));
        }
        Ok(())
    }

    /// The operator account for the configured key.
    pub fn operator(&self) -> Result<Account, ConfigError> {
        if self.operator_private_key.trim().is_empty() {
            return Err(ConfigError::MissingOperatorKey);
        }
        Account::from_hex(self.operator_private_key.trim())
            .map_err(|e| ConfigError::OperatorKey(e.to_string()))
    }

    /// The ledger store: on disk at `db_path`, in memory otherwise.
    pub fn open_store(&self) -> Result<Arc<dyn KvStore>, StoreError> {
        match &self.db_path {
            Some(path) => Ok(Arc::new(SledStore::open(path)?)),
            None => {
                tracing::warn!("no db_path configured; ledger state will not survive a restart");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }

    /// Engine settings derived from this configuration.
    pub fn chain_config(&self) -> ChainConfig {
        ChainConfig {
            max_txes_per_block: self.max_txes_per_block,
        }
    }
}
