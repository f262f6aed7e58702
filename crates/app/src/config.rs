//! Configuration loading and representation.
//!
//! Everything is read from `STOCKLEDGER_*` environment variables; unset
//! variables fall back to the defaults of the original register.

use std::path::PathBuf;

use thiserror::Error;

use stockledger_core::IdPolicy;
use stockledger_ledger::{IntegralUnits, LedgerPolicy, MatchPolicy};
use stockledger_store::{BackupRotation, DEFAULT_RETAIN, JsonFileStore};

pub const STORE_PATH: &str = "STOCKLEDGER_STORE_PATH";
pub const BACKUP_DIR: &str = "STOCKLEDGER_BACKUP_DIR";
pub const BACKUP_RETAIN: &str = "STOCKLEDGER_BACKUP_RETAIN";
pub const ID_POLICY: &str = "STOCKLEDGER_ID_POLICY";
pub const MATCH_POLICY: &str = "STOCKLEDGER_MATCH_POLICY";
pub const MERGE_OVERWRITE: &str = "STOCKLEDGER_MERGE_OVERWRITE";
pub const INTEGRAL_UNITS: &str = "STOCKLEDGER_INTEGRAL_UNITS";

const DEFAULT_STORE_PATH: &str = "stock_ledger.json";
const DEFAULT_BACKUP_DIR: &str = "backups";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Where the ledger lives and how it behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub store_path: PathBuf,
    /// `None` disables backups.
    pub backup_dir: Option<PathBuf>,
    pub backup_retain: usize,
    pub policy: LedgerPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            backup_dir: Some(PathBuf::from(DEFAULT_BACKUP_DIR)),
            backup_retain: DEFAULT_RETAIN,
            policy: LedgerPolicy::default(),
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, test map, ...).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup(STORE_PATH).filter(|v| !v.trim().is_empty()) {
            config.store_path = PathBuf::from(path);
        } else {
            tracing::info!(path = DEFAULT_STORE_PATH, "{STORE_PATH} not set; using default");
        }

        if let Some(dir) = lookup(BACKUP_DIR) {
            // Set but empty means "no backups".
            config.backup_dir = if dir.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }

        if let Some(raw) = lookup(BACKUP_RETAIN) {
            config.backup_retain = match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                Ok(_) => return Err(invalid(BACKUP_RETAIN, &raw, "must be at least 1")),
                Err(e) => return Err(invalid(BACKUP_RETAIN, &raw, e)),
            };
        }

        if let Some(raw) = lookup(ID_POLICY) {
            let id_policy: IdPolicy = raw.parse().map_err(|e| invalid(ID_POLICY, &raw, e))?;
            config.policy = config.policy.with_id_policy(id_policy);
        }

        if let Some(raw) = lookup(MATCH_POLICY) {
            let match_policy: MatchPolicy =
                raw.parse().map_err(|e| invalid(MATCH_POLICY, &raw, e))?;
            config.policy = config.policy.with_match_policy(match_policy);
        }

        if let Some(raw) = lookup(MERGE_OVERWRITE) {
            let overwrite = raw
                .trim()
                .to_ascii_lowercase()
                .parse::<bool>()
                .map_err(|e| invalid(MERGE_OVERWRITE, &raw, e))?;
            config.policy = config.policy.with_overwrite_descriptive(overwrite);
        }

        if let Some(raw) = lookup(INTEGRAL_UNITS) {
            let units: IntegralUnits = raw.parse().map_err(|e| invalid(INTEGRAL_UNITS, &raw, e))?;
            config.policy = config.policy.with_integral_units(units);
        }

        Ok(config)
    }

    /// JSON file store for this configuration, with backups when enabled.
    pub fn json_store(&self) -> JsonFileStore {
        let store = JsonFileStore::new(&self.store_path);
        match &self.backup_dir {
            Some(dir) => {
                store.with_backups(BackupRotation::new(dir).with_retain(self.backup_retain))
            }
            None => store,
        }
    }
}

fn invalid(key: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
