//! `stockledger-app` — session layer and process wiring.
//!
//! The form layer (out of scope here) opens a [`Session`], calls its
//! operations, and shows [`SessionError`]s to the operator.

pub mod config;
pub mod error;
pub mod session;

use anyhow::Context;

pub use config::{ConfigError, LedgerConfig};
pub use error::{SessionError, SessionResult};
pub use session::{EditContext, Session};

use stockledger_store::JsonFileStore;

/// Initialize logging, read configuration from the environment and open a
/// session over the configured JSON store.
pub fn open_from_env() -> anyhow::Result<Session<JsonFileStore>> {
    stockledger_observability::init();

    let config = LedgerConfig::from_env().context("invalid STOCKLEDGER_* configuration")?;
    open_with(&config)
}

/// Open a session over the JSON store described by `config`.
pub fn open_with(config: &LedgerConfig) -> anyhow::Result<Session<JsonFileStore>> {
    let store = config.json_store();
    tracing::info!(
        path = %store.path().display(),
        backups = store.backups().is_some(),
        id_policy = ?config.policy.id_policy,
        match_policy = ?config.policy.match_policy,
        "opening stock ledger"
    );
    Session::open(store, config.policy)
        .with_context(|| format!("failed to open stock ledger at {:?}", config.store_path))
}
