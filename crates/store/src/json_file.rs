//! JSON file store: the whole ledger as one pretty-printed array.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use stockledger_ledger::StockRecord;

use crate::backup::BackupRotation;
use crate::error::{StoreError, StoreResult};
use crate::store::DurableStore;

/// Single-file JSON store with optional rotating backups.
///
/// Saves go through a sibling temp file that is fsynced and renamed over the
/// store, so readers see either the previous or the new record set.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    backups: Option<BackupRotation>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backups: None,
        }
    }

    pub fn with_backups(mut self, backups: BackupRotation) -> Self {
        self.backups = Some(backups);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backups(&self) -> Option<&BackupRotation> {
        self.backups.as_ref()
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl DurableStore for JsonFileStore {
    fn load(&self) -> StoreResult<Vec<StockRecord>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no store yet; starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let rows = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "store is not a JSON array; starting empty"
                );
                return Ok(Vec::new());
            }
        };

        let total = rows.len();
        let records: Vec<StockRecord> = rows
            .into_iter()
            .enumerate()
            .filter_map(|(index, row)| match serde_json::from_value::<StockRecord>(row) {
                Ok(record) => Some(record),
                Err(err) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        index,
                        error = %err,
                        "skipping unreadable record"
                    );
                    None
                }
            })
            .collect();

        tracing::debug!(
            path = %self.path.display(),
            records = records.len(),
            skipped = total - records.len(),
            "store loaded"
        );
        Ok(records)
    }

    fn save(&self, records: &[StockRecord]) -> StoreResult<()> {
        if let Some(backups) = &self.backups {
            // The write itself still goes ahead.
            if let Err(err) = backups.backup(&self.path) {
                tracing::warn!(error = %err, "backup before save failed");
            }
        }

        let encoded = serde_json::to_string_pretty(records)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let temp_path = self.temp_path();
        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| StoreError::io(&temp_path, e))?;
        file.write_all(encoded.as_bytes())
            .map_err(|e| StoreError::io(&temp_path, e))?;
        file.sync_all().map_err(|e| StoreError::io(&temp_path, e))?;
        drop(file);
        fs::rename(&temp_path, &self.path).map_err(|e| StoreError::io(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), records = records.len(), "store saved");
        Ok(())
    }
}
