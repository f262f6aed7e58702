//! Rotating copies of the store file taken before each save.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::error::{StoreError, StoreResult};

const PREFIX: &str = "backup_";
const EXTENSION: &str = "json";
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Number of backups kept when no other limit is configured.
pub const DEFAULT_RETAIN: usize = 7;

/// Copies the store into `dir` as `backup_<YYYYmmdd_HHMMSS>.json`, keeping the
/// newest `retain` copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRotation {
    dir: PathBuf,
    retain: usize,
}

impl BackupRotation {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            retain: DEFAULT_RETAIN,
        }
    }

    /// At least one backup is always kept.
    pub fn with_retain(mut self, retain: usize) -> Self {
        self.retain = retain.max(1);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn retain(&self) -> usize {
        self.retain
    }

    /// Back up `source` stamped with the local wall clock.
    pub fn backup(&self, source: &Path) -> StoreResult<Option<PathBuf>> {
        self.backup_at(source, Local::now().naive_local())
    }

    /// Back up `source` under an explicit stamp, then prune. Returns `None`
    /// when there is nothing to copy yet.
    pub fn backup_at(&self, source: &Path, stamp: NaiveDateTime) -> StoreResult<Option<PathBuf>> {
        if !source.exists() {
            return Ok(None);
        }

        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let target = self
            .dir
            .join(format!("{PREFIX}{}.{EXTENSION}", stamp.format(STAMP_FORMAT)));
        fs::copy(source, &target).map_err(|e| StoreError::io(&target, e))?;
        tracing::debug!(backup = %target.display(), "store backed up");

        self.prune()?;
        Ok(Some(target))
    }

    /// Existing backups, oldest first.
    pub fn list(&self) -> StoreResult<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.dir, e)),
        };

        let mut backups: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| is_backup(path))
            .collect();
        // Stamps sort lexicographically in time order.
        backups.sort();
        Ok(backups)
    }

    fn prune(&self) -> StoreResult<()> {
        let backups = self.list()?;
        let excess = backups.len().saturating_sub(self.retain);
        for old in &backups[..excess] {
            fs::remove_file(old).map_err(|e| StoreError::io(old, e))?;
            tracing::debug!(backup = %old.display(), "old backup removed");
        }
        Ok(())
    }
}

fn is_backup(path: &Path) -> bool {
    let name_ok = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(PREFIX));
    let ext_ok = path.extension().and_then(|e| e.to_str()) == Some(EXTENSION);
    name_ok && ext_ok && path.is_file()
}
