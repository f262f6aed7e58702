use std::sync::{Arc, RwLock};

use stockledger_ledger::StockRecord;

use crate::error::{StoreError, StoreResult};

/// Persistence boundary for the ledger: the full record set is read and
/// written as a unit.
pub trait DurableStore: Send + Sync {
    /// Load every record. A missing store yields an empty set; so does a store
    /// that cannot be parsed.
    fn load(&self) -> StoreResult<Vec<StockRecord>>;

    /// Replace the stored set with `records`, atomically.
    fn save(&self, records: &[StockRecord]) -> StoreResult<()>;
}

impl<S> DurableStore for Arc<S>
where
    S: DurableStore + ?Sized,
{
    fn load(&self) -> StoreResult<Vec<StockRecord>> {
        (**self).load()
    }

    fn save(&self, records: &[StockRecord]) -> StoreResult<()> {
        (**self).save(records)
    }
}

/// In-memory store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Vec<StockRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<StockRecord>) -> Self {
        Self {
            inner: RwLock::new(records),
        }
    }
}

impl DurableStore for InMemoryStore {
    fn load(&self) -> StoreResult<Vec<StockRecord>> {
        match self.inner.read() {
            Ok(records) => Ok(records.clone()),
            Err(_) => Ok(Vec::new()),
        }
    }

    fn save(&self, records: &[StockRecord]) -> StoreResult<()> {
        let mut guard = self.inner.write().map_err(|_| {
            StoreError::io(
                "<memory>",
                std::io::Error::other("in-memory store lock poisoned"),
            )
        })?;
        *guard = records.to_vec();
        Ok(())
    }
}
