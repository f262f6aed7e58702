//! Durable store layer: persistence of the full record set.
//!
//! The ledger never talks to disk; sessions hand `Ledger::records()` to a
//! [`DurableStore`] after every mutation.

pub mod backup;
pub mod error;
pub mod json_file;
pub mod store;

pub use backup::{BackupRotation, DEFAULT_RETAIN};
pub use error::{StoreError, StoreResult};
pub use json_file::JsonFileStore;
pub use store::{DurableStore, InMemoryStore};
