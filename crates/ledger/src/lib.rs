//! Stock ledger domain module.
//!
//! This crate contains the record identity and upsert/merge rules for stock
//! items, implemented purely as deterministic domain logic (no IO, no clock:
//! every mutating operation takes `now` from the caller).

pub mod filter;
pub mod ledger;
pub mod policy;
pub mod record;
pub mod timestamp;

pub use filter::{FilterField, StockFilter};
pub use ledger::{AmountField, AmountRepair, IdRepair, Ledger, LoadReport, Upsert};
pub use policy::{IntegralUnits, LedgerPolicy, MatchKey, MatchPolicy};
pub use record::{Category, StockFields, StockRecord, Unit, Usage};
