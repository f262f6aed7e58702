//! `stockledger-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no IO): identifiers, the
//! domain error model and two-decimal amount helpers.

pub mod amount;
pub mod error;
pub mod id;

pub use amount::{average_unit_value, round2};
pub use error::{DomainError, DomainResult};
pub use id::{IdPolicy, RecordId};
