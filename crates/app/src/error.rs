use thiserror::Error;

use stockledger_core::DomainError;
use stockledger_store::StoreError;

pub type SessionResult<T> = Result<T, SessionError>;

/// Failure of a session operation, as surfaced to the operator.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The ledger rejected the operation; nothing was written.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The store could not be read or written. On save, the in-memory ledger
    /// is left at its previous state.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("no edit in progress")]
    NoEditInProgress,
}

impl SessionError {
    /// `true` when the referenced record does not exist (e.g. already deleted).
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::Domain(e) if e.is_not_found())
    }
}
