//! Operator session: the entry point used by the form layer.

use chrono::{DateTime, Utc};

use stockledger_core::{DomainResult, RecordId};
use stockledger_ledger::{
    FilterField, Ledger, LedgerPolicy, StockFields, StockFilter, StockRecord, Upsert,
};
use stockledger_store::DurableStore;

use crate::error::{SessionError, SessionResult};

/// The record an operator has opened for editing, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditContext {
    target: Option<RecordId>,
}

impl EditContext {
    pub fn target(&self) -> Option<&RecordId> {
        self.target.as_ref()
    }
}

/// One operator's view of the ledger, bound to a durable store.
///
/// Every mutation runs on a working copy of the ledger, is flushed to the store
/// in full, and only then replaces the session's ledger. A failed save leaves
/// the session exactly as it was.
#[derive(Debug)]
pub struct Session<S: DurableStore> {
    store: S,
    ledger: Ledger,
    edit: EditContext,
    clock: fn() -> DateTime<Utc>,
}

impl<S: DurableStore> Session<S> {
    /// Load the ledger from `store`.
    pub fn open(store: S, policy: LedgerPolicy) -> SessionResult<Self> {
        let records = store.load()?;
        let (ledger, report) = Ledger::from_records(records, policy);
        for repair in &report.ids {
            tracing::warn!(
                previous = %repair.previous,
                assigned = %repair.assigned,
                "record id reassigned on load"
            );
        }
        for repair in &report.amounts {
            tracing::warn!(
                id = %repair.id,
                field = repair.field.as_str(),
                previous = repair.previous,
                "invalid amount reset to zero on load"
            );
        }
        tracing::info!(records = ledger.len(), "ledger opened");

        Ok(Self {
            store,
            ledger,
            edit: EditContext::default(),
            clock: Utc::now,
        })
    }

    /// Replace the wall clock (tests, replays).
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn edit_context(&self) -> &EditContext {
        &self.edit
    }

    /// Record a purchase (new record or replenishment).
    pub fn submit(&mut self, fields: &StockFields) -> SessionResult<Upsert> {
        let outcome = self.mutate(|ledger, now| ledger.submit(fields, now))?;
        tracing::info!(
            id = %outcome.record().id(),
            merged = outcome.is_merged(),
            quantity = outcome.record().quantity(),
            total_value = outcome.record().total_value(),
            "stock submitted"
        );
        Ok(outcome)
    }

    pub fn edit(&mut self, id: &RecordId, fields: &StockFields) -> SessionResult<StockRecord> {
        let record = self.mutate(|ledger, now| ledger.edit(id, fields, now))?;
        tracing::info!(id = %record.id(), "record edited");
        Ok(record)
    }

    /// Delete a record. A second delete of the same id fails with not-found,
    /// which callers should read as "already gone".
    pub fn delete(&mut self, id: &RecordId) -> SessionResult<StockRecord> {
        let removed = self.mutate(|ledger, _| ledger.delete(id))?;
        if self.edit.target.as_ref() == Some(id) {
            self.edit.target = None;
        }
        tracing::info!(id = %removed.id(), "record deleted");
        Ok(removed)
    }

    pub fn list<'a>(&'a self, filter: &'a StockFilter) -> impl Iterator<Item = &'a StockRecord> + 'a {
        tracing::debug!(?filter, "listing records");
        self.ledger.list(filter)
    }

    pub fn distinct_values(&self, field: FilterField) -> Vec<String> {
        self.ledger.distinct_values(field)
    }

    /// Open `id` for editing and return its current fields to pre-fill a form.
    pub fn begin_edit(&mut self, id: &RecordId) -> SessionResult<StockFields> {
        let record = self
            .ledger
            .get(id)
            .ok_or_else(|| stockledger_core::DomainError::not_found(id))?;
        let fields = record.fields();
        self.edit.target = Some(id.clone());
        tracing::debug!(%id, "edit started");
        Ok(fields)
    }

    /// Apply `fields` to the record opened with [`Session::begin_edit`].
    ///
    /// The edit target is kept when the edit fails, so the operator can fix
    /// the form and retry.
    pub fn commit_edit(&mut self, fields: &StockFields) -> SessionResult<StockRecord> {
        let id = self.edit.target.clone().ok_or(SessionError::NoEditInProgress)?;
        let record = self.edit(&id, fields)?;
        self.edit.target = None;
        Ok(record)
    }

    pub fn cancel_edit(&mut self) {
        self.edit.target = None;
    }

    fn mutate<T>(
        &mut self,
        op: impl FnOnce(&mut Ledger, DateTime<Utc>) -> DomainResult<T>,
    ) -> SessionResult<T> {
        let mut working = self.ledger.clone();
        let out = op(&mut working, (self.clock)())?;
        if let Err(err) = self.store.save(working.records()) {
            tracing::error!(error = %err, "save failed; change not applied");
            return Err(err.into());
        }
        self.ledger = working;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use std::sync::Arc;

    use stockledger_core::DomainError;
    use stockledger_ledger::{Category, MatchPolicy, Unit, Usage};
    use stockledger_store::{BackupRotation, InMemoryStore, JsonFileStore};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 14, 30, 0).unwrap()
    }

    fn vinho(quantity: f64, total_value: f64) -> StockFields {
        StockFields {
            usage: Usage::ForSale,
            category: Category::Beverage,
            product: "Vinho".to_string(),
            sub_product: String::new(),
            brand: "Miolo".to_string(),
            commercial_name: "Reserva".to_string(),
            quantity,
            unit: Unit::Kilogram,
            total_value,
        }
    }

    fn memory_session() -> (Arc<InMemoryStore>, Session<Arc<InMemoryStore>>) {
        let store = Arc::new(InMemoryStore::new());
        let session = Session::open(Arc::clone(&store), LedgerPolicy::default())
            .unwrap()
            .with_clock(fixed_now);
        (store, session)
    }

    #[test]
    fn every_mutation_is_flushed() {
        let (store, mut session) = memory_session();

        session.submit(&vinho(2.0, 100.0)).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);

        let merged = session.submit(&vinho(1.0, 40.0)).unwrap();
        assert!(merged.is_merged());
        let stored = store.load().unwrap();
        assert_eq!(stored[0].quantity(), 3.0);
        assert_eq!(stored[0].average_unit_value(), 46.67);
        assert_eq!(stored[0].updated_at(), fixed_now());

        session.delete(&RecordId::Sequential(1)).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn domain_errors_do_not_touch_the_store() {
        let (store, mut session) = memory_session();
        session.submit(&vinho(2.0, 100.0)).unwrap();

        let err = session.submit(&vinho(-1.0, 10.0)).unwrap_err();
        assert!(matches!(err, SessionError::Domain(DomainError::Validation(_))));
        assert_eq!(store.load().unwrap()[0].quantity(), 2.0);
    }

    #[test]
    fn double_delete_reports_not_found() {
        let (_store, mut session) = memory_session();
        session.submit(&vinho(2.0, 100.0)).unwrap();

        let id = RecordId::Sequential(1);
        session.delete(&id).unwrap();
        let err = session.delete(&id).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn edit_flow_uses_session_context() {
        let (store, mut session) = memory_session();
        session.submit(&vinho(2.0, 100.0)).unwrap();

        let id = RecordId::Sequential(1);
        let mut fields = session.begin_edit(&id).unwrap();
        assert_eq!(session.edit_context().target(), Some(&id));
        assert_eq!(fields.total_value, 100.0);

        fields.total_value = 80.0;
        let edited = session.commit_edit(&fields).unwrap();
        assert_eq!(edited.average_unit_value(), 40.0);
        assert!(session.edit_context().target().is_none());
        assert_eq!(store.load().unwrap()[0].total_value(), 80.0);
    }

    #[test]
    fn commit_without_begin_is_rejected() {
        let (_store, mut session) = memory_session();
        let err = session.commit_edit(&vinho(1.0, 1.0)).unwrap_err();
        assert!(matches!(err, SessionError::NoEditInProgress));
    }

    #[test]
    fn failed_commit_keeps_target() {
        let (_store, mut session) = memory_session();
        session.submit(&vinho(2.0, 100.0)).unwrap();
        session.begin_edit(&RecordId::Sequential(1)).unwrap();

        assert!(session.commit_edit(&vinho(1.5, 10.0)).is_err());
        assert_eq!(session.edit_context().target(), Some(&RecordId::Sequential(1)));

        session.cancel_edit();
        assert!(session.edit_context().target().is_none());
    }

    #[test]
    fn deleting_the_edit_target_clears_it() {
        let (_store, mut session) = memory_session();
        session.submit(&vinho(2.0, 100.0)).unwrap();
        let id = RecordId::Sequential(1);
        session.begin_edit(&id).unwrap();
        session.delete(&id).unwrap();
        assert!(session.edit_context().target().is_none());
    }

    #[test]
    fn begin_edit_on_missing_record_is_not_found() {
        let (_store, mut session) = memory_session();
        let err = session.begin_edit(&RecordId::Sequential(3)).unwrap_err();
        assert!(err.is_not_found());
        assert!(session.edit_context().target().is_none());
    }

    #[test]
    fn failed_save_leaves_session_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        // A directory squatting on the temp file name makes every save fail.
        fs::create_dir(tmp.path().join("stock.json.tmp")).unwrap();

        let store = JsonFileStore::new(tmp.path().join("stock.json"));
        let mut session = Session::open(store, LedgerPolicy::default()).unwrap();

        let err = session.submit(&vinho(2.0, 100.0)).unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));
        assert!(session.ledger().is_empty());
    }

    #[test]
    fn reopening_a_file_store_restores_the_ledger() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("stock.json");
        let backups = BackupRotation::new(tmp.path().join("backups"));
        let policy = LedgerPolicy::default().with_match_policy(MatchPolicy::StrictKey);

        {
            let store = JsonFileStore::new(&path).with_backups(backups.clone());
            let mut session = Session::open(store, policy).unwrap();
            session.submit(&vinho(2.0, 100.0)).unwrap();
            session.submit(&vinho(1.0, 40.0)).unwrap();
        }

        let reopened = Session::open(JsonFileStore::new(&path), policy).unwrap();
        let records = reopened.ledger().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_value(), 140.0);
        assert_eq!(backups.list().unwrap().len(), 1);
    }

    #[test]
    fn corrupt_store_opens_empty_and_recovers_on_next_save() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("stock.json");
        fs::write(&path, "<<garbage>>").unwrap();

        let mut session = Session::open(JsonFileStore::new(&path), LedgerPolicy::default()).unwrap();
        assert!(session.ledger().is_empty());

        session.submit(&vinho(2.0, 100.0)).unwrap();
        let reopened = Session::open(JsonFileStore::new(&path), LedgerPolicy::default()).unwrap();
        assert_eq!(reopened.ledger().len(), 1);
    }

    #[test]
    fn list_and_dropdown_values_follow_the_ledger() {
        let (_store, mut session) = memory_session();
        session.submit(&vinho(2.0, 100.0)).unwrap();
        let mut suco = vinho(1.0, 8.0);
        suco.product = "Suco".to_string();
        suco.commercial_name = "Uva integral".to_string();
        suco.brand = "Aurora".to_string();
        suco.category = Category::Food;
        session.submit(&suco).unwrap();

        let beverages = StockFilter::new().category(Category::Beverage);
        let found: Vec<_> = session.list(&beverages).map(|r| r.product()).collect();
        assert_eq!(found, vec!["Vinho"]);
        assert_eq!(session.distinct_values(FilterField::Brand), vec!["Aurora", "Miolo"]);
    }
}
