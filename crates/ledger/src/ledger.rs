use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};

use stockledger_core::{DomainError, DomainResult, IdPolicy, RecordId};

use crate::filter::{FilterField, StockFilter};
use crate::policy::LedgerPolicy;
use crate::record::{StockFields, StockRecord};

/// Outcome of [`Ledger::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum Upsert {
    /// No record matched; a new one was appended.
    Created(StockRecord),
    /// The submission was folded into an existing record.
    Merged(StockRecord),
}

impl Upsert {
    pub fn record(&self) -> &StockRecord {
        match self {
            Upsert::Created(r) | Upsert::Merged(r) => r,
        }
    }

    pub fn into_record(self) -> StockRecord {
        match self {
            Upsert::Created(r) | Upsert::Merged(r) => r,
        }
    }

    pub fn is_merged(&self) -> bool {
        matches!(self, Upsert::Merged(_))
    }
}

/// An id replaced while loading records (missing, malformed or duplicated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdRepair {
    pub previous: RecordId,
    pub assigned: RecordId,
}

/// Amount a stored record carried that cannot be kept (negative or not finite).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountField {
    Quantity,
    TotalValue,
}

impl AmountField {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmountField::Quantity => "quantity",
            AmountField::TotalValue => "total_value",
        }
    }
}

/// An amount reset to zero while loading records.
#[derive(Debug, Clone, PartialEq)]
pub struct AmountRepair {
    pub id: RecordId,
    pub field: AmountField,
    pub previous: f64,
}

/// Everything [`Ledger::from_records`] had to change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub ids: Vec<IdRepair>,
    pub amounts: Vec<AmountRepair>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.ids.is_empty() && self.amounts.is_empty()
    }
}

/// The authoritative in-memory set of stock records for a session.
///
/// Records keep insertion order. All operations are pure in-memory
/// transformations; the caller decides when to persist `records()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    records: Vec<StockRecord>,
    policy: LedgerPolicy,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new(policy: LedgerPolicy) -> Self {
        Self {
            records: Vec::new(),
            policy,
        }
    }

    /// Rebuild a ledger from stored records.
    ///
    /// Restores the record invariants: ids that cannot be kept under the active
    /// id policy are reassigned, negative or non-finite amounts are reset to
    /// zero, averages are recomputed and `updated_at` is clamped to
    /// `registered_at`. Every id or amount change is listed in the report.
    pub fn from_records(records: Vec<StockRecord>, policy: LedgerPolicy) -> (Self, LoadReport) {
        let mut ledger = Self::new(policy);
        let mut report = LoadReport::default();
        let mut seen: HashSet<RecordId> = HashSet::with_capacity(records.len());
        let mut next_seq = records
            .iter()
            .filter_map(|r| r.id.as_sequential())
            .max()
            .unwrap_or(0)
            + 1;

        for mut record in records {
            let allowed = match policy.id_policy {
                IdPolicy::Sequential => record.id.is_sequential(),
                IdPolicy::Token => !record.id.is_missing(),
            };
            let keep = allowed && !seen.contains(&record.id);

            if !keep {
                let assigned = match policy.id_policy {
                    IdPolicy::Sequential => {
                        let id = RecordId::Sequential(next_seq);
                        next_seq += 1;
                        id
                    }
                    IdPolicy::Token => fresh_token(&seen),
                };
                report.ids.push(IdRepair {
                    previous: record.id.clone(),
                    assigned: assigned.clone(),
                });
                record.id = assigned;
            }

            for field in [AmountField::Quantity, AmountField::TotalValue] {
                let value = match field {
                    AmountField::Quantity => &mut record.quantity,
                    AmountField::TotalValue => &mut record.total_value,
                };
                if !value.is_finite() || *value < 0.0 {
                    report.amounts.push(AmountRepair {
                        id: record.id.clone(),
                        field,
                        previous: *value,
                    });
                    *value = 0.0;
                }
            }

            record.recompute_average();
            if record.updated_at < record.registered_at {
                record.updated_at = record.registered_at;
            }
            seen.insert(record.id.clone());
            ledger.records.push(record);
        }

        (ledger, report)
    }

    pub fn policy(&self) -> &LedgerPolicy {
        &self.policy
    }

    pub fn records(&self) -> &[StockRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<StockRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &RecordId) -> Option<&StockRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Next sequential id: `1` for an empty ledger, otherwise one past the
    /// largest sequential id. Deleting the current maximum frees it for reuse;
    /// gaps below the maximum are never refilled.
    pub fn next_id(&self) -> u64 {
        self.records
            .iter()
            .filter_map(|r| r.id.as_sequential())
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Record a purchase: merge into the matching record, or append a new one.
    pub fn submit(&mut self, fields: &StockFields, now: DateTime<Utc>) -> DomainResult<Upsert> {
        let fields = fields.validated(self.policy.integral_units, false)?;

        if let Some(pos) = self.find_match(&fields) {
            let overwrite = self.policy.overwrite_descriptive;
            let record = &mut self.records[pos];
            if record.unit != fields.unit {
                return Err(DomainError::validation(format!(
                    "record {} is kept in {}, submission is in {}",
                    record.id, record.unit, fields.unit
                )));
            }
            record.merge(&fields, overwrite, now);
            return Ok(Upsert::Merged(record.clone()));
        }

        let id = self.allocate_id();
        let record = StockRecord::create(id, fields, now);
        self.records.push(record.clone());
        Ok(Upsert::Created(record))
    }

    /// Replace every mutable field of an existing record.
    pub fn edit(
        &mut self,
        id: &RecordId,
        fields: &StockFields,
        now: DateTime<Utc>,
    ) -> DomainResult<StockRecord> {
        let pos = self.position(id)?;
        let fields = fields.validated(self.policy.integral_units, true)?;
        let record = &mut self.records[pos];
        record.replace(fields, now);
        Ok(record.clone())
    }

    /// Remove a record, returning it.
    pub fn delete(&mut self, id: &RecordId) -> DomainResult<StockRecord> {
        let pos = self.position(id)?;
        Ok(self.records.remove(pos))
    }

    /// Records satisfying `filter`, in insertion order.
    pub fn list<'a>(&'a self, filter: &'a StockFilter) -> impl Iterator<Item = &'a StockRecord> + 'a {
        self.records.iter().filter(move |r| filter.matches(r))
    }

    /// Sorted, de-duplicated, non-empty values of `field`.
    pub fn distinct_values(&self, field: FilterField) -> Vec<String> {
        self.records
            .iter()
            .map(|r| field.value_of(r))
            .filter(|v| !v.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn position(&self, id: &RecordId) -> DomainResult<usize> {
        self.records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| DomainError::not_found(id))
    }

    fn find_match(&self, fields: &StockFields) -> Option<usize> {
        let key = self.policy.match_policy.key_of(fields)?;
        self.records
            .iter()
            .position(|r| self.policy.match_policy.record_key(r).as_ref() == Some(&key))
    }

    fn allocate_id(&self) -> RecordId {
        match self.policy.id_policy {
            IdPolicy::Sequential => RecordId::Sequential(self.next_id()),
            IdPolicy::Token => {
                let taken: HashSet<RecordId> = self.records.iter().map(|r| r.id.clone()).collect();
                fresh_token(&taken)
            }
        }
    }
}

fn fresh_token(taken: &HashSet<RecordId>) -> RecordId {
    loop {
        let id = RecordId::new_token();
        if !taken.contains(&id) {
            return id;
        }
    }
}
