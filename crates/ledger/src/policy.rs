//! Deployment-level choices for how the ledger identifies and merges stock.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, IdPolicy};

use crate::record::{StockFields, StockRecord, Unit};

/// Which existing record, if any, a submission replenishes.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// `commercial_name` and `brand`, case-insensitive.
    ///
    /// A blank `commercial_name` is not a key: such purchases always create
    /// their own record, even when the brand matches another blank-named one.
    /// This departs from treating two blank names as identical.
    #[default]
    StrictKey,
    /// `product` alone, case-insensitive.
    Product,
    /// Never merge: one record per purchase event.
    AlwaysNew,
}

impl MatchPolicy {
    /// Normalized key for `fields`, or `None` when the submission can never
    /// merge under this policy.
    pub fn key_of(&self, fields: &StockFields) -> Option<MatchKey> {
        match self {
            MatchPolicy::StrictKey => {
                // An unnamed purchase has nothing to be matched on.
                if fields.commercial_name.trim().is_empty() {
                    return None;
                }
                Some(MatchKey::new([fields.commercial_name.as_str(), fields.brand.as_str()]))
            }
            MatchPolicy::Product => Some(MatchKey::new([fields.product.as_str()])),
            MatchPolicy::AlwaysNew => None,
        }
    }

    pub(crate) fn record_key(&self, record: &StockRecord) -> Option<MatchKey> {
        match self {
            MatchPolicy::StrictKey => {
                if record.commercial_name().trim().is_empty() {
                    return None;
                }
                Some(MatchKey::new([record.commercial_name(), record.brand()]))
            }
            MatchPolicy::Product => Some(MatchKey::new([record.product()])),
            MatchPolicy::AlwaysNew => None,
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" | "strict_key" => Ok(Self::StrictKey),
            "product" => Ok(Self::Product),
            "always_new" | "none" => Ok(Self::AlwaysNew),
            other => Err(DomainError::validation(format!("unknown match policy: {other}"))),
        }
    }
}

/// Case-folded, trimmed identity key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchKey(Vec<String>);

impl MatchKey {
    fn new<'a>(parts: impl IntoIterator<Item = &'a str>) -> Self {
        Self(parts.into_iter().map(|p| p.trim().to_lowercase()).collect())
    }
}

/// Units whose quantity must be a whole number.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegralUnits {
    /// Only `Unit` is counted.
    UnitOnly,
    /// `Kilogram` and `Unit` are both counted in whole numbers.
    #[default]
    KilogramAndUnit,
}

impl IntegralUnits {
    pub fn requires_whole(&self, unit: Unit) -> bool {
        match self {
            IntegralUnits::UnitOnly => unit == Unit::Unit,
            IntegralUnits::KilogramAndUnit => matches!(unit, Unit::Unit | Unit::Kilogram),
        }
    }
}

impl FromStr for IntegralUnits {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unit" | "unit_only" => Ok(Self::UnitOnly),
            "kilogram_and_unit" | "kg_and_unit" => Ok(Self::KilogramAndUnit),
            other => Err(DomainError::validation(format!("unknown integral units: {other}"))),
        }
    }
}

/// Full policy set for one ledger.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerPolicy {
    pub id_policy: IdPolicy,
    pub match_policy: MatchPolicy,
    pub integral_units: IntegralUnits,
    /// On merge, also replace the descriptive fields with the submitted ones.
    pub overwrite_descriptive: bool,
}

impl LedgerPolicy {
    pub fn with_id_policy(mut self, id_policy: IdPolicy) -> Self {
        self.id_policy = id_policy;
        self
    }

    pub fn with_match_policy(mut self, match_policy: MatchPolicy) -> Self {
        self.match_policy = match_policy;
        self
    }

    pub fn with_integral_units(mut self, integral_units: IntegralUnits) -> Self {
        self.integral_units = integral_units;
        self
    }

    pub fn with_overwrite_descriptive(mut self, overwrite: bool) -> Self {
        self.overwrite_descriptive = overwrite;
        self
    }
}
