use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, RecordId, amount};

use crate::policy::IntegralUnits;

/// What a stock item is kept for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Usage {
    #[serde(alias = "Interno")]
    Internal,
    #[serde(alias = "Venda")]
    ForSale,
}

impl Usage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Usage::Internal => "internal",
            Usage::ForSale => "for_sale",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[serde(alias = "Alimento")]
    Food,
    #[serde(alias = "Bebida")]
    Beverage,
    #[serde(alias = "Outros")]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Beverage => "beverage",
            Category::Other => "other",
        }
    }
}

/// Unit of measure for a record's quantity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "kg", alias = "Kg", alias = "KG")]
    Kilogram,
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "ml")]
    Milliliter,
    #[serde(rename = "unit", alias = "un")]
    Unit,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Kilogram => "kg",
            Unit::Gram => "g",
            Unit::Milliliter => "ml",
            Unit::Unit => "unit",
        }
    }
}

impl core::fmt::Display for Unit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Field values collected for a submission or an edit.
///
/// An edit re-submits the full set; there is no partial patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockFields {
    pub usage: Usage,
    pub category: Category,
    pub product: String,
    #[serde(default)]
    pub sub_product: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub commercial_name: String,
    pub quantity: f64,
    pub unit: Unit,
    pub total_value: f64,
}

impl StockFields {
    /// Check ranges and units, returning the normalized field set (trimmed text,
    /// amounts at two decimals).
    ///
    /// `allow_zero_quantity` is set for edits, which may zero out a record.
    pub(crate) fn validated(
        &self,
        integral_units: IntegralUnits,
        allow_zero_quantity: bool,
    ) -> DomainResult<StockFields> {
        let product = self.product.trim();
        if product.is_empty() {
            return Err(DomainError::validation("product cannot be empty"));
        }

        if !self.quantity.is_finite() {
            return Err(DomainError::validation("quantity must be a finite number"));
        }
        if !self.total_value.is_finite() {
            return Err(DomainError::validation("total value must be a finite number"));
        }
        if self.total_value < 0.0 {
            return Err(DomainError::validation("total value cannot be negative"));
        }
        if self.quantity < 0.0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }

        if integral_units.requires_whole(self.unit) && !amount::is_whole(self.quantity) {
            return Err(DomainError::invalid_unit_quantity(
                self.unit.symbol(),
                self.quantity,
            ));
        }

        let quantity = amount::round2(self.quantity);
        if quantity == 0.0 && !allow_zero_quantity {
            return Err(DomainError::validation("quantity must be greater than zero"));
        }

        Ok(StockFields {
            usage: self.usage,
            category: self.category,
            product: product.to_string(),
            sub_product: self.sub_product.trim().to_string(),
            brand: self.brand.trim().to_string(),
            commercial_name: self.commercial_name.trim().to_string(),
            quantity,
            unit: self.unit,
            total_value: amount::round2(self.total_value),
        })
    }
}

/// One entry in the ledger.
///
/// Field names are written in English; the aliases read stores written by the
/// original Portuguese-language register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    #[serde(default = "RecordId::missing")]
    pub(crate) id: RecordId,
    #[serde(alias = "uso")]
    pub(crate) usage: Usage,
    #[serde(alias = "categoria")]
    pub(crate) category: Category,
    #[serde(alias = "produto")]
    pub(crate) product: String,
    #[serde(default, alias = "subproduto")]
    pub(crate) sub_product: String,
    #[serde(default, alias = "marca")]
    pub(crate) brand: String,
    #[serde(default, alias = "nome_comercial")]
    pub(crate) commercial_name: String,
    #[serde(alias = "quantidade")]
    pub(crate) quantity: f64,
    #[serde(alias = "unidade")]
    pub(crate) unit: Unit,
    #[serde(alias = "valor_total")]
    pub(crate) total_value: f64,
    #[serde(default, alias = "valor_medio")]
    pub(crate) average_unit_value: f64,
    #[serde(alias = "data_cadastro", deserialize_with = "crate::timestamp::deserialize")]
    pub(crate) registered_at: DateTime<Utc>,
    #[serde(alias = "data_atualizacao", deserialize_with = "crate::timestamp::deserialize")]
    pub(crate) updated_at: DateTime<Utc>,
}

impl StockRecord {
    /// Build a new record from already-validated fields.
    pub(crate) fn create(id: RecordId, fields: StockFields, now: DateTime<Utc>) -> Self {
        let mut record = Self {
            id,
            usage: fields.usage,
            category: fields.category,
            product: fields.product,
            sub_product: fields.sub_product,
            brand: fields.brand,
            commercial_name: fields.commercial_name,
            quantity: fields.quantity,
            unit: fields.unit,
            total_value: fields.total_value,
            average_unit_value: 0.0,
            registered_at: now,
            updated_at: now,
        };
        record.recompute_average();
        record
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn sub_product(&self) -> &str {
        &self.sub_product
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn commercial_name(&self) -> &str {
        &self.commercial_name
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn total_value(&self) -> f64 {
        self.total_value
    }

    pub fn average_unit_value(&self) -> f64 {
        self.average_unit_value
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Current mutable fields, e.g. to pre-fill an edit form.
    pub fn fields(&self) -> StockFields {
        StockFields {
            usage: self.usage,
            category: self.category,
            product: self.product.clone(),
            sub_product: self.sub_product.clone(),
            brand: self.brand.clone(),
            commercial_name: self.commercial_name.clone(),
            quantity: self.quantity,
            unit: self.unit,
            total_value: self.total_value,
        }
    }

    pub(crate) fn recompute_average(&mut self) {
        self.average_unit_value = amount::average_unit_value(self.total_value, self.quantity);
    }

    /// Set `updated_at`, never moving it before `registered_at`.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.registered_at);
    }

    /// Fold a replenishment into this record (cumulative weighted average).
    pub(crate) fn merge(&mut self, fields: &StockFields, overwrite_descriptive: bool, now: DateTime<Utc>) {
        self.quantity = amount::round2(self.quantity + fields.quantity);
        self.total_value = amount::round2(self.total_value + fields.total_value);
        if overwrite_descriptive {
            self.overwrite_descriptive(fields);
        }
        self.recompute_average();
        self.touch(now);
    }

    /// Replace every mutable field. `id` and `registered_at` are kept.
    pub(crate) fn replace(&mut self, fields: StockFields, now: DateTime<Utc>) {
        self.overwrite_descriptive(&fields);
        self.quantity = fields.quantity;
        self.unit = fields.unit;
        self.total_value = fields.total_value;
        self.recompute_average();
        self.touch(now);
    }

    fn overwrite_descriptive(&mut self, fields: &StockFields) {
        self.usage = fields.usage;
        self.category = fields.category;
        self.product = fields.product.clone();
        self.sub_product = fields.sub_product.clone();
        self.brand = fields.brand.clone();
        self.commercial_name = fields.commercial_name.clone();
    }
}
