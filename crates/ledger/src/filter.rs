//! List filters.

use serde::{Deserialize, Serialize};

use crate::record::{Category, StockRecord, Usage};

/// Filterable record field, also used to collect dropdown options.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    Usage,
    Category,
    Product,
    SubProduct,
    Brand,
    CommercialName,
}

impl FilterField {
    pub fn value_of<'a>(&self, record: &'a StockRecord) -> &'a str {
        match self {
            FilterField::Usage => record.usage().as_str(),
            FilterField::Category => record.category().as_str(),
            FilterField::Product => record.product(),
            FilterField::SubProduct => record.sub_product(),
            FilterField::Brand => record.brand(),
            FilterField::CommercialName => record.commercial_name(),
        }
    }
}

/// Conjunction of optional constraints. The default filter matches everything.
///
/// Text constraints are exact equality; `search` is a case-insensitive
/// substring match over commercial name, product and brand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockFilter {
    pub usage: Option<Usage>,
    pub category: Option<Category>,
    pub product: Option<String>,
    pub sub_product: Option<String>,
    pub brand: Option<String>,
    pub commercial_name: Option<String>,
    pub search: Option<String>,
}

impl StockFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    pub fn sub_product(mut self, sub_product: impl Into<String>) -> Self {
        self.sub_product = Some(sub_product.into());
        self
    }

    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn commercial_name(mut self, commercial_name: impl Into<String>) -> Self {
        self.commercial_name = Some(commercial_name.into());
        self
    }

    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    pub fn matches(&self, record: &StockRecord) -> bool {
        fn eq(expected: &Option<String>, actual: &str) -> bool {
            expected.as_deref().is_none_or(|e| e == actual)
        }

        if self.usage.is_some_and(|u| u != record.usage()) {
            return false;
        }
        if self.category.is_some_and(|c| c != record.category()) {
            return false;
        }
        if !(eq(&self.product, record.product())
            && eq(&self.sub_product, record.sub_product())
            && eq(&self.brand, record.brand())
            && eq(&self.commercial_name, record.commercial_name()))
        {
            return false;
        }

        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                [record.commercial_name(), record.product(), record.brand()]
                    .iter()
                    .any(|hay| hay.to_lowercase().contains(&needle))
            }
        }
    }
}
