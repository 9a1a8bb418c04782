//! Filter and sort criteria supplied by the presentation layer

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::ErrorCode;

/// Criteria rejected before evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CriteriaError {
    #[error("min price {min} exceeds max price {max}")]
    PriceRange { min: f64, max: f64 },

    #[error("min volume {min} exceeds max volume {max}")]
    VolumeRange { min: f64, max: f64 },

    #[error("bound '{field}' is not a number")]
    NotANumber { field: &'static str },

    #[error("unknown sort key '{0}'")]
    UnknownSortKey(String),

    #[error("unknown sort order '{0}'")]
    UnknownSortOrder(String),
}

impl CriteriaError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::PriceRange { .. } => ErrorCode::InvalidPriceRange,
            Self::VolumeRange { .. } => ErrorCode::InvalidVolumeRange,
            Self::NotANumber { .. } => ErrorCode::InvalidCriteria,
            Self::UnknownSortKey(_) => ErrorCode::UnknownSortKey,
            Self::UnknownSortOrder(_) => ErrorCode::UnknownSortOrder,
        }
    }
}

/// Filter criteria
///
/// Every bound is optional; `None` means unconstrained, not zero. Empty
/// substrings and an empty category selection also mean unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub id_substring: String,
    pub name_substring: String,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_volume: Option<f64>,
    pub max_volume: Option<f64>,
    pub in_stock_only: bool,
    pub selected_categories: BTreeSet<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id_contains(mut self, needle: impl Into<String>) -> Self {
        self.id_substring = needle.into();
        self
    }

    pub fn name_contains(mut self, needle: impl Into<String>) -> Self {
        self.name_substring = needle.into();
        self
    }

    pub fn price_between(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn volume_between(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_volume = min;
        self.max_volume = max;
        self
    }

    pub fn in_stock_only(mut self, in_stock_only: bool) -> Self {
        self.in_stock_only = in_stock_only;
        self
    }

    pub fn in_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Reject bounds the pipeline cannot honor
    pub fn validate(&self) -> Result<(), CriteriaError> {
        let bounds = [
            ("min_price", self.min_price),
            ("max_price", self.max_price),
            ("min_volume", self.min_volume),
            ("max_volume", self.max_volume),
        ];
        for (field, bound) in bounds {
            if bound.is_some_and(f64::is_nan) {
                return Err(CriteriaError::NotANumber { field });
            }
        }

        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            return Err(CriteriaError::PriceRange { min, max });
        }
        if let (Some(min), Some(max)) = (self.min_volume, self.max_volume)
            && min > max
        {
            return Err(CriteriaError::VolumeRange { min, max });
        }
        Ok(())
    }
}

/// Sortable column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Id,
    Name,
    Price,
    Volume,
    Stock,
    Categories,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Price => "price",
            Self::Volume => "volume",
            Self::Stock => "stock",
            Self::Categories => "categories",
        }
    }
}

impl FromStr for SortKey {
    type Err = CriteriaError;

    /// Accepts column names and the source field codes (`PRI`, `VOL`, `LGA`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            "price" | "pri" => Ok(Self::Price),
            "volume" | "vol" => Ok(Self::Volume),
            "stock" | "lga" => Ok(Self::Stock),
            "categories" | "category" => Ok(Self::Categories),
            _ => Err(CriteriaError::UnknownSortKey(s.to_string())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

impl FromStr for SortOrder {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            _ => Err(CriteriaError::UnknownSortOrder(s.to_string())),
        }
    }
}

/// Sort criteria, defaulting to id ascending
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortCriteria {
    pub key: SortKey,
    pub order: SortOrder,
}

impl SortCriteria {
    pub fn new(key: SortKey, order: SortOrder) -> Self {
        Self { key, order }
    }

    pub fn ascending(key: SortKey) -> Self {
        Self::new(key, SortOrder::Ascending)
    }

    pub fn descending(key: SortKey) -> Self {
        Self::new(key, SortOrder::Descending)
    }

    /// Parse the string pair a form hands over, e.g. `("price", "desc")`
    pub fn parse(key: &str, order: &str) -> Result<Self, CriteriaError> {
        Ok(Self::new(key.parse()?, order.parse()?))
    }

    /// Column-header click: same key flips the order, a new key starts ascending
    ///
    /// The order is not flipped on every click. Moving to another column
    /// from a descending sort yields an ascending sort on that column.
    pub fn toggle(self, key: SortKey) -> Self {
        if self.key == key {
            Self::new(key, self.order.flipped())
        } else {
            Self::ascending(key)
        }
    }
}
