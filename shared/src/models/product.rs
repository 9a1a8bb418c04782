//! Product Model

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Attribute group holding the catalog metrics
pub const METRICS_GROUP: &str = "AGA";
/// Price field code
pub const PRICE_CODE: &str = "PRI";
/// Volume field code
pub const VOLUME_CODE: &str = "VOL";
/// Stock quantity field code
pub const STOCK_CODE: &str = "LGA";

/// Field code -> value
pub type AttributeGroup = HashMap<String, Value>;

/// Product record as delivered by a product source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Attribute group name -> field code -> value
    #[serde(default, alias = "extra")]
    pub attributes: HashMap<String, AttributeGroup>,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            attributes: HashMap::new(),
        }
    }

    /// Stand-in for an id the source has no record of
    ///
    /// Empty name and zeroed metrics, so filters and sorts see a neutral
    /// product rather than a missing one.
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self::new(id, "").with_metrics(0.0, 0.0, 0.0)
    }

    pub fn with_field(
        mut self,
        group: impl Into<String>,
        code: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.attributes
            .entry(group.into())
            .or_default()
            .insert(code.into(), value.into());
        self
    }

    pub fn with_metrics(self, price: f64, volume: f64, stock: f64) -> Self {
        self.with_field(METRICS_GROUP, PRICE_CODE, price)
            .with_field(METRICS_GROUP, VOLUME_CODE, volume)
            .with_field(METRICS_GROUP, STOCK_CODE, stock)
    }

    /// Numeric value of a field
    ///
    /// Sources send numbers either as JSON numbers or as numeric strings.
    /// Anything else, including non-finite values, reads as absent.
    pub fn field(&self, group: &str, code: &str) -> Option<f64> {
        let value = self.attributes.get(group)?.get(code)?;
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        number.filter(|n| n.is_finite())
    }

    pub fn price(&self) -> f64 {
        self.field(METRICS_GROUP, PRICE_CODE).unwrap_or(0.0)
    }

    pub fn volume(&self) -> f64 {
        self.field(METRICS_GROUP, VOLUME_CODE).unwrap_or(0.0)
    }

    pub fn stock(&self) -> f64 {
        self.field(METRICS_GROUP, STOCK_CODE).unwrap_or(0.0)
    }

    pub fn in_stock(&self) -> bool {
        self.stock() > 0.0
    }
}
