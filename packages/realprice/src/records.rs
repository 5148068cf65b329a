//! Data model for the pipeline stages.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row from a merged source document: an open mapping of column name to
/// raw cell text. Schemas vary per document; a column absent in a given
/// source is simply an absent key.
pub type RawRecord = HashMap<String, String>;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Transaction category derived from the transaction-subject text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Building,
    Land,
    Other,
}

impl Category {
    /// Human-readable name for display.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Building => "building",
            Category::Land => "land",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A normalized transaction row.
///
/// Every clean record carries a valid transaction date and unit price;
/// rows that fail either are dropped during normalization. The age is
/// never negative and is always 0 for land.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanRecord {
    /// Transaction date decoded from the ROC calendar encoding.
    pub transaction_date: NaiveDate,
    /// Unit price in ten-thousand NT$ per ping.
    pub unit_price_per_ping: f64,
    /// Total price in NT$, when the source supplied one.
    pub total_price: Option<f64>,
    pub category: Category,
    /// Building age in whole years.
    pub building_age_years: u32,
    /// Free-text address as carried by the source.
    pub address: String,
    /// Present only when the source row carried usable lat/lon columns.
    /// Records are never geocoded individually.
    pub coordinates: Option<Coordinates>,
}

/// A clean record that passed the geo filter, with its distance from the
/// query center.
#[derive(Debug, Clone, Serialize)]
pub struct FilteredRecord {
    pub record: CleanRecord,
    pub distance_km: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_names() {
        assert_eq!(Category::Building.name(), "building");
        assert_eq!(Category::Land.to_string(), "land");
        assert_eq!(Category::Other.to_string(), "other");
    }
}
