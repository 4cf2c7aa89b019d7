use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateMetadata {
    pub project_name: String,
    pub project_description: String,
    pub plan_date: NaiveDate,
    #[serde(default)]
    pub estimator_name: String,
}

impl Default for EstimateMetadata {
    fn default() -> Self {
        Self {
            project_name: "New Estimate".to_string(),
            project_description: "No description".to_string(),
            plan_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            estimator_name: String::new(),
        }
    }
}

/// Markup and tax rates in whole-number percent (`45.0` is 45%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkupRates {
    pub overhead_markup_percentage: f64,
    pub labor_markup_percentage: f64,
    pub sales_tax_percentage: f64,
}

impl Default for MarkupRates {
    fn default() -> Self {
        Self {
            overhead_markup_percentage: 45.0,
            labor_markup_percentage: 45.0,
            sales_tax_percentage: 8.0,
        }
    }
}

impl MarkupRates {
    pub fn new(overhead: f64, labor: f64, sales_tax: f64) -> Self {
        Self {
            overhead_markup_percentage: overhead,
            labor_markup_percentage: labor,
            sales_tax_percentage: sales_tax,
        }
    }

    /// Typical rates offered as a starting point on the review screen.
    pub fn industry_average() -> Self {
        Self::new(42.0, 40.0, 7.5)
    }
}

/// Project-level figures that are entered directly rather than derived from
/// line items.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BidAdjustments {
    #[serde(default)]
    pub permit: f64,
    #[serde(default)]
    pub equip_rental: f64,
    #[serde(default)]
    pub labeling: f64,
    #[serde(default)]
    pub material_markup: f64,
}
