use serde::{Deserialize, Serialize};
use std::fmt;

/// Advisory findings about the item set. They never stop a computation;
/// callers decide whether to show them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    TagQuantityExceedsItem {
        item_id: i32,
        tag_name: String,
        tag_quantity: f64,
        item_quantity: f64,
    },
    MissingTagName {
        item_id: i32,
        tag_index: usize,
    },
    /// Proration ratio was forced to zero because the item has no quantity.
    ZeroQuantityItem {
        item_id: i32,
        tag_name: String,
    },
    NegativeWastage {
        item_id: i32,
        wastage: f64,
    },
}

impl DataQualityWarning {
    pub fn item_id(&self) -> i32 {
        match self {
            DataQualityWarning::TagQuantityExceedsItem { item_id, .. }
            | DataQualityWarning::MissingTagName { item_id, .. }
            | DataQualityWarning::ZeroQuantityItem { item_id, .. }
            | DataQualityWarning::NegativeWastage { item_id, .. } => *item_id,
        }
    }
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityWarning::TagQuantityExceedsItem {
                item_id,
                tag_name,
                tag_quantity,
                item_quantity,
            } => write!(
                f,
                "item {item_id} tag '{tag_name}' quantity {tag_quantity} exceeds item quantity {item_quantity}"
            ),
            DataQualityWarning::MissingTagName { item_id, tag_index } => {
                write!(f, "item {item_id} tag #{tag_index} has no name and was skipped")
            }
            DataQualityWarning::ZeroQuantityItem { item_id, tag_name } => write!(
                f,
                "item {item_id} has zero quantity; tag '{tag_name}' contributes nothing"
            ),
            DataQualityWarning::NegativeWastage { item_id, wastage } => {
                write!(f, "item {item_id} has negative wastage {wastage}")
            }
        }
    }
}
