use crate::line_item::{LineItem, Tag};
use crate::warnings::DataQualityWarning;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct LineItemValidationError {
    message: String,
}

impl LineItemValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

fn check_non_negative(item_id: i32, field: &str, value: f64) -> Result<(), LineItemValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(LineItemValidationError::new(format!(
            "item {item_id} has invalid {field} {value} (must be a non-negative number)"
        )));
    }
    Ok(())
}

pub fn validate_tag(item_id: i32, tag: &Tag) -> Result<(), LineItemValidationError> {
    if let Some(quantity) = tag.quantity {
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(LineItemValidationError::new(format!(
                "item {item_id} tag '{}' has invalid quantity {quantity}",
                tag.name
            )));
        }
    }
    Ok(())
}

/// Input checks applied by the editing layer before an item reaches the
/// calculators. Over-allocated tags and negative wastage are left to
/// [`advisories`].
pub fn validate_line_item(item: &LineItem) -> Result<(), LineItemValidationError> {
    check_non_negative(item.id, "quantity", item.quantity)?;
    check_non_negative(item.id, "unit_labor_cost", item.unit_labor_cost)?;
    check_non_negative(item.id, "unit_material_cost", item.unit_material_cost)?;
    if !item.wastage.is_finite() {
        return Err(LineItemValidationError::new(format!(
            "item {} has invalid wastage {}",
            item.id, item.wastage
        )));
    }
    for tag in &item.tags {
        validate_tag(item.id, tag)?;
    }
    Ok(())
}

pub fn validate_line_items(items: &[LineItem]) -> Result<(), LineItemValidationError> {
    let mut seen_ids = HashSet::with_capacity(items.len());
    for item in items {
        if !seen_ids.insert(item.id) {
            return Err(LineItemValidationError::new(format!(
                "duplicate line item id {}",
                item.id
            )));
        }
        validate_line_item(item)?;
    }
    Ok(())
}

/// Item-level findings that do not depend on tag aggregation.
pub fn advisories(items: &[LineItem]) -> Vec<DataQualityWarning> {
    items
        .iter()
        .filter(|item| item.wastage < 0.0)
        .map(|item| DataQualityWarning::NegativeWastage {
            item_id: item.id,
            wastage: item.wastage,
        })
        .collect()
}
