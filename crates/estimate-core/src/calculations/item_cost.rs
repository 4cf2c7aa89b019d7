use serde::{Deserialize, Serialize};

/// Derived cost fields of a single line item.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemCosts {
    pub quantity_with_wastage: f64,
    pub total_labor_cost: f64,
    pub total_material_cost: f64,
    pub item_cost: f64,
}

/// Prices one line item from its raw inputs.
///
/// No rounding is applied; currency rounding belongs to [`crate::format`].
/// Negative wastage is accepted and reduces the effective quantity.
pub fn compute(
    quantity: f64,
    wastage: f64,
    unit_labor_cost: f64,
    unit_material_cost: f64,
) -> ItemCosts {
    let quantity_with_wastage = quantity * (1.0 + wastage);
    let total_labor_cost = quantity_with_wastage * unit_labor_cost;
    let total_material_cost = quantity_with_wastage * unit_material_cost;
    ItemCosts {
        quantity_with_wastage,
        total_labor_cost,
        total_material_cost,
        item_cost: total_labor_cost + total_material_cost,
    }
}
