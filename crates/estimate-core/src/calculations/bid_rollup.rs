use crate::calculations::tag_breakdown::TagBreakdown;
use crate::metadata::{BidAdjustments, MarkupRates};
use serde::{Deserialize, Serialize};

/// Cost base for a bid: either the whole project or one tag.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BidInputs {
    pub direct_labor: f64,
    pub material_cost: f64,
    pub permit: f64,
    pub equip_rental: f64,
    pub labeling: f64,
    /// Supplied figure, not derived from the items.
    pub material_markup: f64,
}

impl BidInputs {
    pub fn new(direct_labor: f64, material_cost: f64, adjustments: &BidAdjustments) -> Self {
        Self {
            direct_labor,
            material_cost,
            permit: adjustments.permit,
            equip_rental: adjustments.equip_rental,
            labeling: adjustments.labeling,
            material_markup: adjustments.material_markup,
        }
    }

    /// A tag's own totals with the project-level add-ons left out.
    pub fn for_tag(breakdown: &TagBreakdown) -> Self {
        Self {
            direct_labor: breakdown.total_labor_cost,
            material_cost: breakdown.total_material_cost,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BidRollup {
    pub subtotal: f64,
    pub tax: f64,
    pub overhead_markup: f64,
    pub labor_markup: f64,
    pub total_material_cost: f64,
    pub total_labor_cost: f64,
    pub total_bid: f64,
    pub total_profit: f64,
    /// Ratio, not percent. Zero when the bid is zero.
    pub profit_margin: f64,
}

pub fn compute(inputs: &BidInputs, rates: &MarkupRates) -> BidRollup {
    let subtotal = inputs.material_cost + inputs.permit + inputs.equip_rental + inputs.labeling;
    let tax = subtotal * (rates.sales_tax_percentage / 100.0);
    let overhead_markup = inputs.direct_labor * (rates.overhead_markup_percentage / 100.0);
    let labor_markup = inputs.direct_labor * (rates.labor_markup_percentage / 100.0);
    let total_material_cost = subtotal + tax;
    let total_labor_cost = inputs.direct_labor + overhead_markup + labor_markup;
    let total_bid = total_material_cost + total_labor_cost;
    let total_profit = overhead_markup + labor_markup + inputs.material_markup;
    let profit_margin = if total_bid == 0.0 {
        0.0
    } else {
        total_profit / total_bid
    };

    BidRollup {
        subtotal,
        tax,
        overhead_markup,
        labor_markup,
        total_material_cost,
        total_labor_cost,
        total_bid,
        total_profit,
        profit_margin,
    }
}
