use crate::line_item::{LineItem, LineItemField};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemColumn {
    Description,
    Quantity,
    Wastage,
    QuantityWithWastage,
    Unit,
    UnitLaborCost,
    TotalLaborCost,
    UnitMaterialCost,
    TotalMaterialCost,
    ItemCost,
}

/// A cell value pulled out of a line item for display or sorting.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue<'a> {
    Text(&'a str),
    Number(f64),
}

impl ColumnValue<'_> {
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ColumnValue::Text(a), ColumnValue::Text(b)) => a.cmp(b),
            (ColumnValue::Number(a), ColumnValue::Number(b)) => a.total_cmp(b),
            (ColumnValue::Text(_), ColumnValue::Number(_)) => Ordering::Greater,
            (ColumnValue::Number(_), ColumnValue::Text(_)) => Ordering::Less,
        }
    }
}

impl LineItemColumn {
    pub const ALL: [LineItemColumn; 10] = [
        LineItemColumn::Description,
        LineItemColumn::Quantity,
        LineItemColumn::Wastage,
        LineItemColumn::QuantityWithWastage,
        LineItemColumn::Unit,
        LineItemColumn::UnitLaborCost,
        LineItemColumn::TotalLaborCost,
        LineItemColumn::UnitMaterialCost,
        LineItemColumn::TotalMaterialCost,
        LineItemColumn::ItemCost,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            LineItemColumn::Description => "description",
            LineItemColumn::Quantity => "quantity",
            LineItemColumn::Wastage => "wastage",
            LineItemColumn::QuantityWithWastage => "quantity_with_wastage",
            LineItemColumn::Unit => "unit",
            LineItemColumn::UnitLaborCost => "unit_labor_cost",
            LineItemColumn::TotalLaborCost => "total_labor_cost",
            LineItemColumn::UnitMaterialCost => "unit_material_cost",
            LineItemColumn::TotalMaterialCost => "total_material_cost",
            LineItemColumn::ItemCost => "item_cost",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LineItemColumn::Description => "Line Item",
            LineItemColumn::Quantity => "Qty.",
            LineItemColumn::Wastage => "Wastage",
            LineItemColumn::QuantityWithWastage => "Qty w/ Wastage",
            LineItemColumn::Unit => "Unit",
            LineItemColumn::UnitLaborCost => "Unit Labor Cost",
            LineItemColumn::TotalLaborCost => "Total Labor Cost",
            LineItemColumn::UnitMaterialCost => "Unit Material Cost",
            LineItemColumn::TotalMaterialCost => "Total Material Cost",
            LineItemColumn::ItemCost => "Item Cost",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|column| column.key() == key)
    }

    /// The raw field behind an editable column.
    pub fn editable_field(&self) -> Option<LineItemField> {
        match self {
            LineItemColumn::Description => Some(LineItemField::Description),
            LineItemColumn::Quantity => Some(LineItemField::Quantity),
            LineItemColumn::Wastage => Some(LineItemField::Wastage),
            LineItemColumn::Unit => Some(LineItemField::Unit),
            LineItemColumn::UnitLaborCost => Some(LineItemField::UnitLaborCost),
            LineItemColumn::UnitMaterialCost => Some(LineItemField::UnitMaterialCost),
            _ => None,
        }
    }

    pub fn is_editable(&self) -> bool {
        self.editable_field().is_some()
    }

    pub fn is_text(&self) -> bool {
        matches!(self, LineItemColumn::Description | LineItemColumn::Unit)
    }

    pub fn is_currency(&self) -> bool {
        matches!(
            self,
            LineItemColumn::UnitLaborCost
                | LineItemColumn::TotalLaborCost
                | LineItemColumn::UnitMaterialCost
                | LineItemColumn::TotalMaterialCost
                | LineItemColumn::ItemCost
        )
    }

    pub fn value<'a>(&self, item: &'a LineItem) -> ColumnValue<'a> {
        match self {
            LineItemColumn::Description => ColumnValue::Text(&item.description),
            LineItemColumn::Quantity => ColumnValue::Number(item.quantity),
            LineItemColumn::Wastage => ColumnValue::Number(item.wastage),
            LineItemColumn::QuantityWithWastage => ColumnValue::Number(item.quantity_with_wastage),
            LineItemColumn::Unit => ColumnValue::Text(&item.unit),
            LineItemColumn::UnitLaborCost => ColumnValue::Number(item.unit_labor_cost),
            LineItemColumn::TotalLaborCost => ColumnValue::Number(item.total_labor_cost),
            LineItemColumn::UnitMaterialCost => ColumnValue::Number(item.unit_material_cost),
            LineItemColumn::TotalMaterialCost => ColumnValue::Number(item.total_material_cost),
            LineItemColumn::ItemCost => ColumnValue::Number(item.item_cost),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub key: LineItemColumn,
    pub label: String,
    pub visible: bool,
}

impl ColumnConfig {
    pub fn new(key: LineItemColumn) -> Self {
        Self {
            key,
            label: key.label().to_string(),
            visible: true,
        }
    }
}

pub fn default_columns() -> Vec<ColumnConfig> {
    LineItemColumn::ALL.iter().copied().map(ColumnConfig::new).collect()
}

pub fn visible_columns(columns: &[ColumnConfig]) -> Vec<LineItemColumn> {
    columns
        .iter()
        .filter(|column| column.visible)
        .map(|column| column.key)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Stable sort of `items` by the cell value in `column`.
pub fn sort_line_items(items: &mut [&LineItem], column: LineItemColumn, direction: SortDirection) {
    items.sort_by(|a, b| {
        let ordering = column.value(a).compare(&column.value(b));
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip() {
        for column in LineItemColumn::ALL {
            assert_eq!(LineItemColumn::from_key(column.key()), Some(column));
        }
        assert_eq!(LineItemColumn::from_key("tags"), None);
    }

    #[test]
    fn derived_columns_are_read_only() {
        assert!(LineItemColumn::Wastage.is_editable());
        assert!(!LineItemColumn::QuantityWithWastage.is_editable());
        assert!(!LineItemColumn::ItemCost.is_editable());
    }
}
