use crate::calculations::item_cost::{self, ItemCosts};
use serde::{Deserialize, Serialize};

/// A label attached to a line item. When `quantity` is absent the tag covers
/// the whole base quantity of the item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: None,
        }
    }

    pub fn with_quantity(name: impl Into<String>, quantity: f64) -> Self {
        Self {
            name: name.into(),
            quantity: Some(quantity),
        }
    }

    /// Quantity attributed to this tag on an item whose base quantity is
    /// `item_quantity`.
    pub fn effective_quantity(&self, item_quantity: f64) -> f64 {
        self.quantity.unwrap_or(item_quantity)
    }

    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: i32,
    pub description: String,
    pub quantity: f64,
    /// Fractional overage, `0.1` is ten percent.
    pub wastage: f64,
    pub unit: String,
    pub unit_labor_cost: f64,
    pub unit_material_cost: f64,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub quantity_with_wastage: f64,
    #[serde(default)]
    pub total_labor_cost: f64,
    #[serde(default)]
    pub total_material_cost: f64,
    #[serde(default)]
    pub item_cost: f64,
}

impl LineItem {
    pub fn new(id: i32, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            quantity: 0.0,
            wastage: 0.0,
            unit: "EA".to_string(),
            unit_labor_cost: 0.0,
            unit_material_cost: 0.0,
            tags: Vec::new(),
            quantity_with_wastage: 0.0,
            total_labor_cost: 0.0,
            total_material_cost: 0.0,
            item_cost: 0.0,
        }
    }

    /// Builds a priced item from its raw inputs.
    pub fn priced(
        id: i32,
        description: impl Into<String>,
        quantity: f64,
        wastage: f64,
        unit: impl Into<String>,
        unit_labor_cost: f64,
        unit_material_cost: f64,
    ) -> Self {
        let mut item = Self::new(id, description);
        item.quantity = quantity;
        item.wastage = wastage;
        item.unit = unit.into();
        item.unit_labor_cost = unit_labor_cost;
        item.unit_material_cost = unit_material_cost;
        item.recalculate();
        item
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }

    pub fn costs(&self) -> ItemCosts {
        ItemCosts {
            quantity_with_wastage: self.quantity_with_wastage,
            total_labor_cost: self.total_labor_cost,
            total_material_cost: self.total_material_cost,
            item_cost: self.item_cost,
        }
    }

    /// Re-derives the cached cost fields from the raw inputs.
    pub fn recalculate(&mut self) {
        let costs = item_cost::compute(
            self.quantity,
            self.wastage,
            self.unit_labor_cost,
            self.unit_material_cost,
        );
        self.quantity_with_wastage = costs.quantity_with_wastage;
        self.total_labor_cost = costs.total_labor_cost;
        self.total_material_cost = costs.total_material_cost;
        self.item_cost = costs.item_cost;
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|tag| tag.name == name)
    }
}

/// Raw, user-editable fields of a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemField {
    Description,
    Quantity,
    Wastage,
    Unit,
    UnitLaborCost,
    UnitMaterialCost,
}

impl LineItemField {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineItemField::Description => "description",
            LineItemField::Quantity => "quantity",
            LineItemField::Wastage => "wastage",
            LineItemField::Unit => "unit",
            LineItemField::UnitLaborCost => "unit_labor_cost",
            LineItemField::UnitMaterialCost => "unit_material_cost",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "description" | "desc" => Some(LineItemField::Description),
            "quantity" | "qty" => Some(LineItemField::Quantity),
            "wastage" => Some(LineItemField::Wastage),
            "unit" => Some(LineItemField::Unit),
            "unit_labor_cost" | "labor" => Some(LineItemField::UnitLaborCost),
            "unit_material_cost" | "material" => Some(LineItemField::UnitMaterialCost),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, LineItemField::Description | LineItemField::Unit)
    }
}

/// New value for a [`LineItemField`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Parses user input for `field`. Numeric fields accept plain decimals;
    /// wastage is entered as a whole percent and stored as a fraction.
    pub fn parse(field: LineItemField, input: &str) -> Option<Self> {
        if field.is_numeric() {
            let value = input.trim().parse::<f64>().ok()?;
            Some(FieldValue::Number(match field {
                LineItemField::Wastage => value / 100.0,
                _ => value,
            }))
        } else {
            Some(FieldValue::Text(input.to_string()))
        }
    }
}
