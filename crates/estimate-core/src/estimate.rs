use crate::calculations::bid_rollup::{self, BidInputs, BidRollup};
use crate::calculations::tag_breakdown::{
    self, TagAggregation, TagBidContribution, TagBreakdowns,
};
use crate::columns::{ColumnConfig, LineItemColumn, SortDirection, default_columns, sort_line_items};
use crate::format::{format_currency, format_percentage};
use crate::line_item::{FieldValue, LineItem, LineItemField, Tag};
use crate::line_item_validation::{self, LineItemValidationError};
use crate::metadata::{BidAdjustments, EstimateMetadata, MarkupRates};
use crate::warnings::DataQualityWarning;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimateError {
    #[error("line item {0} not found")]
    ItemNotFound(i32),
    #[error("line item {0} already exists")]
    DuplicateItem(i32),
    #[error("line item {item_id} has no tag at index {index}")]
    TagIndexOutOfRange { item_id: i32, index: usize },
    #[error("line item {item_id} has no tag named '{name}'")]
    TagNotFound { item_id: i32, name: String },
    #[error("field {field} expects a {expected} value")]
    FieldType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("no line item id is left after {0}")]
    IdsExhausted(i32),
    #[error("column '{0}' is not configured")]
    ColumnNotConfigured(&'static str),
    #[error("invalid markup rates: {0}")]
    InvalidRates(String),
    #[error(transparent)]
    Validation(#[from] LineItemValidationError),
}

/// Footer totals over every line item.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EstimateTotals {
    pub item_count: usize,
    pub total_labor_cost: f64,
    pub total_material_cost: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateSummary {
    pub totals: EstimateTotals,
    pub breakdowns: TagBreakdowns,
    pub tag_bids: Vec<TagBidContribution>,
    pub rollup: BidRollup,
    pub warnings: Vec<DataQualityWarning>,
}

impl EstimateSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("items={}", self.totals.item_count));
        parts.push(format!("tags={}", self.breakdowns.len()));
        parts.push(format!("cost={}", format_currency(self.totals.total_cost)));
        parts.push(format!("bid={}", format_currency(self.rollup.total_bid)));
        parts.push(format!("margin={}", format_percentage(self.rollup.profit_margin)));
        if !self.warnings.is_empty() {
            parts.push(format!("warnings={}", self.warnings.len()));
        }
        parts.join(", ")
    }
}

/// Single-owner edits to an estimate. Every command is followed by a full
/// re-derivation of the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EstimateCommand {
    AddItem,
    UpsertItem { item: LineItem },
    DeleteItem { id: i32 },
    SetField {
        id: i32,
        field: LineItemField,
        value: FieldValue,
    },
    AddTag { id: i32, tag: Tag },
    UpdateTag { id: i32, index: usize, tag: Tag },
    RenameTag { id: i32, old_name: String, tag: Tag },
    RemoveTag { id: i32, name: String },
    RemoveTagAt { id: i32, index: usize },
    SetRates { rates: MarkupRates },
    SetAdjustments { adjustments: BidAdjustments },
    SetColumnVisibility { column: LineItemColumn, visible: bool },
}

#[derive(Debug, Clone)]
pub struct Estimate {
    metadata: EstimateMetadata,
    items: Vec<LineItem>,
    rates: MarkupRates,
    adjustments: BidAdjustments,
    columns: Vec<ColumnConfig>,
}

impl Default for Estimate {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimate {
    pub fn new() -> Self {
        Self::new_with_metadata(EstimateMetadata::default())
    }

    pub fn new_with_metadata(metadata: EstimateMetadata) -> Self {
        Self {
            metadata,
            items: Vec::new(),
            rates: MarkupRates::default(),
            adjustments: BidAdjustments::default(),
            columns: default_columns(),
        }
    }

    pub fn metadata(&self) -> &EstimateMetadata {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: EstimateMetadata) {
        self.metadata = metadata;
    }

    pub fn set_project_name(&mut self, name: impl Into<String>) {
        self.metadata.project_name = name.into();
    }

    pub fn set_project_description(&mut self, description: impl Into<String>) {
        self.metadata.project_description = description.into();
    }

    pub fn set_estimator_name(&mut self, name: impl Into<String>) {
        self.metadata.estimator_name = name.into();
    }

    pub fn set_plan_date(&mut self, date: NaiveDate) {
        self.metadata.plan_date = date;
    }

    pub fn rates(&self) -> &MarkupRates {
        &self.rates
    }

    pub fn set_rates(&mut self, rates: MarkupRates) -> Result<(), EstimateError> {
        let all = [
            ("overhead_markup_percentage", rates.overhead_markup_percentage),
            ("labor_markup_percentage", rates.labor_markup_percentage),
            ("sales_tax_percentage", rates.sales_tax_percentage),
        ];
        for (name, value) in all {
            if !value.is_finite() {
                return Err(EstimateError::InvalidRates(format!(
                    "{name} must be a finite number (got {value})"
                )));
            }
        }
        self.rates = rates;
        Ok(())
    }

    pub fn adjustments(&self) -> &BidAdjustments {
        &self.adjustments
    }

    pub fn set_adjustments(&mut self, adjustments: BidAdjustments) {
        self.adjustments = adjustments;
    }

    pub fn columns(&self) -> &[ColumnConfig] {
        &self.columns
    }

    pub fn set_columns(&mut self, columns: Vec<ColumnConfig>) {
        self.columns = columns;
    }

    /// Returns false when the column is not part of the configuration.
    pub fn set_column_visibility(&mut self, column: LineItemColumn, visible: bool) -> bool {
        match self.columns.iter_mut().find(|config| config.key == column) {
            Some(config) => {
                config.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn toggle_column(&mut self, column: LineItemColumn) -> Option<bool> {
        let config = self.columns.iter_mut().find(|config| config.key == column)?;
        config.visible = !config.visible;
        Some(config.visible)
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn find_item(&self, id: i32) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// One past the largest id in use.
    pub fn next_id(&self) -> Result<i32, EstimateError> {
        match self.items.iter().map(|item| item.id).max() {
            Some(max) => max.checked_add(1).ok_or(EstimateError::IdsExhausted(max)),
            None => Ok(1),
        }
    }

    /// Appends a blank row and returns its id.
    pub fn add_item(&mut self) -> Result<i32, EstimateError> {
        let id = self.next_id()?;
        self.items.push(LineItem::new(id, "New Line Item"));
        tracing::debug!(item_id = id, "added line item");
        Ok(id)
    }

    /// Inserts a new item; fails if the id is taken.
    pub fn insert_item(&mut self, item: LineItem) -> Result<&LineItem, EstimateError> {
        if self.find_item(item.id).is_some() {
            return Err(EstimateError::DuplicateItem(item.id));
        }
        self.upsert_item(item)
    }

    /// Replaces the item with the same id or appends it. Derived fields in
    /// the input are ignored and recomputed.
    pub fn upsert_item(&mut self, mut item: LineItem) -> Result<&LineItem, EstimateError> {
        line_item_validation::validate_line_item(&item)?;
        item.recalculate();
        let id = item.id;
        let idx = match self.items.iter().position(|existing| existing.id == id) {
            Some(idx) => {
                self.items[idx] = item;
                idx
            }
            None => {
                self.items.push(item);
                self.items.len() - 1
            }
        };
        tracing::debug!(item_id = id, "upserted line item");
        Ok(&self.items[idx])
    }

    pub fn delete_item(&mut self, id: i32) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        let removed = self.items.len() != before;
        if removed {
            tracing::debug!(item_id = id, "deleted line item");
        }
        removed
    }

    /// Applies `edit` to a copy of the item, validates and reprices it, and
    /// only then stores it.
    fn edit_item<F>(&mut self, id: i32, edit: F) -> Result<&LineItem, EstimateError>
    where
        F: FnOnce(&mut LineItem) -> Result<(), EstimateError>,
    {
        let idx = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(EstimateError::ItemNotFound(id))?;
        let mut draft = self.items[idx].clone();
        edit(&mut draft)?;
        line_item_validation::validate_line_item(&draft)?;
        draft.recalculate();
        self.items[idx] = draft;
        Ok(&self.items[idx])
    }

    pub fn set_field(
        &mut self,
        id: i32,
        field: LineItemField,
        value: FieldValue,
    ) -> Result<&LineItem, EstimateError> {
        self.edit_item(id, |item| {
            match (field, value) {
                (LineItemField::Description, FieldValue::Text(text)) => item.description = text,
                (LineItemField::Unit, FieldValue::Text(text)) => item.unit = text,
                (LineItemField::Quantity, FieldValue::Number(n)) => item.quantity = n,
                (LineItemField::Wastage, FieldValue::Number(n)) => item.wastage = n,
                (LineItemField::UnitLaborCost, FieldValue::Number(n)) => item.unit_labor_cost = n,
                (LineItemField::UnitMaterialCost, FieldValue::Number(n)) => {
                    item.unit_material_cost = n
                }
                (field, _) => {
                    return Err(EstimateError::FieldType {
                        field: field.as_str(),
                        expected: if field.is_numeric() { "numeric" } else { "text" },
                    });
                }
            }
            Ok(())
        })
    }

    pub fn add_tag(&mut self, id: i32, tag: Tag) -> Result<&LineItem, EstimateError> {
        self.edit_item(id, |item| {
            item.tags.push(tag);
            Ok(())
        })
    }

    pub fn update_tag(&mut self, id: i32, index: usize, tag: Tag) -> Result<&LineItem, EstimateError> {
        self.edit_item(id, |item| {
            let slot = item
                .tags
                .get_mut(index)
                .ok_or(EstimateError::TagIndexOutOfRange { item_id: id, index })?;
            *slot = tag;
            Ok(())
        })
    }

    /// Replaces every tag named `old_name` on the item.
    pub fn rename_tag(&mut self, id: i32, old_name: &str, tag: Tag) -> Result<&LineItem, EstimateError> {
        self.edit_item(id, |item| {
            let mut found = false;
            for slot in item.tags.iter_mut().filter(|t| t.name == old_name) {
                *slot = tag.clone();
                found = true;
            }
            if !found {
                return Err(EstimateError::TagNotFound {
                    item_id: id,
                    name: old_name.to_string(),
                });
            }
            Ok(())
        })
    }

    /// Removes every tag named `name` from the item.
    pub fn remove_tag(&mut self, id: i32, name: &str) -> Result<&LineItem, EstimateError> {
        self.edit_item(id, |item| {
            let before = item.tags.len();
            item.tags.retain(|tag| tag.name != name);
            if item.tags.len() == before {
                return Err(EstimateError::TagNotFound {
                    item_id: id,
                    name: name.to_string(),
                });
            }
            Ok(())
        })
    }

    pub fn remove_tag_at(&mut self, id: i32, index: usize) -> Result<&LineItem, EstimateError> {
        self.edit_item(id, |item| {
            if index >= item.tags.len() {
                return Err(EstimateError::TagIndexOutOfRange { item_id: id, index });
            }
            item.tags.remove(index);
            Ok(())
        })
    }

    /// Distinct tag names in first-seen order.
    pub fn tag_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for tag in self.items.iter().flat_map(|item| item.tags.iter()) {
            if tag.has_name() && !names.contains(&tag.name) {
                names.push(tag.name.clone());
            }
        }
        names
    }

    pub fn search_tags(&self, term: &str) -> Vec<String> {
        let needle = term.to_lowercase();
        self.tag_names()
            .into_iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Items whose description contains `search` (case-insensitive) and that
    /// carry every tag in `selected_tags`.
    pub fn filter_items(&self, search: &str, selected_tags: &[String]) -> Vec<&LineItem> {
        let needle = search.to_lowercase();
        self.items
            .iter()
            .filter(|item| item.description.to_lowercase().contains(&needle))
            .filter(|item| selected_tags.iter().all(|tag| item.has_tag(tag)))
            .collect()
    }

    pub fn sorted_items(&self, column: LineItemColumn, direction: SortDirection) -> Vec<&LineItem> {
        let mut items: Vec<&LineItem> = self.items.iter().collect();
        sort_line_items(&mut items, column, direction);
        items
    }

    pub fn totals(&self) -> EstimateTotals {
        let total_labor_cost: f64 = self.items.iter().map(|item| item.total_labor_cost).sum();
        let total_material_cost: f64 = self.items.iter().map(|item| item.total_material_cost).sum();
        EstimateTotals {
            item_count: self.items.len(),
            total_labor_cost,
            total_material_cost,
            total_cost: total_labor_cost + total_material_cost,
        }
    }

    pub fn tag_aggregation(&self) -> TagAggregation {
        tag_breakdown::aggregate_tags(&self.items)
    }

    pub fn tag_breakdowns(&self) -> TagBreakdowns {
        self.tag_aggregation().breakdowns
    }

    /// Whole-project bid base: item totals plus the entered add-ons.
    pub fn bid_inputs(&self) -> BidInputs {
        let totals = self.totals();
        BidInputs::new(
            totals.total_labor_cost,
            totals.total_material_cost,
            &self.adjustments,
        )
    }

    pub fn bid_rollup(&self) -> BidRollup {
        bid_rollup::compute(&self.bid_inputs(), &self.rates)
    }

    /// Full re-derivation of every downstream figure.
    pub fn summary(&self) -> EstimateSummary {
        let aggregation = self.tag_aggregation();
        let mut warnings = line_item_validation::advisories(&self.items);
        warnings.extend(aggregation.warnings);
        EstimateSummary {
            totals: self.totals(),
            tag_bids: aggregation.breakdowns.with_markup(&self.rates),
            breakdowns: aggregation.breakdowns,
            rollup: self.bid_rollup(),
            warnings,
        }
    }

    pub fn apply(&mut self, command: EstimateCommand) -> Result<EstimateSummary, EstimateError> {
        match command {
            EstimateCommand::AddItem => {
                self.add_item()?;
            }
            EstimateCommand::UpsertItem { item } => {
                self.upsert_item(item)?;
            }
            EstimateCommand::DeleteItem { id } => {
                if !self.delete_item(id) {
                    return Err(EstimateError::ItemNotFound(id));
                }
            }
            EstimateCommand::SetField { id, field, value } => {
                self.set_field(id, field, value)?;
            }
            EstimateCommand::AddTag { id, tag } => {
                self.add_tag(id, tag)?;
            }
            EstimateCommand::UpdateTag { id, index, tag } => {
                self.update_tag(id, index, tag)?;
            }
            EstimateCommand::RenameTag { id, old_name, tag } => {
                self.rename_tag(id, &old_name, tag)?;
            }
            EstimateCommand::RemoveTag { id, name } => {
                self.remove_tag(id, &name)?;
            }
            EstimateCommand::RemoveTagAt { id, index } => {
                self.remove_tag_at(id, index)?;
            }
            EstimateCommand::SetRates { rates } => self.set_rates(rates)?,
            EstimateCommand::SetAdjustments { adjustments } => self.set_adjustments(adjustments),
            EstimateCommand::SetColumnVisibility { column, visible } => {
                if !self.set_column_visibility(column, visible) {
                    return Err(EstimateError::ColumnNotConfigured(column.key()));
                }
            }
        }
        Ok(self.summary())
    }
}
