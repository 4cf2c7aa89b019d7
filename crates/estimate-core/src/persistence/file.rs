use super::{PersistenceError, PersistenceResult};
use crate::columns::{ColumnConfig, default_columns};
use crate::line_item::{LineItem, Tag};
use crate::metadata::{BidAdjustments, EstimateMetadata, MarkupRates};
use crate::Estimate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct EstimateSnapshot {
    metadata: EstimateMetadata,
    #[serde(default)]
    rates: MarkupRates,
    #[serde(default)]
    adjustments: BidAdjustments,
    #[serde(default = "default_columns")]
    columns: Vec<ColumnConfig>,
    items: Vec<LineItem>,
}

impl EstimateSnapshot {
    fn from_estimate(estimate: &Estimate) -> PersistenceResult<Self> {
        super::validate_line_items(estimate.items())?;
        Ok(Self {
            metadata: estimate.metadata().clone(),
            rates: *estimate.rates(),
            adjustments: *estimate.adjustments(),
            columns: estimate.columns().to_vec(),
            items: estimate.items().to_vec(),
        })
    }

    fn into_estimate(self) -> PersistenceResult<Estimate> {
        super::validate_line_items(&self.items)?;
        let mut estimate = Estimate::new_with_metadata(self.metadata);
        estimate.set_rates(self.rates)?;
        estimate.set_adjustments(self.adjustments);
        estimate.set_columns(self.columns);
        for item in self.items {
            estimate.upsert_item(item)?;
        }
        Ok(estimate)
    }
}

pub fn save_estimate_to_json<P: AsRef<Path>>(estimate: &Estimate, path: P) -> PersistenceResult<()> {
    let snapshot = EstimateSnapshot::from_estimate(estimate)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_estimate_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Estimate> {
    let file = File::open(path)?;
    let snapshot: EstimateSnapshot = serde_json::from_reader(file)?;
    snapshot.into_estimate()
}

pub fn load_rates_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<MarkupRates> {
    let file = File::open(path)?;
    let rates: MarkupRates = serde_json::from_reader(file)?;
    Ok(rates)
}

/// Row layout for bulk upload. Derived costs are not part of the file.
#[derive(Serialize, Deserialize)]
struct LineItemCsvRecord {
    #[serde(default)]
    id: String,
    description: String,
    quantity: String,
    #[serde(default)]
    wastage: String,
    #[serde(default)]
    unit: String,
    unit_labor_cost: String,
    unit_material_cost: String,
    #[serde(default)]
    tags: String,
}

impl From<&LineItem> for LineItemCsvRecord {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.id.to_string(),
            description: item.description.clone(),
            quantity: item.quantity.to_string(),
            wastage: item.wastage.to_string(),
            unit: item.unit.clone(),
            unit_labor_cost: item.unit_labor_cost.to_string(),
            unit_material_cost: item.unit_material_cost.to_string(),
            tags: join_tags(&item.tags),
        }
    }
}

impl LineItemCsvRecord {
    fn into_line_item(self, id: i32) -> PersistenceResult<LineItem> {
        let mut item = LineItem::new(id, self.description.trim());
        item.quantity = parse_required_f64("quantity", &self.quantity)?;
        item.wastage = parse_f64(&self.wastage)?.unwrap_or(0.0);
        if !self.unit.trim().is_empty() {
            item.unit = self.unit.trim().to_string();
        }
        item.unit_labor_cost = parse_required_f64("unit_labor_cost", &self.unit_labor_cost)?;
        item.unit_material_cost =
            parse_required_f64("unit_material_cost", &self.unit_material_cost)?;
        item.tags = split_tags(&self.tags)?;
        item.recalculate();
        Ok(item)
    }
}

/// Parses pasted or uploaded CSV content into priced line items. Rows
/// without an id are numbered from `next_id` upward, skipping ids that other
/// rows in the same content already claim.
pub fn parse_line_items_csv<R: Read>(reader: R, next_id: i32) -> PersistenceResult<Vec<LineItem>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let records = reader
        .deserialize::<LineItemCsvRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    if records.is_empty() {
        return Err(PersistenceError::InvalidData(
            "CSV content contained no line items".into(),
        ));
    }

    let explicit_ids = records
        .iter()
        .filter_map(|record| parse_i32(&record.id).transpose())
        .collect::<PersistenceResult<HashSet<i32>>>()?;
    let exhausted =
        || PersistenceError::InvalidData(format!("no line item id is left after {next_id}"));

    let mut candidate = Some(next_id);
    let mut items = Vec::with_capacity(records.len());
    for record in records {
        let id = match parse_i32(&record.id)? {
            Some(id) => id,
            None => {
                let mut id = candidate.ok_or_else(exhausted)?;
                while explicit_ids.contains(&id) {
                    id = id.checked_add(1).ok_or_else(exhausted)?;
                }
                candidate = id.checked_add(1);
                id
            }
        };
        items.push(record.into_line_item(id)?);
    }

    super::validate_line_items(&items)?;
    tracing::debug!(count = items.len(), "parsed line items from csv");
    Ok(items)
}

pub fn save_estimate_to_csv<P: AsRef<Path>>(estimate: &Estimate, path: P) -> PersistenceResult<()> {
    super::validate_line_items(estimate.items())?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for item in estimate.items() {
        writer.serialize(LineItemCsvRecord::from(item))?;
    }
    writer.flush()?;
    Ok(())
}

/// CSV files carry only line items, so metadata and rates are defaults.
pub fn load_estimate_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Estimate> {
    let file = File::open(path)?;
    let items = parse_line_items_csv(file, 1)?;
    let mut estimate = Estimate::new();
    for item in items {
        estimate.upsert_item(item)?;
    }
    Ok(estimate)
}

/// Tags are `;`-separated and a `:` introduces the tag quantity. A
/// backslash escapes either separator inside a name.
fn join_tags(tags: &[Tag]) -> String {
    tags.iter()
        .map(|tag| {
            let name = escape_tag_name(&tag.name);
            match tag.quantity {
                Some(quantity) => format!("{name}:{quantity}"),
                None => name,
            }
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn escape_tag_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if matches!(ch, '\\' | ':' | ';') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn split_tags(input: &str) -> PersistenceResult<Vec<Tag>> {
    let mut tags = Vec::new();
    let mut name = String::new();
    let mut quantity: Option<String> = None;
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        let ch = match ch {
            '\\' => chars.next().unwrap_or('\\'),
            ':' if quantity.is_none() => {
                quantity = Some(String::new());
                continue;
            }
            ';' => {
                finish_tag(&mut tags, &mut name, &mut quantity)?;
                continue;
            }
            other => other,
        };
        match quantity.as_mut() {
            Some(quantity) => quantity.push(ch),
            None => name.push(ch),
        }
    }
    finish_tag(&mut tags, &mut name, &mut quantity)?;
    Ok(tags)
}

fn finish_tag(
    tags: &mut Vec<Tag>,
    name: &mut String,
    quantity: &mut Option<String>,
) -> PersistenceResult<()> {
    let tag_name = name.trim();
    match quantity.take() {
        Some(quantity) => {
            let quantity = parse_required_f64("tag quantity", &quantity)?;
            tags.push(Tag::with_quantity(tag_name, quantity));
        }
        None if !tag_name.is_empty() => tags.push(Tag::new(tag_name)),
        None => {}
    }
    name.clear();
    Ok(())
}

fn parse_f64(input: &str) -> PersistenceResult<Option<f64>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid float '{input}': {e}")))
}

fn parse_required_f64(field: &str, input: &str) -> PersistenceResult<f64> {
    parse_f64(input)?
        .ok_or_else(|| PersistenceError::InvalidData(format!("missing value for {field}")))
}

fn parse_i32(input: &str) -> PersistenceResult<Option<i32>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<i32>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid integer '{input}': {e}")))
}
