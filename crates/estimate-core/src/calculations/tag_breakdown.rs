use crate::calculations::bid_rollup::{self, BidInputs};
use crate::line_item::LineItem;
use crate::metadata::MarkupRates;
use crate::warnings::DataQualityWarning;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One item's prorated share of a tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagContribution {
    pub item_id: i32,
    pub description: String,
    pub quantity: f64,
    pub labor_cost: f64,
    pub material_cost: f64,
    pub item_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagBreakdown {
    pub name: String,
    pub total_quantity: f64,
    pub total_labor_cost: f64,
    pub total_material_cost: f64,
    pub total_item_cost: f64,
    pub items: Vec<TagContribution>,
}

impl TagBreakdown {
    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            total_quantity: 0.0,
            total_labor_cost: 0.0,
            total_material_cost: 0.0,
            total_item_cost: 0.0,
            items: Vec::new(),
        }
    }

    fn accrue(&mut self, contribution: TagContribution) {
        self.total_quantity += contribution.quantity;
        self.total_labor_cost += contribution.labor_cost;
        self.total_material_cost += contribution.material_cost;
        self.total_item_cost += contribution.item_cost;
        self.items.push(contribution);
    }

    /// This tag's share of the bid, using the project's markup and tax rates
    /// with no fixed add-ons.
    pub fn with_markup(&self, rates: &MarkupRates) -> TagBidContribution {
        let rollup = bid_rollup::compute(&BidInputs::for_tag(self), rates);
        TagBidContribution {
            name: self.name.clone(),
            overhead: rollup.overhead_markup,
            labor_markup: rollup.labor_markup,
            sales_tax: rollup.tax,
            total_with_overhead_and_tax: rollup.total_bid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagBidContribution {
    pub name: String,
    pub overhead: f64,
    pub labor_markup: f64,
    pub sales_tax: f64,
    pub total_with_overhead_and_tax: f64,
}

/// Breakdowns keyed by tag name, iterated in the order each name was first
/// seen while walking the items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagBreakdowns {
    entries: Vec<TagBreakdown>,
}

impl TagBreakdowns {
    pub fn get(&self, name: &str) -> Option<&TagBreakdown> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagBreakdown> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn with_markup(&self, rates: &MarkupRates) -> Vec<TagBidContribution> {
        self.entries
            .iter()
            .map(|entry| entry.with_markup(rates))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagAggregation {
    pub breakdowns: TagBreakdowns,
    pub warnings: Vec<DataQualityWarning>,
}

#[derive(Default)]
struct Accumulator {
    entries: Vec<TagBreakdown>,
    index: HashMap<String, usize>,
    warnings: Vec<DataQualityWarning>,
}

impl Accumulator {
    fn absorb(&mut self, partial: ItemPartial) {
        for (name, contribution) in partial.contributions {
            let idx = match self.index.get(&name) {
                Some(idx) => *idx,
                None => {
                    self.entries.push(TagBreakdown::empty(&name));
                    let idx = self.entries.len() - 1;
                    self.index.insert(name, idx);
                    idx
                }
            };
            self.entries[idx].accrue(contribution);
        }
        self.warnings.extend(partial.warnings);
    }

    fn finish(self) -> TagAggregation {
        for warning in &self.warnings {
            tracing::warn!("{warning}");
        }
        TagAggregation {
            breakdowns: TagBreakdowns {
                entries: self.entries,
            },
            warnings: self.warnings,
        }
    }
}

struct ItemPartial {
    contributions: Vec<(String, TagContribution)>,
    warnings: Vec<DataQualityWarning>,
}

fn proration_ratio(tag_quantity: f64, item_quantity: f64) -> f64 {
    if item_quantity == 0.0 {
        0.0
    } else {
        tag_quantity / item_quantity
    }
}

fn item_partial(item: &LineItem) -> ItemPartial {
    let mut contributions = Vec::with_capacity(item.tags.len());
    let mut warnings = Vec::new();

    for (tag_index, tag) in item.tags.iter().enumerate() {
        if !tag.has_name() {
            warnings.push(DataQualityWarning::MissingTagName {
                item_id: item.id,
                tag_index,
            });
            continue;
        }

        let tag_quantity = tag.effective_quantity(item.quantity);
        if let Some(explicit) = tag.quantity {
            if explicit > item.quantity {
                warnings.push(DataQualityWarning::TagQuantityExceedsItem {
                    item_id: item.id,
                    tag_name: tag.name.clone(),
                    tag_quantity: explicit,
                    item_quantity: item.quantity,
                });
            }
        }
        if item.quantity == 0.0 {
            warnings.push(DataQualityWarning::ZeroQuantityItem {
                item_id: item.id,
                tag_name: tag.name.clone(),
            });
        }

        let ratio = proration_ratio(tag_quantity, item.quantity);
        let labor_cost = ratio * item.total_labor_cost;
        let material_cost = ratio * item.total_material_cost;
        contributions.push((
            tag.name.clone(),
            TagContribution {
                item_id: item.id,
                description: item.description.clone(),
                quantity: tag_quantity,
                labor_cost,
                material_cost,
                item_cost: labor_cost + material_cost,
            },
        ));
    }

    ItemPartial {
        contributions,
        warnings,
    }
}

/// Aggregates prorated tag totals over already priced items.
pub fn aggregate_tags(items: &[LineItem]) -> TagAggregation {
    let mut acc = Accumulator::default();
    for item in items {
        acc.absorb(item_partial(item));
    }
    acc.finish()
}

/// Same result as [`aggregate_tags`]; per-item proration runs on the rayon
/// pool and partials are folded in item order.
pub fn aggregate_tags_parallel(items: &[LineItem]) -> TagAggregation {
    let partials: Vec<ItemPartial> = items.par_iter().map(item_partial).collect();
    let mut acc = Accumulator::default();
    for partial in partials {
        acc.absorb(partial);
    }
    acc.finish()
}
