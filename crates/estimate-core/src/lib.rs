pub mod calculations;
pub mod columns;
pub mod estimate;
pub mod format;
pub mod frames;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod line_item;
pub(crate) mod line_item_validation;
pub mod metadata;
pub mod persistence;
pub mod warnings;

pub use calculations::bid_rollup::{BidInputs, BidRollup};
pub use calculations::item_cost::ItemCosts;
pub use calculations::tag_breakdown::{
    TagAggregation, TagBidContribution, TagBreakdown, TagBreakdowns, TagContribution,
    aggregate_tags, aggregate_tags_parallel,
};
pub use columns::{ColumnConfig, LineItemColumn, SortDirection};
pub use estimate::{Estimate, EstimateCommand, EstimateError, EstimateSummary, EstimateTotals};
pub use line_item::{FieldValue, LineItem, LineItemField, Tag};
pub use line_item_validation::LineItemValidationError;
pub use metadata::{BidAdjustments, EstimateMetadata, MarkupRates};
pub use persistence::{
    PersistenceError, load_estimate_from_csv, load_estimate_from_json, load_rates_from_json,
    parse_line_items_csv, save_estimate_to_csv, save_estimate_to_json, validate_line_items,
};
pub use warnings::DataQualityWarning;
