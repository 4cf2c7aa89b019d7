pub mod bid_rollup;
pub mod item_cost;
pub mod tag_breakdown;
