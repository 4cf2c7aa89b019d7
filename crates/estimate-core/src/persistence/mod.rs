use crate::estimate::EstimateError;
use crate::line_item::LineItem;
use crate::line_item_validation;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<EstimateError> for PersistenceError {
    fn from(value: EstimateError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub fn validate_line_items(items: &[LineItem]) -> PersistenceResult<()> {
    line_item_validation::validate_line_items(items)
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

pub mod file;

pub use file::{
    load_estimate_from_csv, load_estimate_from_json, load_rates_from_json, parse_line_items_csv,
    save_estimate_to_csv, save_estimate_to_json,
};
