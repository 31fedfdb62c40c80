use crate::error::DashboardError;
use crate::types::{keys, Dataset};

pub const REQUIRED_FIELDS: [&str; 4] = [
    keys::UNDEREMPLOYMENT_LEVEL,
    keys::MEAN_WAGE,
    keys::MEAN_AGE,
    keys::PERCENT_OF_WORKFORCE,
];

/// All-or-nothing: one absent required field rejects the whole dataset.
pub fn validate(dataset: &Dataset) -> Result<(), DashboardError> {
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !dataset.fields.contains(**field))
        .map(|field| field.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DashboardError::SchemaInvalid { missing })
    }
}
