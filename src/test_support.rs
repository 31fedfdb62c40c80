//! Dataset fixtures shared by the module tests.

use serde_json::{json, Value};
use std::path::Path;

/// Unit square at `(i, 0)` carrying every known property.
pub fn feature(i: usize, level: f64) -> Value {
    let x = i as f64;
    json!({
        "type": "Feature",
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 1.0], [x, 0.0]]]
        },
        "properties": {
            "GISMATCH_COMBINED": format!("G{}", i),
            "Underemployment Level": level,
            "Education Level": 13.456,
            "Required Education Level": 12.004,
            "Mean Wage": 41234.6,
            "Mean Other Income": 1999.4,
            "Mean Age": 38.26,
            "Percent of Workforce": 0.8234,
            "State": "Ohio",
            "COUNTIES": "Franklin County, Delaware County, Licking County"
        }
    })
}

pub fn write_dataset(dir: &Path, filename: &str, features: Vec<Value>) {
    let collection = json!({ "type": "FeatureCollection", "features": features });
    std::fs::write(dir.join(filename), collection.to_string()).expect("write dataset fixture");
}
