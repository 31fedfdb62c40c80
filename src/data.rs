use crate::error::DashboardError;
use crate::types::{keys, Dataset, FilterSelection, GeoRecord, ALL};
use anyhow::{Context, Result, anyhow};
use geo::MultiPolygon;
use geojson::{Feature, GeoJson, JsonObject};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A dataset file known to exist in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetHandle {
    pub filename: String,
    pub path: PathBuf,
}

/// `"<industry|All> <nativityCode|All>.<ext>"`
pub fn dataset_filename(selection: &FilterSelection, extension: &str) -> String {
    let industry_file = if selection.industry == ALL {
        ALL
    } else {
        selection.industry.as_str()
    };
    format!("{} {}.{}", industry_file, selection.nativity.code(), extension)
}

/// Maps a selection to a file in `dataset_dir`. Re-checks the store on every call.
pub fn resolve(
    dataset_dir: &Path,
    extension: &str,
    selection: &FilterSelection,
) -> std::result::Result<DatasetHandle, DashboardError> {
    let filename = dataset_filename(selection, extension);

    // Names that could step outside the store never match a dataset.
    let escapes_store = selection.industry.contains(['/', '\\'])
        || selection.industry.contains("..");
    let path = dataset_dir.join(&filename);

    if escapes_store || !path.is_file() {
        return Err(DashboardError::DatasetNotFound { filename });
    }

    Ok(DatasetHandle { filename, path })
}

pub fn load_dataset(handle: &DatasetHandle) -> Result<Dataset> {
    info!(file = %handle.filename, "Loading dataset");
    let file = File::open(&handle.path)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", handle.path))?;
    let reader = BufReader::new(file);

    // Loads the whole file into memory.
    let geojson = GeoJson::from_reader(reader)
        .with_context(|| format!("Failed to parse GeoJSON: {}", handle.filename))?;

    let dataset = parse_dataset(&handle.filename, geojson)?;
    info!(file = %handle.filename, records = dataset.records.len(), "Loaded dataset");
    Ok(dataset)
}

pub fn parse_dataset(filename: &str, geojson: GeoJson) -> Result<Dataset> {
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("Dataset '{}' must be a FeatureCollection", filename)),
    };

    let mut fields = BTreeSet::new();
    let mut records = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.into_iter().enumerate() {
        if let Some(props) = feature.properties.as_ref() {
            fields.extend(props.keys().cloned());
        }
        records.push(record_from_feature(filename, index, feature)?);
    }

    Ok(Dataset {
        filename: filename.to_string(),
        fields,
        records,
    })
}

fn record_from_feature(filename: &str, index: usize, feature: Feature) -> Result<GeoRecord> {
    let geometry = polygon_geometry(filename, index, &feature)?;
    let props = feature.properties.unwrap_or_default();

    Ok(GeoRecord {
        id: text_property(&props, keys::ID),
        underemployment_level: number_property(&props, keys::UNDEREMPLOYMENT_LEVEL),
        education_level: number_property(&props, keys::EDUCATION_LEVEL),
        required_education_level: number_property(&props, keys::REQUIRED_EDUCATION_LEVEL),
        mean_wage: number_property(&props, keys::MEAN_WAGE),
        mean_other_income: number_property(&props, keys::MEAN_OTHER_INCOME),
        mean_age: number_property(&props, keys::MEAN_AGE),
        percent_of_workforce: number_property(&props, keys::PERCENT_OF_WORKFORCE),
        state: text_property(&props, keys::STATE),
        counties: text_property(&props, keys::COUNTIES),
        geometry,
    })
}

// Rows without polygon geometry are kept so table rows and map features stay aligned.
fn polygon_geometry(
    filename: &str,
    index: usize,
    feature: &Feature,
) -> Result<Option<MultiPolygon<f64>>> {
    let Some(geom) = feature.geometry.as_ref() else {
        warn!(file = filename, index, "Feature has no geometry");
        return Ok(None);
    };

    let valid_geo: geo::Geometry<f64> = geom.value.clone().try_into()
        .map_err(|e| anyhow!("Failed to convert geojson geometry in {} (feature {}): {:?}", filename, index, e))?;

    match valid_geo {
        geo::Geometry::MultiPolygon(mp) => Ok(Some(mp)),
        geo::Geometry::Polygon(p) => Ok(Some(MultiPolygon::new(vec![p]))),
        _ => {
            warn!(file = filename, index, "Skipping non-polygon geometry");
            Ok(None)
        }
    }
}

fn number_property(props: &JsonObject, key: &str) -> Option<f64> {
    let value: Option<f64> = match props.get(key)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    // "NaN" and "inf" parse as floats but are not data.
    value.filter(|v| v.is_finite())
}

fn text_property(props: &JsonObject, key: &str) -> Option<String> {
    match props.get(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
