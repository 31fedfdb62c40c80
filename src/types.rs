use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Literal used in place of an industry or nativity code when no filter applies.
pub const ALL: &str = "All";

pub const INDUSTRIES: [&str; 20] = [
    "Accommodation and Food Services",
    "Administrative and Support and Waste Management and Remediation Services",
    "Agriculture, Forestry, Fishing and Hunting",
    "Arts, Entertainment, and Recreation",
    "Construction",
    "Educational Services",
    "Finance and Insurance",
    "Health Care and Social Assistance",
    "Information",
    "Management of Companies and Enterprises",
    "Manufacturing",
    "Mining, Quarrying, and Oil and Gas Extraction",
    "Other Services (except Public Administration)",
    "Professional, Scientific, and Technical Services",
    "Public Administration",
    "Real Estate and Rental Leasing",
    "Retail Trade",
    "Transportation and Warehousing",
    "Utilities",
    "Wholesale Trade",
];

/// Property names as they appear in the dataset files.
pub mod keys {
    pub const ID: &str = "GISMATCH_COMBINED";
    pub const UNDEREMPLOYMENT_LEVEL: &str = "Underemployment Level";
    pub const EDUCATION_LEVEL: &str = "Education Level";
    pub const REQUIRED_EDUCATION_LEVEL: &str = "Required Education Level";
    pub const MEAN_WAGE: &str = "Mean Wage";
    pub const MEAN_OTHER_INCOME: &str = "Mean Other Income";
    pub const MEAN_AGE: &str = "Mean Age";
    pub const PERCENT_OF_WORKFORCE: &str = "Percent of Workforce";
    pub const STATE: &str = "State";
    pub const COUNTIES: &str = "COUNTIES";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Nativity {
    All,
    Domestic,
    ForeignBorn,
}

impl Nativity {
    /// Code used in dataset filenames ("1" domestic, "0" foreign-born).
    pub fn code(&self) -> &'static str {
        match self {
            Nativity::All => ALL,
            Nativity::Domestic => "1",
            Nativity::ForeignBorn => "0",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Nativity::All => "All",
            Nativity::Domestic => "Domestic",
            Nativity::ForeignBorn => "Foreign-Born",
        }
    }
}

impl fmt::Display for Nativity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Nativity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "All" | "all" => Ok(Nativity::All),
            "1" | "Domestic" | "domestic" => Ok(Nativity::Domestic),
            "0" | "Foreign-Born" | "foreign-born" | "ForeignBorn" => Ok(Nativity::ForeignBorn),
            other => Err(format!("Unknown nativity '{}' (expected All, 1 or 0)", other)),
        }
    }
}

impl TryFrom<String> for Nativity {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Nativity> for String {
    fn from(value: Nativity) -> Self {
        value.code().to_string()
    }
}

/// The two dropdown selections. Fully determines which dataset is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub industry: String,
    pub nativity: Nativity,
}

impl FilterSelection {
    pub fn new(industry: impl Into<String>, nativity: Nativity) -> Self {
        Self {
            industry: industry.into(),
            nativity,
        }
    }
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self::new(ALL, Nativity::All)
    }
}

/// One county-group (match unit) as stored in a dataset file.
#[derive(Debug, Clone, Default)]
pub struct GeoRecord {
    pub id: Option<String>,
    pub underemployment_level: Option<f64>,
    pub education_level: Option<f64>,
    pub required_education_level: Option<f64>,
    pub mean_wage: Option<f64>,
    pub mean_other_income: Option<f64>,
    pub mean_age: Option<f64>,
    // Fraction 0-1 as stored; scaled to a percentage for display.
    pub percent_of_workforce: Option<f64>,
    pub state: Option<String>,
    pub counties: Option<String>,
    pub geometry: Option<MultiPolygon<f64>>,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub filename: String,
    /// Union of property names over all features.
    pub fields: BTreeSet<String>,
    pub records: Vec<GeoRecord>,
}

/// Display-ready projection of a `GeoRecord`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayRow {
    pub id: Option<String>,
    pub underemployment_level: Option<f64>,
    pub education_level: Option<f64>,
    pub required_education_level: Option<f64>,
    pub mean_wage: Option<f64>,
    pub mean_other_income: Option<f64>,
    pub mean_age: Option<f64>,
    pub percent_of_workforce: Option<f64>,
    pub state: Option<String>,
    pub counties: Option<String>,
    pub wrapped_counties: String,
}
