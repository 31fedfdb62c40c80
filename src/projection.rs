use crate::processing::LINE_BREAK;
use crate::types::{keys, DisplayRow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Optional hover lines the user can toggle, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HoverField {
    #[serde(rename = "GISMATCH_COMBINED", alias = "ID")]
    Id,
    #[serde(rename = "Education Level")]
    EducationLevel,
    #[serde(rename = "Required Education Level")]
    RequiredEducationLevel,
    #[serde(rename = "Mean Wage")]
    MeanWage,
    #[serde(rename = "Mean Other Income")]
    MeanOtherIncome,
    #[serde(rename = "Mean Age")]
    MeanAge,
    #[serde(rename = "Percent of Workforce")]
    PercentOfWorkforce,
    #[serde(rename = "State")]
    State,
    #[serde(rename = "Counties")]
    Counties,
}

impl HoverField {
    pub const ALL: [HoverField; 9] = [
        HoverField::Id,
        HoverField::EducationLevel,
        HoverField::RequiredEducationLevel,
        HoverField::MeanWage,
        HoverField::MeanOtherIncome,
        HoverField::MeanAge,
        HoverField::PercentOfWorkforce,
        HoverField::State,
        HoverField::Counties,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            HoverField::Id => keys::ID,
            HoverField::EducationLevel => keys::EDUCATION_LEVEL,
            HoverField::RequiredEducationLevel => keys::REQUIRED_EDUCATION_LEVEL,
            HoverField::MeanWage => keys::MEAN_WAGE,
            HoverField::MeanOtherIncome => keys::MEAN_OTHER_INCOME,
            HoverField::MeanAge => keys::MEAN_AGE,
            HoverField::PercentOfWorkforce => keys::PERCENT_OF_WORKFORCE,
            HoverField::State => keys::STATE,
            HoverField::Counties => "Counties",
        }
    }

    /// Label on the hover-field checklist.
    pub fn checklist_label(&self) -> &'static str {
        match self {
            HoverField::Id => "ID",
            HoverField::EducationLevel => "Ed Attained",
            HoverField::RequiredEducationLevel => "Ed Required",
            HoverField::MeanWage => "Mean Wage",
            HoverField::MeanOtherIncome => "Mean Other Income",
            HoverField::MeanAge => "Mean Age",
            HoverField::PercentOfWorkforce => "Nativity %",
            HoverField::State => "State",
            HoverField::Counties => "Counties",
        }
    }

    fn line(&self) -> HoverLine {
        let key = self.key();
        match self {
            HoverField::Id => HoverLine::new(key, "ID", FormatRule::Plain, |r| Cell::Text(r.id.as_deref())),
            HoverField::EducationLevel => HoverLine::new(
                key,
                "Education Level",
                FormatRule::Plain,
                |r| Cell::Number(r.education_level),
            ),
            HoverField::RequiredEducationLevel => HoverLine::new(
                key,
                "Required Education Level",
                FormatRule::Plain,
                |r| Cell::Number(r.required_education_level),
            ),
            HoverField::MeanWage => HoverLine::new(
                key,
                "Mean Wage",
                FormatRule::Currency,
                |r| Cell::Number(r.mean_wage),
            ),
            HoverField::MeanOtherIncome => HoverLine::new(
                key,
                "Mean Other Income",
                FormatRule::Currency,
                |r| Cell::Number(r.mean_other_income),
            ),
            HoverField::MeanAge => HoverLine::new(
                key,
                "Mean Age",
                FormatRule::Decimal { places: 1 },
                |r| Cell::Number(r.mean_age),
            ),
            HoverField::PercentOfWorkforce => HoverLine::new(
                key,
                "Nativity",
                FormatRule::Percent { places: 1 },
                |r| Cell::Number(r.percent_of_workforce),
            ),
            HoverField::State => HoverLine::new(key, "State", FormatRule::Plain, |r| Cell::Text(r.state.as_deref())),
            HoverField::Counties => HoverLine::new(
                key,
                "Counties",
                FormatRule::Plain,
                |r| Cell::Text(Some(r.wrapped_counties.as_str())),
            ),
        }
    }
}

impl fmt::Display for HoverField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for HoverField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "ID" {
            return Ok(HoverField::Id);
        }
        HoverField::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or_else(|| format!("Unknown hover field '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormatRule {
    Plain,
    /// Thousands separators, fixed decimals.
    Decimal { places: usize },
    /// Dollars, thousands separators, no decimals.
    Currency,
    Percent { places: usize },
}

impl FormatRule {
    fn apply(&self, cell: Cell<'_>) -> String {
        match cell {
            Cell::Text(text) => text.unwrap_or_default().to_string(),
            Cell::Number(None) => String::new(),
            Cell::Number(Some(v)) => match self {
                FormatRule::Plain => v.to_string(),
                FormatRule::Decimal { places } => format_thousands(v, *places),
                FormatRule::Currency => format!("${}", format_thousands(v, 0)),
                FormatRule::Percent { places } => format!("{:.*}%", *places, v),
            },
        }
    }
}

enum Cell<'a> {
    Number(Option<f64>),
    Text(Option<&'a str>),
}

type CellFn = fn(&DisplayRow) -> Cell<'_>;

#[derive(Clone, Copy, Serialize)]
pub struct HoverLine {
    pub key: &'static str,
    pub label: &'static str,
    pub format: FormatRule,
    pub emphasized: bool,
    #[serde(skip)]
    value: CellFn,
}

impl fmt::Debug for HoverLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HoverLine")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("format", &self.format)
            .field("emphasized", &self.emphasized)
            .finish()
    }
}

impl HoverLine {
    fn new(key: &'static str, label: &'static str, format: FormatRule, value: CellFn) -> Self {
        HoverLine {
            key,
            label,
            format,
            emphasized: false,
            value,
        }
    }

    fn underemployment() -> Self {
        HoverLine {
            emphasized: true,
            ..HoverLine::new(
                keys::UNDEREMPLOYMENT_LEVEL,
                "Underemployment Level",
                FormatRule::Decimal { places: 2 },
                |r| Cell::Number(r.underemployment_level),
            )
        }
    }

    pub fn render(&self, row: &DisplayRow) -> String {
        let line = format!("{}: {}", self.label, self.format.apply((self.value)(row)));
        if self.emphasized {
            format!("<b>{}</b>", line)
        } else {
            line
        }
    }
}

/// Ordered hover lines; the underemployment level always comes first.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct HoverSpec {
    pub lines: Vec<HoverLine>,
}

impl HoverSpec {
    /// Order follows `HoverField::ALL`, whatever order `selected` is in.
    pub fn build(selected: &[HoverField]) -> Self {
        let mut lines = vec![HoverLine::underemployment()];
        lines.extend(
            HoverField::ALL
                .iter()
                .filter(|field| selected.contains(*field))
                .map(HoverField::line),
        );
        HoverSpec { lines }
    }

    #[cfg(test)]
    fn keys(&self) -> Vec<&'static str> {
        self.lines.iter().map(|line| line.key).collect()
    }

    pub fn render(&self, row: &DisplayRow) -> String {
        self.lines
            .iter()
            .map(|line| line.render(row))
            .collect::<Vec<_>>()
            .join(LINE_BREAK)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableColumn {
    pub name: &'static str,
    pub id: &'static str,
    pub hideable: bool,
}

const fn column(name: &'static str, id: &'static str) -> TableColumn {
    TableColumn { name, id, hideable: true }
}

pub const TABLE_COLUMNS: [TableColumn; 10] = [
    column("ID", keys::ID),
    column("Underemployment Level", keys::UNDEREMPLOYMENT_LEVEL),
    column("Education Level", keys::EDUCATION_LEVEL),
    column("Required Education Level", keys::REQUIRED_EDUCATION_LEVEL),
    column("Mean Wage", keys::MEAN_WAGE),
    column("Mean Other Income", keys::MEAN_OTHER_INCOME),
    column("Mean Age", keys::MEAN_AGE),
    column("Nativity %", keys::PERCENT_OF_WORKFORCE),
    column("State", keys::STATE),
    column("Counties", keys::COUNTIES),
];

/// One table row. Field order and names match `TABLE_COLUMNS`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    #[serde(rename = "GISMATCH_COMBINED")]
    pub id: Option<String>,
    #[serde(rename = "Underemployment Level")]
    pub underemployment_level: Option<f64>,
    #[serde(rename = "Education Level")]
    pub education_level: Option<f64>,
    #[serde(rename = "Required Education Level")]
    pub required_education_level: Option<f64>,
    #[serde(rename = "Mean Wage")]
    pub mean_wage: Option<f64>,
    #[serde(rename = "Mean Other Income")]
    pub mean_other_income: Option<f64>,
    #[serde(rename = "Mean Age")]
    pub mean_age: Option<f64>,
    #[serde(rename = "Percent of Workforce")]
    pub percent_of_workforce: Option<f64>,
    #[serde(rename = "State")]
    pub state: Option<String>,
    #[serde(rename = "COUNTIES")]
    pub counties: Option<String>,
}

impl From<&DisplayRow> for TableRow {
    fn from(row: &DisplayRow) -> Self {
        TableRow {
            id: row.id.clone(),
            underemployment_level: row.underemployment_level,
            education_level: row.education_level,
            required_education_level: row.required_education_level,
            mean_wage: row.mean_wage,
            mean_other_income: row.mean_other_income,
            mean_age: row.mean_age,
            percent_of_workforce: row.percent_of_workforce,
            state: row.state.clone(),
            counties: row.counties.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Projection {
    pub hover: HoverSpec,
    /// Rendered hover text, one entry per row.
    pub hover_text: Vec<String>,
    pub table: Vec<TableRow>,
}

/// Table rows ignore `hover_fields`; both outputs keep record order.
pub fn project(rows: &[DisplayRow], hover_fields: &[HoverField]) -> Projection {
    let hover = HoverSpec::build(hover_fields);
    let hover_text = rows.iter().map(|row| hover.render(row)).collect();
    let table = rows.iter().map(TableRow::from).collect();

    Projection {
        hover,
        hover_text,
        table,
    }
}

pub fn format_thousands(value: f64, places: usize) -> String {
    let formatted = format!("{:.*}", places, value);
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> DisplayRow {
        DisplayRow {
            id: Some("G1".to_string()),
            underemployment_level: Some(1.236),
            education_level: Some(13.46),
            required_education_level: Some(12.5),
            mean_wage: Some(41235.0),
            mean_other_income: Some(1999.0),
            mean_age: Some(38.3),
            percent_of_workforce: Some(82.3),
            state: Some("Ohio".to_string()),
            counties: Some("Franklin County, Delaware County".to_string()),
            wrapped_counties: "Franklin County, Delaware<br>County".to_string(),
        }
    }

    #[test]
    fn underemployment_always_first() {
        let spec = HoverSpec::build(&[]);
        assert_eq!(spec.keys(), vec![keys::UNDEREMPLOYMENT_LEVEL]);
        assert_eq!(spec.render(&row()), "<b>Underemployment Level: 1.24</b>");
    }

    #[test]
    fn order_is_canonical_regardless_of_input_order() {
        let forward = HoverSpec::build(&[HoverField::Id, HoverField::MeanWage, HoverField::Counties]);
        let backward = HoverSpec::build(&[HoverField::Counties, HoverField::MeanWage, HoverField::Id]);
        assert_eq!(forward.keys(), backward.keys());
        assert_eq!(
            forward.keys(),
            vec![keys::UNDEREMPLOYMENT_LEVEL, keys::ID, keys::MEAN_WAGE, "Counties"]
        );
    }

    #[test]
    fn renders_every_field() {
        let spec = HoverSpec::build(&HoverField::ALL);
        assert_eq!(spec.lines.len(), 10);
        assert_eq!(
            spec.render(&row()),
            [
                "<b>Underemployment Level: 1.24</b>",
                "ID: G1",
                "Education Level: 13.46",
                "Required Education Level: 12.5",
                "Mean Wage: $41,235",
                "Mean Other Income: $1,999",
                "Mean Age: 38.3",
                "Nativity: 82.3%",
                "State: Ohio",
                "Counties: Franklin County, Delaware<br>County",
            ]
            .join("<br>")
        );
    }

    #[test]
    fn absent_values_render_empty() {
        let spec = HoverSpec::build(&[HoverField::MeanWage, HoverField::State]);
        let rendered = spec.render(&DisplayRow::default());
        assert_eq!(
            rendered,
            "<b>Underemployment Level: </b><br>Mean Wage: <br>State: "
        );
    }

    #[test]
    fn table_ignores_hover_selection() {
        let rows = vec![row(), DisplayRow::default()];
        let none = project(&rows, &[]);
        let all = project(&rows, &HoverField::ALL);
        assert_eq!(none.table, all.table);
        assert_eq!(none.table.len(), 2);
        assert_eq!(none.hover_text.len(), 2);
        assert_eq!(none.table[0].counties.as_deref(), Some("Franklin County, Delaware County"));
    }

    #[test]
    fn table_row_serializes_all_columns() {
        let value = serde_json::to_value(TableRow::from(&row())).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), TABLE_COLUMNS.len());
        for column in TABLE_COLUMNS {
            assert!(object.contains_key(column.id), "missing {}", column.id);
        }
        assert_eq!(object["Mean Wage"], serde_json::json!(41235.0));
    }

    #[test]
    fn hover_field_parsing() {
        assert_eq!("ID".parse::<HoverField>().unwrap(), HoverField::Id);
        assert_eq!("GISMATCH_COMBINED".parse::<HoverField>().unwrap(), HoverField::Id);
        assert_eq!("Counties".parse::<HoverField>().unwrap(), HoverField::Counties);
        assert!("COUNTIES".parse::<HoverField>().is_err());
        let parsed: Vec<HoverField> = serde_json::from_str(r#"["ID", "Mean Age"]"#).unwrap();
        assert_eq!(parsed, vec![HoverField::Id, HoverField::MeanAge]);
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(format_thousands(0.0, 0), "0");
        assert_eq!(format_thousands(999.0, 0), "999");
        assert_eq!(format_thousands(1000.0, 0), "1,000");
        assert_eq!(format_thousands(1234567.891, 1), "1,234,567.9");
        assert_eq!(format_thousands(-98765.4, 0), "-98,765");
    }
}
