use crate::types::{DisplayRow, GeoRecord};
use rayon::prelude::*;
use tracing::debug;

/// Line-break marker understood by the chart renderer.
pub const LINE_BREAK: &str = "<br>";

pub fn transform_all(records: &[GeoRecord], wrap_width: usize) -> Vec<DisplayRow> {
    debug!("Transforming {} records for display", records.len());

    // Collect keeps record order.
    records.par_iter().map(|record| transform(record, wrap_width)).collect()
}

pub fn transform(record: &GeoRecord, wrap_width: usize) -> DisplayRow {
    DisplayRow {
        id: record.id.clone(),
        underemployment_level: record.underemployment_level.map(|v| round_to(v, 3)),
        education_level: record.education_level.map(|v| round_to(v, 2)),
        required_education_level: record.required_education_level.map(|v| round_to(v, 2)),
        mean_wage: record.mean_wage.map(|v| round_to(v, 0)),
        mean_other_income: record.mean_other_income.map(|v| round_to(v, 0)),
        mean_age: record.mean_age.map(|v| round_to(v, 1)),
        percent_of_workforce: record.percent_of_workforce.map(|v| round_to(v * 100.0, 1)),
        state: record.state.clone(),
        counties: record.counties.clone(),
        wrapped_counties: record
            .counties
            .as_deref()
            .map(|c| wrap_text(c, wrap_width))
            .unwrap_or_default(),
    }
}

/// Rounds half to even on the scaled value.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Greedy word wrap. Words are never split; a word longer than `limit` sits
/// alone on its line.
pub fn wrap_text(text: &str, limit: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current_line = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current_line.is_empty() {
            current_line.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= limit {
            current_line.push(' ');
            current_line.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current_line));
            current_line.push_str(word);
            current_len = word_len;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    lines.join(LINE_BREAK)
}
